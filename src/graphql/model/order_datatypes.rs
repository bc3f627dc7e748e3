use async_graphql::{Enum, InputObject};
use serde::{Deserialize, Serialize};

/// GraphQL order direction.
#[derive(Enum, Copy, Clone, Eq, PartialEq)]
pub enum OrderDirection {
    /// Ascending order direction.
    Asc,
    /// Descending order direction.
    Desc,
}

impl Default for OrderDirection {
    fn default() -> Self {
        Self::Asc
    }
}

/// Describes the fields that cart items can be ordered by.
#[derive(Enum, Copy, Clone, Eq, PartialEq)]
pub enum CommonOrderField {
    /// Orders by "id".
    Id,
}

impl Default for CommonOrderField {
    fn default() -> Self {
        Self::Id
    }
}

/// Specifies the order of cart items.
#[derive(InputObject)]
pub struct CommonOrderInput {
    /// Order direction of cart items.
    pub direction: Option<OrderDirection>,
    /// Field that cart items should be ordered by.
    pub field: Option<CommonOrderField>,
}

impl Default for CommonOrderInput {
    fn default() -> Self {
        Self {
            direction: Some(Default::default()),
            field: Some(Default::default()),
        }
    }
}

/// Payment options a cart can be checked out with.
#[derive(Enum, Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub enum PaymentOption {
    /// Debits the user's wallet balance on checkout.
    Wallet,
    /// Settles the total on delivery.
    CashOnDelivery,
}

impl Default for PaymentOption {
    fn default() -> Self {
        Self::Wallet
    }
}
