use async_graphql::SimpleObject;
use bson::Uuid;
use serde::{Deserialize, Serialize};

/// Product mirrored from the catalog service, reduced to what the cart needs.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone, Copy, SimpleObject)]
pub struct Product {
    /// UUID of the product.
    pub _id: Uuid,
    /// Cost of one unit in the smallest currency unit.
    pub cost: u64,
}

/// User mirrored from the user service, owning the wallet debited on checkout.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, SimpleObject)]
pub struct User {
    /// UUID of the user.
    pub _id: Uuid,
    /// Email address of the user. Unique.
    pub email: String,
    /// Remaining wallet balance in the smallest currency unit.
    pub wallet_balance: u64,
    /// Whether the user has configured a shipping address.
    pub address_configured: bool,
}
