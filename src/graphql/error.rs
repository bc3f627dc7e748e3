use async_graphql::{Error, ErrorExtensions};
use bson::Uuid;

/// Failures of cart and checkout operations.
///
/// Each variant carries a fixed message and maps to the status code of the
/// implicit REST contract (404, 400, 500), surfaced to GraphQL clients as a
/// `statusCode` error extension.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CartError {
    /// No cart exists for the given user email.
    #[error("Cart of user with email: `{0}` not found.")]
    CartNotFound(String),
    /// The referenced product is not mirrored in the system.
    #[error("Product with UUID: `{0}` is not present in the system.")]
    ProductNotFound(Uuid),
    /// No user is mirrored for the given email.
    #[error("User with email: `{0}` not found.")]
    UserNotFound(String),
    /// No user is mirrored for the given UUID.
    #[error("User with UUID: `{0}` not found.")]
    UserIdNotFound(Uuid),
    /// No cart contains an item of the given UUID.
    #[error("CartItem with UUID: `{0}` not found.")]
    CartItemNotFound(Uuid),
    /// The product is already in the cart; counts are changed via update.
    #[error("Product with UUID: `{0}` is already in the cart.")]
    DuplicateProduct(Uuid),
    /// The product is not in the cart.
    #[error("Product with UUID: `{0}` is not in the cart.")]
    ProductNotInCart(Uuid),
    /// Checkout was attempted on a cart without items.
    #[error("Cart does not contain any items to check out.")]
    EmptyCart,
    /// Checkout requires a configured shipping address.
    #[error("Address is not configured for user with email: `{0}`.")]
    AddressNotConfigured(String),
    /// The wallet balance does not cover the cart total.
    #[error("Wallet balance `{balance}` does not cover the total cost `{total}`.")]
    InsufficientBalance { balance: u64, total: u64 },
    /// The cart total exceeds the representable range.
    #[error("Total cost of the cart exceeds the representable range.")]
    TotalOverflow,
    /// A database read or write failed.
    #[error("{0} failed in MongoDB.")]
    Database(String),
}

impl CartError {
    /// Status code of the implicit REST contract.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::CartNotFound(_)
            | Self::ProductNotFound(_)
            | Self::UserNotFound(_)
            | Self::UserIdNotFound(_)
            | Self::CartItemNotFound(_) => 404,
            Self::DuplicateProduct(_)
            | Self::ProductNotInCart(_)
            | Self::EmptyCart
            | Self::AddressNotConfigured(_)
            | Self::InsufficientBalance { .. } => 400,
            Self::TotalOverflow | Self::Database(_) => 500,
        }
    }
}

impl ErrorExtensions for CartError {
    fn extend(&self) -> Error {
        Error::new(self.to_string())
            .extend_with(|_, extensions| extensions.set("statusCode", i32::from(self.status_code())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_errors_carry_404() {
        let id = Uuid::new();
        assert_eq!(CartError::CartNotFound("a@b.com".to_string()).status_code(), 404);
        assert_eq!(CartError::ProductNotFound(id).status_code(), 404);
        assert_eq!(CartError::UserNotFound("a@b.com".to_string()).status_code(), 404);
        assert_eq!(CartError::UserIdNotFound(id).status_code(), 404);
        assert_eq!(CartError::CartItemNotFound(id).status_code(), 404);
    }

    #[test]
    fn precondition_errors_carry_400() {
        let id = Uuid::new();
        assert_eq!(CartError::DuplicateProduct(id).status_code(), 400);
        assert_eq!(CartError::ProductNotInCart(id).status_code(), 400);
        assert_eq!(CartError::EmptyCart.status_code(), 400);
        assert_eq!(
            CartError::AddressNotConfigured("a@b.com".to_string()).status_code(),
            400
        );
        assert_eq!(
            CartError::InsufficientBalance {
                balance: 5,
                total: 10
            }
            .status_code(),
            400
        );
    }

    #[test]
    fn database_errors_carry_500() {
        assert_eq!(
            CartError::Database("Retrieving cart".to_string()).status_code(),
            500
        );
        assert_eq!(CartError::TotalOverflow.status_code(), 500);
    }

    #[test]
    fn extension_exposes_status_code() {
        let error = CartError::EmptyCart.extend();
        let extensions = error.extensions.expect("extensions should be set");
        assert_eq!(
            extensions.get("statusCode"),
            Some(&async_graphql::Value::from(400))
        );
    }
}
