use async_graphql::InputObject;
use bson::Uuid;

#[derive(InputObject)]
pub struct AddProductToCartInput {
    /// Email address of the user owning the cart.
    pub user_email: String,
    /// UUID of the product to add.
    pub product_id: Uuid,
    /// Count of the product in the cart.
    pub count: u32,
}

#[derive(InputObject)]
pub struct UpdateProductInCartInput {
    /// Email address of the user owning the cart.
    pub user_email: String,
    /// UUID of the product whose cart item to update.
    pub product_id: Uuid,
    /// New count of the product in the cart.
    pub count: u32,
}
