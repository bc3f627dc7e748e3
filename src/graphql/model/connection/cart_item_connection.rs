use async_graphql::SimpleObject;

use super::super::cart_item::CartItem;

/// A connection of cart items.
#[derive(SimpleObject)]
#[graphql(shareable)]
pub struct CartItemConnection {
    /// The resulting entities.
    pub nodes: Vec<CartItem>,
    /// Whether this connection has a next page.
    pub has_next_page: bool,
    /// The total amount of items in this connection.
    pub total_count: u64,
}
