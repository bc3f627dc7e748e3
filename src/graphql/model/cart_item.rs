use std::cmp::Ordering;

use async_graphql::{ComplexObject, Context, ErrorExtensions, Result, SimpleObject};
use bson::Uuid;
use bson::{datetime::DateTime, doc, Bson};
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};

use crate::graphql::query::query_product;

use super::foreign_types::Product;

/// Cart item in the cart of a user.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone, SimpleObject)]
#[graphql(complex)]
pub struct CartItem {
    /// Cart item UUID.
    pub _id: Uuid,
    /// Count of the referenced product in the cart.
    pub count: u32,
    /// Timestamp when the cart item was added.
    pub added_at: DateTime,
    #[graphql(skip)]
    /// Internal attribute referencing the mirrored product.
    pub product_id: Uuid,
}

#[ComplexObject]
impl CartItem {
    /// Retrieves the product referenced by this cart item.
    ///
    /// The cost is always read from the mirrored product, never snapshotted in
    /// the cart item itself.
    async fn product<'a>(&self, ctx: &Context<'a>) -> Result<Product> {
        let db_client = ctx.data::<Database>()?;
        let collection: Collection<Product> = db_client.collection::<Product>("products");
        query_product(&collection, self.product_id)
            .await
            .map_err(|err| err.extend())
    }
}

impl PartialOrd for CartItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self._id.partial_cmp(&other._id)
    }
}

impl From<CartItem> for Bson {
    fn from(value: CartItem) -> Self {
        Bson::Document(
            doc! {"_id": value._id, "count": value.count, "added_at": value.added_at, "product_id": value.product_id},
        )
    }
}
