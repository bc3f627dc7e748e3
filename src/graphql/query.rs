use async_graphql::{Context, ErrorExtensions, Object, Result};

use bson::Uuid;
use mongodb::{bson::doc, options::FindOneOptions, Collection, Database};

use super::error::CartError;
use super::model::{
    cart::Cart,
    cart_item::CartItem,
    foreign_types::{Product, User},
};

/// Describes GraphQL cart queries.
pub struct Query;

#[Object]
impl Query {
    /// Retrieves the cart of the user with the given email address.
    async fn cart<'a>(
        &self,
        ctx: &Context<'a>,
        #[graphql(desc = "Email address of the user owning the cart.")] user_email: String,
    ) -> Result<Cart> {
        let db_client = ctx.data::<Database>()?;
        let collection: Collection<Cart> = db_client.collection::<Cart>("carts");
        query_cart(&collection, &user_email)
            .await
            .map_err(|err| err.extend())
    }

    /// Retrieves cart item of specific id.
    async fn cart_item<'a>(
        &self,
        ctx: &Context<'a>,
        #[graphql(desc = "UUID of cart item to retrieve.")] id: Uuid,
    ) -> Result<CartItem> {
        let db_client = ctx.data::<Database>()?;
        let collection: Collection<Cart> = db_client.collection::<Cart>("carts");
        query_cart_item(&collection, id)
            .await
            .map_err(|err| err.extend())
    }

    /// Entity resolver for user of specific id.
    #[graphql(entity)]
    async fn user_entity_resolver<'a>(
        &self,
        ctx: &Context<'a>,
        #[graphql(key, desc = "UUID of user to retrieve.")] id: Uuid,
    ) -> Result<User> {
        let db_client = ctx.data::<Database>()?;
        let collection: Collection<User> = db_client.collection::<User>("users");
        query_user_by_id(&collection, id)
            .await
            .map_err(|err| err.extend())
    }

    /// Entity resolver for cart item of specific id.
    #[graphql(entity)]
    async fn cart_item_entity_resolver<'a>(
        &self,
        ctx: &Context<'a>,
        #[graphql(key, desc = "UUID of cart item to retrieve.")] id: Uuid,
    ) -> Result<CartItem> {
        let db_client = ctx.data::<Database>()?;
        let collection: Collection<Cart> = db_client.collection::<Cart>("carts");
        query_cart_item(&collection, id)
            .await
            .map_err(|err| err.extend())
    }
}

/// Shared function to query a cart from a MongoDB collection of carts.
///
/// * `collection` - MongoDB collection to query cart from.
/// * `user_email` - Email address of the user owning the cart.
pub async fn query_cart(collection: &Collection<Cart>, user_email: &str) -> Result<Cart, CartError> {
    match collection.find_one(doc! {"user_email": user_email}, None).await {
        Ok(maybe_cart) => maybe_cart.ok_or_else(|| CartError::CartNotFound(user_email.to_string())),
        Err(_) => Err(CartError::Database(format!(
            "Retrieving cart of user with email: `{}`",
            user_email
        ))),
    }
}

/// Shared function to query a cart item from a MongoDB collection of carts.
///
/// Uses an `$elemMatch` projection so only the matching item is deserialized.
///
/// * `collection` - MongoDB collection to query cart item from.
/// * `id` - UUID of cart item.
pub async fn query_cart_item(collection: &Collection<Cart>, id: Uuid) -> Result<CartItem, CartError> {
    let find_options = FindOneOptions::builder()
        .projection(Some(doc! {
            "internal_items.$": 1,
            "user_email": 1,
            "payment_option": 1,
            "last_updated_at": 1,
            "_id": 1
        }))
        .build();
    match collection
        .find_one(
            doc! {"internal_items": {
                "$elemMatch": {
                    "_id": id
                }
            }},
            Some(find_options),
        )
        .await
    {
        Ok(maybe_cart) => maybe_cart
            .and_then(|cart| cart.internal_items.into_iter().next())
            .ok_or(CartError::CartItemNotFound(id)),
        Err(_) => Err(CartError::Database(format!(
            "Retrieving cart item of UUID: `{}`",
            id
        ))),
    }
}

/// Shared function to query a product from a MongoDB collection of mirrored products.
///
/// * `collection` - MongoDB collection to query product from.
/// * `id` - UUID of product.
pub async fn query_product(
    collection: &Collection<Product>,
    id: Uuid,
) -> Result<Product, CartError> {
    match collection.find_one(doc! {"_id": id}, None).await {
        Ok(maybe_product) => maybe_product.ok_or(CartError::ProductNotFound(id)),
        Err(_) => Err(CartError::Database(format!(
            "Retrieving product of UUID: `{}`",
            id
        ))),
    }
}

/// Shared function to query a user from a MongoDB collection of mirrored users.
///
/// * `collection` - MongoDB collection to query user from.
/// * `email` - Email address of user.
pub async fn query_user(collection: &Collection<User>, email: &str) -> Result<User, CartError> {
    match collection.find_one(doc! {"email": email}, None).await {
        Ok(maybe_user) => maybe_user.ok_or_else(|| CartError::UserNotFound(email.to_string())),
        Err(_) => Err(CartError::Database(format!(
            "Retrieving user with email: `{}`",
            email
        ))),
    }
}

/// Shared function to query a user by UUID from a MongoDB collection of mirrored users.
///
/// * `collection` - MongoDB collection to query user from.
/// * `id` - UUID of user.
pub async fn query_user_by_id(collection: &Collection<User>, id: Uuid) -> Result<User, CartError> {
    match collection.find_one(doc! {"_id": id}, None).await {
        Ok(maybe_user) => maybe_user.ok_or(CartError::UserIdNotFound(id)),
        Err(_) => Err(CartError::Database(format!(
            "Retrieving user of UUID: `{}`",
            id
        ))),
    }
}
