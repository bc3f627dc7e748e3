use std::collections::HashMap;

use async_graphql::{Context, ErrorExtensions, Object, Result};
use bson::Uuid;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, DateTime},
    Collection, Database,
};

use super::error::CartError;
use super::model::{
    cart::Cart,
    cart_item::CartItem,
    foreign_types::{Product, User},
    order_datatypes::PaymentOption,
};
use super::mutation_input_structs::{AddProductToCartInput, UpdateProductInCartInput};
use super::query::{query_cart, query_cart_item, query_product, query_user};

/// Describes GraphQL cart mutations.
pub struct Mutation;

#[Object]
impl Mutation {
    /// Adds a product to the cart of a user, lazily creating the cart on first add.
    ///
    /// A product can only appear once per cart; counts are changed via update.
    async fn add_product_to_cart<'a>(
        &self,
        ctx: &Context<'a>,
        #[graphql(desc = "AddProductToCartInput")] input: AddProductToCartInput,
    ) -> Result<CartItem> {
        let db_client = ctx.data_unchecked::<Database>();
        let cart_collection: Collection<Cart> = db_client.collection::<Cart>("carts");
        let product_collection: Collection<Product> = db_client.collection::<Product>("products");
        add_product_to_cart(&cart_collection, &product_collection, &input)
            .await
            .map_err(|err| err.extend())
    }

    /// Updates the count of a product already in the cart of a user.
    async fn update_product_in_cart<'a>(
        &self,
        ctx: &Context<'a>,
        #[graphql(desc = "UpdateProductInCartInput")] input: UpdateProductInCartInput,
    ) -> Result<CartItem> {
        let db_client = ctx.data_unchecked::<Database>();
        let cart_collection: Collection<Cart> = db_client.collection::<Cart>("carts");
        let product_collection: Collection<Product> = db_client.collection::<Product>("products");
        update_product_in_cart(&cart_collection, &product_collection, &input)
            .await
            .map_err(|err| err.extend())
    }

    /// Removes a product from the cart of a user.
    async fn delete_product_from_cart<'a>(
        &self,
        ctx: &Context<'a>,
        #[graphql(desc = "Email address of the user owning the cart.")] user_email: String,
        #[graphql(desc = "UUID of the product to remove.")] product_id: Uuid,
    ) -> Result<bool> {
        let db_client = ctx.data_unchecked::<Database>();
        let cart_collection: Collection<Cart> = db_client.collection::<Cart>("carts");
        delete_product_from_cart(&cart_collection, &user_email, product_id)
            .await
            .map_err(|err| err.extend())
    }

    /// Sets the payment option of the cart of a user.
    async fn set_payment_option<'a>(
        &self,
        ctx: &Context<'a>,
        #[graphql(desc = "Email address of the user owning the cart.")] user_email: String,
        #[graphql(desc = "Payment option to check the cart out with.")]
        payment_option: PaymentOption,
    ) -> Result<Cart> {
        let db_client = ctx.data_unchecked::<Database>();
        let cart_collection: Collection<Cart> = db_client.collection::<Cart>("carts");
        set_payment_option(&cart_collection, &user_email, payment_option)
            .await
            .map_err(|err| err.extend())
    }

    /// Checks out the cart of a user.
    ///
    /// Debits the cart total from the user's wallet balance and clears the
    /// cart items. The emptied cart is returned.
    async fn checkout<'a>(
        &self,
        ctx: &Context<'a>,
        #[graphql(desc = "Email address of the user checking out.")] user_email: String,
    ) -> Result<Cart> {
        let db_client = ctx.data_unchecked::<Database>();
        let cart_collection: Collection<Cart> = db_client.collection::<Cart>("carts");
        let product_collection: Collection<Product> = db_client.collection::<Product>("products");
        let user_collection: Collection<User> = db_client.collection::<User>("users");
        checkout(
            &cart_collection,
            &product_collection,
            &user_collection,
            &user_email,
        )
        .await
        .map_err(|err| err.extend())
    }
}

/// Adds a product to a cart, creating the cart if the user does not have one yet.
///
/// * `cart_collection` - MongoDB collection of carts.
/// * `product_collection` - MongoDB collection of mirrored products.
/// * `input` - `AddProductToCartInput`.
async fn add_product_to_cart(
    cart_collection: &Collection<Cart>,
    product_collection: &Collection<Product>,
    input: &AddProductToCartInput,
) -> Result<CartItem, CartError> {
    query_product(product_collection, input.product_id).await?;
    let cart = find_or_create_cart(cart_collection, &input.user_email).await?;
    if cart.item_for_product(input.product_id).is_some() {
        return Err(CartError::DuplicateProduct(input.product_id));
    }
    let current_timestamp = DateTime::now();
    let cart_item = CartItem {
        _id: Uuid::new(),
        count: input.count,
        added_at: current_timestamp,
        product_id: input.product_id,
    };
    if let Err(_) = cart_collection
        .update_one(
            doc! {"_id": cart._id},
            doc! {"$push": {"internal_items": cart_item.clone()}, "$set": {"last_updated_at": current_timestamp}},
            None,
        )
        .await
    {
        let message = format!(
            "Adding product of UUID: `{}` to cart of user with email: `{}`",
            input.product_id, input.user_email
        );
        return Err(CartError::Database(message));
    }
    Ok(cart_item)
}

/// Queries the cart of a user, inserting an empty cart if none exists yet.
///
/// * `collection` - MongoDB collection of carts.
/// * `user_email` - Email address of the user owning the cart.
async fn find_or_create_cart(
    collection: &Collection<Cart>,
    user_email: &str,
) -> Result<Cart, CartError> {
    match collection.find_one(doc! {"user_email": user_email}, None).await {
        Ok(Some(cart)) => Ok(cart),
        Ok(None) => {
            let cart = Cart::new(user_email.to_string());
            match collection.insert_one(&cart, None).await {
                Ok(_) => Ok(cart),
                Err(_) => Err(CartError::Database(format!(
                    "Creating cart for user with email: `{}`",
                    user_email
                ))),
            }
        }
        Err(_) => Err(CartError::Database(format!(
            "Retrieving cart of user with email: `{}`",
            user_email
        ))),
    }
}

/// Updates the count of the cart item referencing a product.
///
/// Uses the positional `$` operator so only the matching item is written.
///
/// * `cart_collection` - MongoDB collection of carts.
/// * `product_collection` - MongoDB collection of mirrored products.
/// * `input` - `UpdateProductInCartInput`.
async fn update_product_in_cart(
    cart_collection: &Collection<Cart>,
    product_collection: &Collection<Product>,
    input: &UpdateProductInCartInput,
) -> Result<CartItem, CartError> {
    query_product(product_collection, input.product_id).await?;
    let cart = query_cart(cart_collection, &input.user_email).await?;
    let cart_item_id = cart
        .item_for_product(input.product_id)
        .ok_or(CartError::ProductNotInCart(input.product_id))?
        ._id;
    let current_timestamp = DateTime::now();
    if let Err(_) = cart_collection
        .update_one(
            doc! {"_id": cart._id, "internal_items.product_id": input.product_id},
            doc! {"$set": {"internal_items.$.count": input.count, "last_updated_at": current_timestamp}},
            None,
        )
        .await
    {
        let message = format!(
            "Updating count of product of UUID: `{}` in cart of user with email: `{}`",
            input.product_id, input.user_email
        );
        return Err(CartError::Database(message));
    }
    query_cart_item(cart_collection, cart_item_id).await
}

/// Removes the cart item referencing a product from a cart.
///
/// * `cart_collection` - MongoDB collection of carts.
/// * `user_email` - Email address of the user owning the cart.
/// * `product_id` - UUID of the product to remove.
async fn delete_product_from_cart(
    cart_collection: &Collection<Cart>,
    user_email: &str,
    product_id: Uuid,
) -> Result<bool, CartError> {
    let cart = query_cart(cart_collection, user_email).await?;
    if cart.item_for_product(product_id).is_none() {
        return Err(CartError::ProductNotInCart(product_id));
    }
    let current_timestamp = DateTime::now();
    if let Err(_) = cart_collection
        .update_one(
            doc! {"_id": cart._id},
            doc! {"$pull": {"internal_items": {"product_id": product_id}}, "$set": {"last_updated_at": current_timestamp}},
            None,
        )
        .await
    {
        let message = format!(
            "Removing product of UUID: `{}` from cart of user with email: `{}`",
            product_id, user_email
        );
        return Err(CartError::Database(message));
    }
    Ok(true)
}

/// Sets the payment option of a cart.
///
/// * `cart_collection` - MongoDB collection of carts.
/// * `user_email` - Email address of the user owning the cart.
/// * `payment_option` - Payment option to set.
async fn set_payment_option(
    cart_collection: &Collection<Cart>,
    user_email: &str,
    payment_option: PaymentOption,
) -> Result<Cart, CartError> {
    let cart = query_cart(cart_collection, user_email).await?;
    let payment_option_bson = bson::to_bson(&payment_option).map_err(|_| {
        CartError::Database(format!(
            "Serializing payment option of cart of user with email: `{}`",
            user_email
        ))
    })?;
    if let Err(_) = cart_collection
        .update_one(
            doc! {"_id": cart._id},
            doc! {"$set": {"payment_option": payment_option_bson, "last_updated_at": DateTime::now()}},
            None,
        )
        .await
    {
        let message = format!(
            "Setting payment option of cart of user with email: `{}`",
            user_email
        );
        return Err(CartError::Database(message));
    }
    query_cart(cart_collection, user_email).await
}

/// Checks out the cart of a user.
///
/// Validates the preconditions, debits the wallet and clears the cart items.
/// The debit and the clear are two separate writes; the original system keeps
/// the same save order (user first, then cart).
///
/// * `cart_collection` - MongoDB collection of carts.
/// * `product_collection` - MongoDB collection of mirrored products.
/// * `user_collection` - MongoDB collection of mirrored users.
/// * `user_email` - Email address of the user checking out.
async fn checkout(
    cart_collection: &Collection<Cart>,
    product_collection: &Collection<Product>,
    user_collection: &Collection<User>,
    user_email: &str,
) -> Result<Cart, CartError> {
    let cart = query_cart(cart_collection, user_email).await?;
    ensure_items_to_check_out(&cart)?;
    let user = query_user(user_collection, user_email).await?;
    let products = query_cart_products(product_collection, &cart).await?;
    let total = validate_checkout(&cart, &user, &products)?;
    debit_wallet(user_collection, &user, total).await?;
    clear_cart_items(cart_collection, cart._id).await?;
    query_cart(cart_collection, user_email).await
}

/// Queries the mirrored products referenced by the items of a cart.
///
/// * `collection` - MongoDB collection of mirrored products.
/// * `cart` - Cart whose referenced products to query.
async fn query_cart_products(
    collection: &Collection<Product>,
    cart: &Cart,
) -> Result<HashMap<Uuid, Product>, CartError> {
    let product_ids: Vec<Uuid> = cart
        .internal_items
        .iter()
        .map(|cart_item| cart_item.product_id)
        .collect();
    let message = format!(
        "Retrieving products of cart items of user with email: `{}`",
        cart.user_email
    );
    match collection
        .find(doc! {"_id": { "$in": &product_ids }}, None)
        .await
    {
        Ok(cursor) => {
            let products: Vec<Product> = cursor
                .try_collect()
                .await
                .map_err(|_| CartError::Database(message))?;
            Ok(products
                .into_iter()
                .map(|product| (product._id, product))
                .collect())
        }
        Err(_) => Err(CartError::Database(message)),
    }
}

/// Rejects checkout of a cart without items.
///
/// Checked directly after the cart lookup, before the user is even queried, so
/// an empty cart fails the same way whether or not the user is mirrored.
fn ensure_items_to_check_out(cart: &Cart) -> Result<(), CartError> {
    match cart.internal_items.is_empty() {
        true => Err(CartError::EmptyCart),
        false => Ok(()),
    }
}

/// Validates the checkout preconditions and returns the cart total.
///
/// The cart must contain items, the user must have a configured address and
/// the wallet balance must cover the total of cost times count over all items.
fn validate_checkout(
    cart: &Cart,
    user: &User,
    products: &HashMap<Uuid, Product>,
) -> Result<u64, CartError> {
    ensure_items_to_check_out(cart)?;
    if !user.address_configured {
        return Err(CartError::AddressNotConfigured(user.email.clone()));
    }
    let total = total_cost(&cart.internal_items, products)?;
    if user.wallet_balance < total {
        return Err(CartError::InsufficientBalance {
            balance: user.wallet_balance,
            total,
        });
    }
    Ok(total)
}

/// Sums cost times count over all cart items.
///
/// Costs are mirrored from events and not bounded by this service, so the
/// arithmetic is checked instead of assumed to fit in a `u64`.
fn total_cost(
    cart_items: &[CartItem],
    products: &HashMap<Uuid, Product>,
) -> Result<u64, CartError> {
    cart_items.iter().try_fold(0u64, |sum, cart_item| {
        let product = products
            .get(&cart_item.product_id)
            .ok_or(CartError::ProductNotFound(cart_item.product_id))?;
        product
            .cost
            .checked_mul(u64::from(cart_item.count))
            .and_then(|item_cost| sum.checked_add(item_cost))
            .ok_or(CartError::TotalOverflow)
    })
}

/// Writes the debited wallet balance of a user.
///
/// * `collection` - MongoDB collection of mirrored users.
/// * `user` - User whose wallet to debit.
/// * `total` - Cart total to debit, already validated against the balance.
async fn debit_wallet(
    collection: &Collection<User>,
    user: &User,
    total: u64,
) -> Result<(), CartError> {
    let remaining_balance = user.wallet_balance - total;
    if let Err(_) = collection
        .update_one(
            doc! {"_id": user._id},
            doc! {"$set": {"wallet_balance": remaining_balance as i64}},
            None,
        )
        .await
    {
        let message = format!("Debiting wallet of user with email: `{}`", user.email);
        return Err(CartError::Database(message));
    }
    Ok(())
}

/// Clears the items of a cart, keeping the cart document itself.
///
/// * `collection` - MongoDB collection of carts.
/// * `cart_id` - UUID of the cart to clear.
async fn clear_cart_items(collection: &Collection<Cart>, cart_id: Uuid) -> Result<(), CartError> {
    let empty_items: Vec<CartItem> = Vec::new();
    if let Err(_) = collection
        .update_one(
            doc! {"_id": cart_id},
            doc! {"$set": {"internal_items": empty_items, "last_updated_at": DateTime::now()}},
            None,
        )
        .await
    {
        let message = format!("Clearing items of cart of UUID: `{}`", cart_id);
        return Err(CartError::Database(message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_with_items(cart_items: Vec<CartItem>) -> Cart {
        Cart {
            _id: Uuid::new(),
            user_email: "customer@example.com".to_string(),
            payment_option: PaymentOption::Wallet,
            last_updated_at: DateTime::now(),
            internal_items: cart_items,
        }
    }

    fn user_with_balance(wallet_balance: u64) -> User {
        User {
            _id: Uuid::new(),
            email: "customer@example.com".to_string(),
            wallet_balance,
            address_configured: true,
        }
    }

    fn item(product_id: Uuid, count: u32) -> CartItem {
        CartItem {
            _id: Uuid::new(),
            count,
            added_at: DateTime::now(),
            product_id,
        }
    }

    fn mirrored(products: &[(Uuid, u64)]) -> HashMap<Uuid, Product> {
        products
            .iter()
            .map(|(id, cost)| (*id, Product { _id: *id, cost: *cost }))
            .collect()
    }

    #[test]
    fn total_cost_sums_cost_times_count() {
        let first_product_id = Uuid::new();
        let second_product_id = Uuid::new();
        let products = mirrored(&[(first_product_id, 250), (second_product_id, 100)]);
        let cart_items = vec![item(first_product_id, 2), item(second_product_id, 3)];
        assert_eq!(total_cost(&cart_items, &products), Ok(800));
    }

    #[test]
    fn total_cost_rejects_item_cost_overflow() {
        let product_id = Uuid::new();
        let products = mirrored(&[(product_id, u64::MAX)]);
        let cart_items = vec![item(product_id, 2)];
        assert_eq!(
            total_cost(&cart_items, &products),
            Err(CartError::TotalOverflow)
        );
    }

    #[test]
    fn total_cost_rejects_sum_overflow() {
        let first_product_id = Uuid::new();
        let second_product_id = Uuid::new();
        let products = mirrored(&[(first_product_id, u64::MAX), (second_product_id, 1)]);
        let cart_items = vec![item(first_product_id, 1), item(second_product_id, 1)];
        assert_eq!(
            total_cost(&cart_items, &products),
            Err(CartError::TotalOverflow)
        );
    }

    #[test]
    fn total_cost_fails_for_unmirrored_product() {
        let product_id = Uuid::new();
        let cart_items = vec![item(product_id, 1)];
        assert_eq!(
            total_cost(&cart_items, &HashMap::new()),
            Err(CartError::ProductNotFound(product_id))
        );
    }

    #[test]
    fn checkout_rejects_empty_cart() {
        let cart = cart_with_items(Vec::new());
        let user = user_with_balance(1000);
        assert_eq!(
            validate_checkout(&cart, &user, &HashMap::new()),
            Err(CartError::EmptyCart)
        );
    }

    #[test]
    fn empty_cart_is_rejected_before_any_user_state_is_consulted() {
        let cart = cart_with_items(Vec::new());
        assert_eq!(
            ensure_items_to_check_out(&cart),
            Err(CartError::EmptyCart)
        );

        let filled_cart = cart_with_items(vec![item(Uuid::new(), 1)]);
        assert_eq!(ensure_items_to_check_out(&filled_cart), Ok(()));
    }

    #[test]
    fn checkout_requires_configured_address() {
        let product_id = Uuid::new();
        let cart = cart_with_items(vec![item(product_id, 1)]);
        let mut user = user_with_balance(1000);
        user.address_configured = false;
        assert_eq!(
            validate_checkout(&cart, &user, &mirrored(&[(product_id, 100)])),
            Err(CartError::AddressNotConfigured(user.email.clone()))
        );
    }

    #[test]
    fn checkout_rejects_uncovered_balance() {
        let product_id = Uuid::new();
        let cart = cart_with_items(vec![item(product_id, 3)]);
        let user = user_with_balance(299);
        assert_eq!(
            validate_checkout(&cart, &user, &mirrored(&[(product_id, 100)])),
            Err(CartError::InsufficientBalance {
                balance: 299,
                total: 300
            })
        );
    }

    #[test]
    fn checkout_passes_with_exactly_covering_balance() {
        let product_id = Uuid::new();
        let cart = cart_with_items(vec![item(product_id, 3)]);
        let user = user_with_balance(300);
        assert_eq!(
            validate_checkout(&cart, &user, &mirrored(&[(product_id, 100)])),
            Ok(300)
        );
    }
}
