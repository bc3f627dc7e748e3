use std::cmp::Ordering;

use async_graphql::{ComplexObject, Result, SimpleObject};

use bson::datetime::DateTime;
use bson::Uuid;

use serde::{Deserialize, Serialize};

use super::{
    cart_item::CartItem,
    connection::cart_item_connection::CartItemConnection,
    order_datatypes::{CommonOrderInput, OrderDirection, PaymentOption},
};

/// The cart of a user, keyed by the user's email address.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Cart {
    /// Cart UUID.
    pub _id: Uuid,
    /// Email address of the user owning the cart. Unique.
    pub user_email: String,
    /// Payment option chosen for checkout.
    pub payment_option: PaymentOption,
    /// Timestamp when the cart was last updated.
    pub last_updated_at: DateTime,
    #[graphql(skip)]
    /// Internal attribute containing all cart items.
    pub internal_items: Vec<CartItem>,
}

impl Cart {
    /// Creates an empty cart for the user of the given email address.
    pub fn new(user_email: String) -> Self {
        Self {
            _id: Uuid::new(),
            user_email,
            payment_option: PaymentOption::default(),
            last_updated_at: DateTime::now(),
            internal_items: Vec::new(),
        }
    }

    /// Linear scan for the item referencing the given product.
    pub fn item_for_product(&self, product_id: Uuid) -> Option<&CartItem> {
        self.internal_items
            .iter()
            .find(|item| item.product_id == product_id)
    }
}

#[ComplexObject]
impl Cart {
    /// Retrieves the items in the cart.
    async fn items(
        &self,
        #[graphql(desc = "Describes that the `first` N cart items should be retrieved.")]
        first: Option<usize>,
        #[graphql(desc = "Describes how many cart items should be skipped at the beginning.")]
        skip: Option<usize>,
        #[graphql(desc = "Specifies the order in which cart items are retrieved.")] order_by: Option<
            CommonOrderInput,
        >,
    ) -> Result<CartItemConnection> {
        Ok(items_connection(
            self.internal_items.clone(),
            first,
            skip,
            order_by,
        ))
    }
}

/// Sorts and windows cart items into a connection.
///
/// * `cart_items` - Cart items to build the connection from.
/// * `first` - Maximum number of items to retrieve.
/// * `skip` - Number of items to skip at the beginning.
/// * `order_by` - Specifies order of the items.
fn items_connection(
    mut cart_items: Vec<CartItem>,
    first: Option<usize>,
    skip: Option<usize>,
    order_by: Option<CommonOrderInput>,
) -> CartItemConnection {
    sort_cart_items(&mut cart_items, order_by);
    let total_count = cart_items.len();
    let definitely_skip = skip.unwrap_or(0);
    let definitely_first = first.unwrap_or(usize::MAX);
    let cart_items_part: Vec<CartItem> = cart_items
        .into_iter()
        .skip(definitely_skip)
        .take(definitely_first)
        .collect();
    let has_next_page = total_count > cart_items_part.len() + definitely_skip;
    CartItemConnection {
        nodes: cart_items_part,
        has_next_page,
        total_count: total_count as u64,
    }
}

/// Sorts vector of cart items according to base order.
///
/// * `cart_items` - Vector of cart items to sort.
/// * `order_by` - Specifies order of sorted result.
fn sort_cart_items(cart_items: &mut Vec<CartItem>, order_by: Option<CommonOrderInput>) {
    let comparator: fn(&CartItem, &CartItem) -> bool =
        match order_by.unwrap_or_default().direction.unwrap_or_default() {
            OrderDirection::Asc => |first_cart_item, second_cart_item| {
                first_cart_item < second_cart_item
            },
            OrderDirection::Desc => |first_cart_item, second_cart_item| {
                first_cart_item > second_cart_item
            },
        };
    cart_items.sort_by(|first_cart_item, second_cart_item| {
        match comparator(first_cart_item, second_cart_item) {
            true => Ordering::Less,
            false => Ordering::Greater,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_with_id(id: Uuid) -> CartItem {
        CartItem {
            _id: id,
            count: 1,
            added_at: DateTime::now(),
            product_id: Uuid::new(),
        }
    }

    fn sorted_ids(order_by: Option<CommonOrderInput>) -> (Vec<Uuid>, Vec<Uuid>) {
        let mut ids = vec![Uuid::new(), Uuid::new(), Uuid::new()];
        let mut cart_items: Vec<CartItem> = ids.iter().map(|id| item_with_id(*id)).collect();
        sort_cart_items(&mut cart_items, order_by);
        ids.sort_by(|first_id, second_id| first_id.partial_cmp(second_id).unwrap());
        (ids, cart_items.into_iter().map(|item| item._id).collect())
    }

    #[test]
    fn cart_items_sort_ascending_by_default() {
        let (expected_ids, actual_ids) = sorted_ids(None);
        assert_eq!(expected_ids, actual_ids);
    }

    #[test]
    fn cart_items_sort_descending_when_requested() {
        let order_by = CommonOrderInput {
            direction: Some(OrderDirection::Desc),
            field: None,
        };
        let (mut expected_ids, actual_ids) = sorted_ids(Some(order_by));
        expected_ids.reverse();
        assert_eq!(expected_ids, actual_ids);
    }

    #[test]
    fn items_connection_windows_with_first_and_skip() {
        let cart_items: Vec<CartItem> = (0..5).map(|_| item_with_id(Uuid::new())).collect();
        let connection = items_connection(cart_items.clone(), Some(2), Some(1), None);
        assert_eq!(connection.nodes.len(), 2);
        assert_eq!(connection.total_count, 5);
        assert!(connection.has_next_page);

        let tail = items_connection(cart_items, None, Some(3), None);
        assert_eq!(tail.nodes.len(), 2);
        assert!(!tail.has_next_page);
    }

    #[test]
    fn item_for_product_finds_present_product() {
        let product_id = Uuid::new();
        let mut cart = Cart::new("customer@example.com".to_string());
        cart.internal_items = vec![
            item_with_id(Uuid::new()),
            CartItem {
                _id: Uuid::new(),
                count: 2,
                added_at: DateTime::now(),
                product_id,
            },
        ];
        let cart_item = cart.item_for_product(product_id).unwrap();
        assert_eq!(cart_item.product_id, product_id);
        assert_eq!(cart_item.count, 2);
    }

    #[test]
    fn item_for_product_misses_absent_product() {
        let mut cart = Cart::new("customer@example.com".to_string());
        cart.internal_items = vec![item_with_id(Uuid::new())];
        assert!(cart.item_for_product(Uuid::new()).is_none());
    }

    #[test]
    fn new_cart_starts_empty_with_wallet_payment() {
        let cart = Cart::new("customer@example.com".to_string());
        assert!(cart.internal_items.is_empty());
        assert_eq!(cart.payment_option, PaymentOption::Wallet);
    }
}
