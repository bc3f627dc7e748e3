use axum::{debug_handler, extract::State, http::StatusCode, Json};
use bson::{doc, Uuid};
use log::info;
use mongodb::{options::UpdateOptions, Collection};
use serde::{Deserialize, Serialize};

use crate::graphql::model::foreign_types::{Product, User};

/// Data to send to Dapr in order to describe a subscription.
#[derive(Serialize)]
pub struct Pubsub {
    #[serde(rename(serialize = "pubsubName"))]
    pub pubsubname: String,
    pub topic: String,
    pub route: String,
}

/// Reponse data to send to Dapr when receiving an event.
#[derive(Serialize)]
pub struct TopicEventResponse {
    pub status: u8,
}

/// Default status is `0` -> Ok, according to Dapr specs.
impl Default for TopicEventResponse {
    fn default() -> Self {
        Self { status: 0 }
    }
}

/// Relevant part of Dapr event wrapped in a cloud envelope.
#[derive(Deserialize, Debug)]
pub struct Event<T> {
    pub topic: String,
    pub data: T,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
/// Relevant part of product creation and update event data.
pub struct ProductEventData {
    /// Product UUID.
    pub id: Uuid,
    /// Cost of one unit in the smallest currency unit.
    pub cost: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
/// Relevant part of user creation and update event data.
pub struct UserEventData {
    /// User UUID.
    pub id: Uuid,
    /// Email address of the user.
    pub email: String,
    /// Wallet balance in the smallest currency unit.
    pub wallet_balance: u64,
    /// Whether the user has configured a shipping address.
    pub address_configured: bool,
}

/// Service state containing database connections.
#[derive(Clone)]
pub struct HttpEventServiceState {
    pub product_collection: Collection<Product>,
    pub user_collection: Collection<User>,
}

/// HTTP endpoint to list topic subsciptions.
pub async fn list_topic_subscriptions() -> Result<Json<Vec<Pubsub>>, StatusCode> {
    let pubsub_user_created = Pubsub {
        pubsubname: "pubsub".to_string(),
        topic: "user/user/created".to_string(),
        route: "/on-user-event".to_string(),
    };
    let pubsub_user_updated = Pubsub {
        pubsubname: "pubsub".to_string(),
        topic: "user/user/updated".to_string(),
        route: "/on-user-event".to_string(),
    };
    let pubsub_product_created = Pubsub {
        pubsubname: "pubsub".to_string(),
        topic: "catalog/product/created".to_string(),
        route: "/on-product-event".to_string(),
    };
    let pubsub_product_updated = Pubsub {
        pubsubname: "pubsub".to_string(),
        topic: "catalog/product/updated".to_string(),
        route: "/on-product-event".to_string(),
    };
    Ok(Json(vec![
        pubsub_user_created,
        pubsub_user_updated,
        pubsub_product_created,
        pubsub_product_updated,
    ]))
}

/// HTTP endpoint to receive product creation and update events.
///
/// * `state` - Service state containing database connections.
/// * `event` - Event handled by endpoint.
#[debug_handler(state = HttpEventServiceState)]
pub async fn on_product_event(
    State(state): State<HttpEventServiceState>,
    Json(event): Json<Event<ProductEventData>>,
) -> Result<Json<TopicEventResponse>, StatusCode> {
    info!("{:?}", event);

    match event.topic.as_str() {
        "catalog/product/created" | "catalog/product/updated" => {
            upsert_product_in_mongodb(&state.product_collection, event.data).await?
        }
        _ => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
    Ok(Json(TopicEventResponse::default()))
}

/// HTTP endpoint to receive user creation and update events.
///
/// * `state` - Service state containing database connections.
/// * `event` - Event handled by endpoint.
#[debug_handler(state = HttpEventServiceState)]
pub async fn on_user_event(
    State(state): State<HttpEventServiceState>,
    Json(event): Json<Event<UserEventData>>,
) -> Result<Json<TopicEventResponse>, StatusCode> {
    info!("{:?}", event);

    match event.topic.as_str() {
        "user/user/created" | "user/user/updated" => {
            upsert_user_in_mongodb(&state.user_collection, event.data).await?
        }
        _ => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
    Ok(Json(TopicEventResponse::default()))
}

/// Converts a money amount from an event into its BSON 64-bit int representation.
///
/// Amounts above `i64::MAX` cannot be stored without wrapping negative and are
/// rejected instead of written.
fn mirrored_money(amount: u64) -> Result<i64, StatusCode> {
    i64::try_from(amount).map_err(|_| StatusCode::BAD_REQUEST)
}

/// Upserts a mirrored product in MongoDB.
///
/// * `collection` - MongoDB collection to upsert mirrored product in.
/// * `product_event_data` - Product event data containing UUID and cost.
pub async fn upsert_product_in_mongodb(
    collection: &Collection<Product>,
    product_event_data: ProductEventData,
) -> Result<(), StatusCode> {
    let cost = mirrored_money(product_event_data.cost)?;
    let update_options = UpdateOptions::builder().upsert(true).build();
    match collection
        .update_one(
            doc! {"_id": product_event_data.id},
            doc! {"$set": {"cost": cost}},
            update_options,
        )
        .await
    {
        Ok(_) => Ok(()),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Upserts a mirrored user in MongoDB.
///
/// * `collection` - MongoDB collection to upsert mirrored user in.
/// * `user_event_data` - User event data containing email, wallet balance and address flag.
pub async fn upsert_user_in_mongodb(
    collection: &Collection<User>,
    user_event_data: UserEventData,
) -> Result<(), StatusCode> {
    let wallet_balance = mirrored_money(user_event_data.wallet_balance)?;
    let update_options = UpdateOptions::builder().upsert(true).build();
    match collection
        .update_one(
            doc! {"_id": user_event_data.id},
            doc! {"$set": {
                "email": user_event_data.email,
                "wallet_balance": wallet_balance,
                "address_configured": user_event_data.address_configured
            }},
            update_options,
        )
        .await
    {
        Ok(_) => Ok(()),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_event_payload_deserializes_from_camel_case() {
        let payload = r#"{
            "topic": "user/user/created",
            "data": {
                "id": "2df77aa0-fa9e-4d09-a263-ff9047af881e",
                "email": "customer@example.com",
                "walletBalance": 5000,
                "addressConfigured": true
            }
        }"#;
        let event: Event<UserEventData> = serde_json::from_str(payload).unwrap();
        assert_eq!(event.topic, "user/user/created");
        assert_eq!(event.data.email, "customer@example.com");
        assert_eq!(event.data.wallet_balance, 5000);
        assert!(event.data.address_configured);
    }

    #[test]
    fn product_event_payload_deserializes_from_camel_case() {
        let payload = r#"{
            "topic": "catalog/product/updated",
            "data": {
                "id": "2df77aa0-fa9e-4d09-a263-ff9047af881e",
                "cost": 250
            }
        }"#;
        let event: Event<ProductEventData> = serde_json::from_str(payload).unwrap();
        assert_eq!(event.topic, "catalog/product/updated");
        assert_eq!(event.data.cost, 250);
    }

    #[test]
    fn mirrored_money_rejects_amounts_above_i64_max() {
        assert_eq!(mirrored_money(5000), Ok(5000));
        assert_eq!(mirrored_money(i64::MAX as u64), Ok(i64::MAX));
        assert_eq!(
            mirrored_money(i64::MAX as u64 + 1),
            Err(StatusCode::BAD_REQUEST)
        );
        assert_eq!(mirrored_money(u64::MAX), Err(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn subscriptions_cover_user_and_product_topics() {
        let subscriptions =
            futures::executor::block_on(list_topic_subscriptions()).unwrap().0;
        let topics: Vec<String> = subscriptions
            .into_iter()
            .map(|subscription| subscription.topic)
            .collect();
        assert!(topics.contains(&"user/user/created".to_string()));
        assert!(topics.contains(&"user/user/updated".to_string()));
        assert!(topics.contains(&"catalog/product/created".to_string()));
        assert!(topics.contains(&"catalog/product/updated".to_string()));
    }
}
