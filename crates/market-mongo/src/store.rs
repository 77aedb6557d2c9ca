//! # MongoDB Store
//!
//! `MarketStore` over a MongoDB database. One client is shared by every
//! request; the driver pools connections underneath.

use crate::convert::{bson_id, decode_all, from_document, id_filter, object_id, to_document};
use async_trait::async_trait;
use futures::TryStreamExt;
use market_core::{
    collections, DeleteOutcome, InsertOutcome, MarketError, MarketResult, MarketStore, Order,
    Payment, Review, Role, ShippingStatus, Tool, ToolUpdate, UpdateOutcome, User, UserProfile,
};
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection, Database};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, instrument};

fn db_error(err: mongodb::error::Error) -> MarketError {
    MarketError::Database(err.to_string())
}

/// MongoDB-backed document store
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect, select `db_name` and ping the server once
    pub async fn connect(uri: &str, db_name: &str) -> MarketResult<Self> {
        let client = Client::with_uri_str(uri).await.map_err(db_error)?;
        let db = client.database(db_name);

        db.run_command(doc! { "ping": 1 }).await.map_err(db_error)?;
        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self { db })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    async fn find_many<T: DeserializeOwned>(
        &self,
        name: &str,
        filter: Document,
    ) -> MarketResult<Vec<T>> {
        let cursor = self.collection(name).find(filter).await.map_err(db_error)?;
        let documents: Vec<Document> = cursor.try_collect().await.map_err(db_error)?;
        debug!("Fetched {} documents from {}", documents.len(), name);
        Ok(decode_all(name, documents))
    }

    async fn find_one<T: DeserializeOwned>(
        &self,
        name: &str,
        filter: Document,
    ) -> MarketResult<Option<T>> {
        self.collection(name)
            .find_one(filter)
            .await
            .map_err(db_error)?
            .map(from_document)
            .transpose()
    }

    async fn insert<T: Serialize>(&self, name: &str, record: &T) -> MarketResult<InsertOutcome> {
        let result = self
            .collection(name)
            .insert_one(to_document(record)?)
            .await
            .map_err(db_error)?;
        Ok(InsertOutcome::new(bson_id(&result.inserted_id)))
    }

    async fn update(
        &self,
        name: &str,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> MarketResult<UpdateOutcome> {
        let result = self
            .collection(name)
            .update_one(filter, update)
            .upsert(upsert)
            .await
            .map_err(db_error)?;
        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id.as_ref().map(bson_id),
        })
    }

    async fn delete(&self, name: &str, filter: Document) -> MarketResult<DeleteOutcome> {
        let result = self
            .collection(name)
            .delete_one(filter)
            .await
            .map_err(db_error)?;
        Ok(DeleteOutcome::new(result.deleted_count))
    }
}

#[async_trait]
impl MarketStore for MongoStore {
    fn backend_name(&self) -> &'static str {
        "mongodb"
    }

    async fn list_tools(&self) -> MarketResult<Vec<Tool>> {
        self.find_many(collections::TOOLS, doc! {}).await
    }

    async fn find_tool(&self, id: &str) -> MarketResult<Option<Tool>> {
        self.find_one(collections::TOOLS, id_filter(id)?).await
    }

    #[instrument(skip(self, tool), fields(name = %tool.name))]
    async fn insert_tool(&self, tool: Tool) -> MarketResult<InsertOutcome> {
        self.insert(collections::TOOLS, &tool).await
    }

    #[instrument(skip(self, update))]
    async fn update_tool(&self, id: &str, update: ToolUpdate) -> MarketResult<UpdateOutcome> {
        let set = to_document(&update)?;
        self.update(collections::TOOLS, id_filter(id)?, doc! { "$set": set }, false)
            .await
    }

    #[instrument(skip(self))]
    async fn delete_tool(&self, id: &str) -> MarketResult<DeleteOutcome> {
        self.delete(collections::TOOLS, id_filter(id)?).await
    }

    async fn list_orders(&self) -> MarketResult<Vec<Order>> {
        self.find_many(collections::ORDERS, doc! {}).await
    }

    async fn orders_for(&self, email: &str) -> MarketResult<Vec<Order>> {
        self.find_many(collections::ORDERS, doc! { "email": email })
            .await
    }

    async fn find_order(&self, id: &str) -> MarketResult<Option<Order>> {
        self.find_one(collections::ORDERS, id_filter(id)?).await
    }

    #[instrument(skip(self, order), fields(email = %order.email))]
    async fn insert_order(&self, order: Order) -> MarketResult<InsertOutcome> {
        self.insert(collections::ORDERS, &order).await
    }

    #[instrument(skip(self))]
    async fn set_order_status(
        &self,
        id: &str,
        status: ShippingStatus,
    ) -> MarketResult<UpdateOutcome> {
        self.update(
            collections::ORDERS,
            id_filter(id)?,
            doc! { "$set": { "status": status.as_str() } },
            false,
        )
        .await
    }

    #[instrument(skip(self, payment), fields(transaction_id = %payment.transaction_id))]
    async fn confirm_payment(
        &self,
        order_id: &str,
        payment: Payment,
    ) -> MarketResult<UpdateOutcome> {
        let filter = doc! { "_id": object_id(order_id)? };
        let transaction_id = payment.transaction_id.clone();

        self.insert(collections::PAYMENTS, &payment).await?;
        self.update(
            collections::ORDERS,
            filter,
            doc! { "$set": { "paid": true, "transactionId": transaction_id } },
            false,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn delete_order(&self, id: &str) -> MarketResult<DeleteOutcome> {
        self.delete(collections::ORDERS, id_filter(id)?).await
    }

    async fn list_reviews(&self) -> MarketResult<Vec<Review>> {
        self.find_many(collections::REVIEWS, doc! {}).await
    }

    async fn insert_review(&self, review: Review) -> MarketResult<InsertOutcome> {
        self.insert(collections::REVIEWS, &review).await
    }

    async fn list_users(&self) -> MarketResult<Vec<User>> {
        self.find_many(collections::USERS, doc! {}).await
    }

    async fn find_user(&self, email: &str) -> MarketResult<Option<User>> {
        self.find_one(collections::USERS, doc! { "email": email })
            .await
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn insert_user(&self, user: User) -> MarketResult<InsertOutcome> {
        self.insert(collections::USERS, &user).await
    }

    #[instrument(skip(self, profile))]
    async fn upsert_profile(
        &self,
        email: &str,
        profile: UserProfile,
    ) -> MarketResult<UpdateOutcome> {
        let set = to_document(&profile)?;
        self.update(
            collections::USERS,
            doc! { "email": email },
            doc! { "$set": set, "$setOnInsert": { "role": Role::User.as_str() } },
            true,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn set_role(&self, email: &str, role: Role) -> MarketResult<UpdateOutcome> {
        self.update(
            collections::USERS,
            doc! { "email": email },
            doc! { "$set": { "role": role.as_str() } },
            false,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::{PaymentConfirmation, UserProfile};

    // Needs a live server: MONGODB_TEST_URI=mongodb://localhost:27017 cargo test -- --ignored
    async fn test_store() -> MongoStore {
        let uri = std::env::var("MONGODB_TEST_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let store = MongoStore::connect(&uri, "toolsMarketplaceTest").await.unwrap();
        store.db.drop().await.unwrap();
        store
    }

    #[tokio::test]
    #[ignore]
    async fn test_tool_round_trip() {
        let store = test_store().await;
        let inserted = store
            .insert_tool(Tool::new("Bench Grinder", 89.0, 4).with_supplier("Acme"))
            .await
            .unwrap();

        let tool = store.find_tool(&inserted.inserted_id).await.unwrap().unwrap();
        assert_eq!(tool.id.as_deref(), Some(inserted.inserted_id.as_str()));
        assert_eq!(tool.supplier.as_deref(), Some("Acme"));

        let update = ToolUpdate {
            quantity: Some(1),
            ..Default::default()
        };
        let outcome = store.update_tool(&inserted.inserted_id, update).await.unwrap();
        assert_eq!((outcome.matched_count, outcome.modified_count), (1, 1));

        let deleted = store.delete_tool(&inserted.inserted_id).await.unwrap();
        assert_eq!(deleted.deleted_count, 1);
        assert!(store.find_tool("not-an-object-id").await.is_err());
    }

    #[tokio::test]
    #[ignore]
    async fn test_profile_upsert_and_payment() {
        let store = test_store().await;

        let outcome = store
            .upsert_profile(
                "new@tools.test",
                UserProfile {
                    name: Some("New".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(outcome.upserted_id.is_some());
        assert!(!store.is_admin("new@tools.test").await.unwrap());

        let order = market_core::NewOrder {
            email: None,
            name: None,
            tool_id: "t-1".to_string(),
            tool_name: None,
            quantity: 1,
            total_price: 10.0,
        }
        .into_order("new@tools.test")
        .unwrap();
        let placed = store.insert_order(order).await.unwrap();

        let payment = PaymentConfirmation {
            transaction_id: "pi_1".to_string(),
            amount: Some(10.0),
        }
        .into_payment(&placed.inserted_id, "new@tools.test")
        .unwrap();
        store
            .confirm_payment(&placed.inserted_id, payment)
            .await
            .unwrap();

        let order = store.find_order(&placed.inserted_id).await.unwrap().unwrap();
        assert!(order.paid);
        assert_eq!(order.transaction_id.as_deref(), Some("pi_1"));
    }
}
