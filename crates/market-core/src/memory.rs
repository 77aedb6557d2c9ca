//! # In-Memory Store
//!
//! `MarketStore` backed by process memory. Used for local runs without a
//! database (`STORE_BACKEND=memory`) and for HTTP tests.
//! Updates follow `$set` semantics: a field counts as modified only when its
//! value actually changes.

use crate::error::{MarketError, MarketResult};
use crate::order::{Order, Payment, ShippingStatus};
use crate::review::Review;
use crate::store::{DeleteOutcome, InsertOutcome, MarketStore, UpdateOutcome};
use crate::tool::{Tool, ToolUpdate};
use crate::user::{Role, User, UserProfile};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Collections {
    tools: Vec<Tool>,
    orders: Vec<Order>,
    reviews: Vec<Review>,
    users: Vec<User>,
    payments: Vec<Payment>,
}

/// Process-local document store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: seed a user (tests and local admin bootstrap)
    pub fn with_user(self, mut user: User) -> Self {
        user.id.get_or_insert_with(next_id);
        self.seed().users.push(user);
        self
    }

    /// Builder: seed a tool
    pub fn with_tool(self, mut tool: Tool) -> Self {
        tool.id.get_or_insert_with(next_id);
        self.seed().tools.push(tool);
        self
    }

    /// Seeding writes through a poisoned lock rather than dropping the record
    fn seed(&self) -> RwLockWriteGuard<'_, Collections> {
        self.inner.write().unwrap_or_else(|poisoned| {
            warn!("memory store lock poisoned while seeding, recovering");
            poisoned.into_inner()
        })
    }

    /// Snapshot of appended payment records
    pub fn payments(&self) -> MarketResult<Vec<Payment>> {
        Ok(self.read()?.payments.clone())
    }

    fn read(&self) -> MarketResult<RwLockReadGuard<'_, Collections>> {
        self.inner
            .read()
            .map_err(|_| MarketError::Internal("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> MarketResult<RwLockWriteGuard<'_, Collections>> {
        self.inner
            .write()
            .map_err(|_| MarketError::Internal("memory store lock poisoned".to_string()))
    }
}

fn next_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Merge the serialized fields of `changes` into `record`.
/// Returns whether any stored value changed.
fn apply_set<T, U>(record: &mut T, changes: &U) -> MarketResult<bool>
where
    T: Serialize + DeserializeOwned,
    U: Serialize,
{
    let mut current = serde_json::to_value(&*record)?;
    let changes = serde_json::to_value(changes)?;

    let (Value::Object(fields), Value::Object(changes)) = (&mut current, changes) else {
        return Err(MarketError::Internal(
            "update target is not a document".to_string(),
        ));
    };

    let mut modified = false;
    for (key, value) in changes {
        if fields.get(&key) != Some(&value) {
            fields.insert(key, value);
            modified = true;
        }
    }

    if modified {
        *record = serde_json::from_value(current)?;
    }
    Ok(modified)
}

fn update_where<T, U>(
    records: &mut [T],
    matches: impl Fn(&T) -> bool,
    changes: &U,
) -> MarketResult<UpdateOutcome>
where
    T: Serialize + DeserializeOwned,
    U: Serialize,
{
    match records.iter_mut().find(|r| matches(r)) {
        Some(record) => {
            let modified = apply_set(record, changes)?;
            Ok(UpdateOutcome::new(1, u64::from(modified)))
        }
        None => Ok(UpdateOutcome::new(0, 0)),
    }
}

fn delete_where<T>(records: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> DeleteOutcome {
    match records.iter().position(matches) {
        Some(index) => {
            records.remove(index);
            DeleteOutcome::new(1)
        }
        None => DeleteOutcome::new(0),
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn list_tools(&self) -> MarketResult<Vec<Tool>> {
        Ok(self.read()?.tools.clone())
    }

    async fn find_tool(&self, id: &str) -> MarketResult<Option<Tool>> {
        Ok(self
            .read()?
            .tools
            .iter()
            .find(|t| t.id.as_deref() == Some(id))
            .cloned())
    }

    async fn insert_tool(&self, mut tool: Tool) -> MarketResult<InsertOutcome> {
        let id = next_id();
        tool.id = Some(id.clone());
        self.write()?.tools.push(tool);
        debug!("Inserted tool {}", id);
        Ok(InsertOutcome::new(id))
    }

    async fn update_tool(&self, id: &str, update: ToolUpdate) -> MarketResult<UpdateOutcome> {
        let mut collections = self.write()?;
        update_where(&mut collections.tools, |t| t.id.as_deref() == Some(id), &update)
    }

    async fn delete_tool(&self, id: &str) -> MarketResult<DeleteOutcome> {
        let mut collections = self.write()?;
        Ok(delete_where(&mut collections.tools, |t| {
            t.id.as_deref() == Some(id)
        }))
    }

    async fn list_orders(&self) -> MarketResult<Vec<Order>> {
        Ok(self.read()?.orders.clone())
    }

    async fn orders_for(&self, email: &str) -> MarketResult<Vec<Order>> {
        Ok(self
            .read()?
            .orders
            .iter()
            .filter(|o| o.email == email)
            .cloned()
            .collect())
    }

    async fn find_order(&self, id: &str) -> MarketResult<Option<Order>> {
        Ok(self
            .read()?
            .orders
            .iter()
            .find(|o| o.id.as_deref() == Some(id))
            .cloned())
    }

    async fn insert_order(&self, mut order: Order) -> MarketResult<InsertOutcome> {
        let id = next_id();
        order.id = Some(id.clone());
        self.write()?.orders.push(order);
        Ok(InsertOutcome::new(id))
    }

    async fn set_order_status(
        &self,
        id: &str,
        status: ShippingStatus,
    ) -> MarketResult<UpdateOutcome> {
        let mut collections = self.write()?;
        update_where(
            &mut collections.orders,
            |o| o.id.as_deref() == Some(id),
            &json!({ "status": status }),
        )
    }

    async fn confirm_payment(
        &self,
        order_id: &str,
        mut payment: Payment,
    ) -> MarketResult<UpdateOutcome> {
        let mut collections = self.write()?;
        let changes = json!({ "paid": true, "transactionId": payment.transaction_id });

        payment.id = Some(next_id());
        collections.payments.push(payment);

        update_where(
            &mut collections.orders,
            |o| o.id.as_deref() == Some(order_id),
            &changes,
        )
    }

    async fn delete_order(&self, id: &str) -> MarketResult<DeleteOutcome> {
        let mut collections = self.write()?;
        Ok(delete_where(&mut collections.orders, |o| {
            o.id.as_deref() == Some(id)
        }))
    }

    async fn list_reviews(&self) -> MarketResult<Vec<Review>> {
        Ok(self.read()?.reviews.clone())
    }

    async fn insert_review(&self, mut review: Review) -> MarketResult<InsertOutcome> {
        let id = next_id();
        review.id = Some(id.clone());
        self.write()?.reviews.push(review);
        Ok(InsertOutcome::new(id))
    }

    async fn list_users(&self) -> MarketResult<Vec<User>> {
        Ok(self.read()?.users.clone())
    }

    async fn find_user(&self, email: &str) -> MarketResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_user(&self, mut user: User) -> MarketResult<InsertOutcome> {
        let id = next_id();
        user.id = Some(id.clone());
        self.write()?.users.push(user);
        Ok(InsertOutcome::new(id))
    }

    async fn upsert_profile(
        &self,
        email: &str,
        profile: UserProfile,
    ) -> MarketResult<UpdateOutcome> {
        let mut collections = self.write()?;
        if collections.users.iter().any(|u| u.email == email) {
            return update_where(&mut collections.users, |u| u.email == email, &profile);
        }

        let mut user = User::new(email);
        apply_set(&mut user, &profile)?;
        let id = next_id();
        user.id = Some(id.clone());
        collections.users.push(user);
        Ok(UpdateOutcome::upserted(id))
    }

    async fn set_role(&self, email: &str, role: Role) -> MarketResult<UpdateOutcome> {
        let mut collections = self.write()?;
        update_where(
            &mut collections.users,
            |u| u.email == email,
            &json!({ "role": role }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Registration;
    use chrono::Utc;

    fn order_for(email: &str) -> Order {
        Order {
            id: None,
            email: email.to_string(),
            name: None,
            tool_id: "t1".to_string(),
            tool_name: None,
            quantity: 2,
            total_price: 20.0,
            status: ShippingStatus::Pending,
            paid: false,
            transaction_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_seed_survives_poisoned_lock() {
        let store = MemoryStore::new();
        let inner = store.inner.clone();
        let _ = std::thread::spawn(move || {
            let _guard = inner.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(store.inner.is_poisoned());

        let store = store.with_user(User::new("admin@example.com").with_role(Role::Admin));
        let users = store
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .users
            .clone();
        assert_eq!(users.len(), 1);
        assert!(users[0].is_admin());
    }

    #[tokio::test]
    async fn test_tool_crud() {
        let store = MemoryStore::new();
        let inserted = store
            .insert_tool(Tool::new("Saw", 15.0, 10).with_supplier("Acme"))
            .await
            .unwrap();

        let tool = store.find_tool(&inserted.inserted_id).await.unwrap().unwrap();
        assert_eq!(tool.name, "Saw");
        assert_eq!(tool.supplier.as_deref(), Some("Acme"));

        let update = ToolUpdate {
            quantity: Some(4),
            ..Default::default()
        };
        let outcome = store.update_tool(&inserted.inserted_id, update.clone()).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::new(1, 1));

        // Same values again: matched but not modified
        let outcome = store.update_tool(&inserted.inserted_id, update).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::new(1, 0));

        let tool = store.find_tool(&inserted.inserted_id).await.unwrap().unwrap();
        assert_eq!(tool.quantity, 4);
        assert_eq!(tool.name, "Saw");

        let deleted = store.delete_tool(&inserted.inserted_id).await.unwrap();
        assert_eq!(deleted.deleted_count, 1);
        let deleted = store.delete_tool(&inserted.inserted_id).await.unwrap();
        assert_eq!(deleted.deleted_count, 0);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let store = MemoryStore::new();
        let first = store.register_user(User::new("a@b.com")).await.unwrap();
        assert!(matches!(first, Registration::Created(_)));

        let second = store.register_user(User::new("a@b.com")).await.unwrap();
        assert_eq!(second, Registration::AlreadyExists);
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_role_promotion() {
        let store = MemoryStore::new().with_user(User::new("a@b.com"));
        assert!(!store.is_admin("a@b.com").await.unwrap());

        let outcome = store.set_role("a@b.com", Role::Admin).await.unwrap();
        assert_eq!(outcome.modified_count, 1);
        assert!(store.is_admin("a@b.com").await.unwrap());
        assert!(!store.is_admin("missing@b.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_confirm_payment() {
        let store = MemoryStore::new();
        let inserted = store.insert_order(order_for("a@b.com")).await.unwrap();

        let payment = Payment {
            id: None,
            order_id: inserted.inserted_id.clone(),
            transaction_id: "pi_42".to_string(),
            email: Some("a@b.com".to_string()),
            amount: Some(20.0),
            created_at: Utc::now(),
        };
        let outcome = store
            .confirm_payment(&inserted.inserted_id, payment)
            .await
            .unwrap();
        assert_eq!(outcome.matched_count, 1);

        let order = store.find_order(&inserted.inserted_id).await.unwrap().unwrap();
        assert!(order.paid);
        assert_eq!(order.transaction_id.as_deref(), Some("pi_42"));
        assert_eq!(store.payments().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_orders_for_and_status() {
        let store = MemoryStore::new();
        let mine = store.insert_order(order_for("a@b.com")).await.unwrap();
        store.insert_order(order_for("other@b.com")).await.unwrap();

        assert_eq!(store.orders_for("a@b.com").await.unwrap().len(), 1);
        assert_eq!(store.list_orders().await.unwrap().len(), 2);

        store
            .set_order_status(&mine.inserted_id, ShippingStatus::Shipped)
            .await
            .unwrap();
        let order = store.find_order(&mine.inserted_id).await.unwrap().unwrap();
        assert_eq!(order.status, ShippingStatus::Shipped);
    }

    #[tokio::test]
    async fn test_upsert_profile() {
        let store = MemoryStore::new();
        let profile: UserProfile =
            serde_json::from_value(json!({ "name": "Rafi", "location": "Khulna" })).unwrap();

        let outcome = store.upsert_profile("r@b.com", profile.clone()).await.unwrap();
        assert!(outcome.upserted_id.is_some());

        let outcome = store.upsert_profile("r@b.com", profile).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::new(1, 0));

        let user = store.find_user("r@b.com").await.unwrap().unwrap();
        assert_eq!(user.name.as_deref(), Some("Rafi"));
        assert_eq!(user.extra.get("location"), Some(&json!("Khulna")));
        assert_eq!(user.role, Role::User);
    }
}
