//! Process-local implementations of the ports, for tests and harnesses that
//! drive the engine without a database. They honour the same atomicity and
//! compare-and-swap contract as the Diesel adapters.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, RwLock};

use bigdecimal::BigDecimal;

use crate::domain::catalog::VariantSnapshot;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    ListResult, NewOrder, NewOrderItem, NewStatusHistory, Order, OrderFilters, OrderItem,
    StatusHistoryEntry,
};
use crate::domain::ports::{CatalogStore, OrderRepository, SessionResolver};
use crate::domain::session::SessionContext;
use crate::domain::status::{ItemStatus, OrderStatus};

fn poisoned(what: &str) -> DomainError {
    DomainError::Internal(format!("{what} lock poisoned"))
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct OrderTables {
    last_order_id: i32,
    last_item_id: i32,
    last_history_id: i32,
    orders: BTreeMap<i32, Order>,
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    tables: Mutex<OrderTables>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, OrderTables>, DomainError> {
        self.tables.lock().map_err(|_| poisoned("order store"))
    }
}

impl OrderTables {
    fn append_history(&mut self, order_id: i32, history: NewStatusHistory) -> StatusHistoryEntry {
        self.last_history_id += 1;
        StatusHistoryEntry {
            id: self.last_history_id,
            order_id,
            status: history.status,
            changed_by_user_id: history.changed_by_user_id,
            changed_at: history.changed_at,
            notes: history.notes,
        }
    }
}

fn matches_filters(order: &Order, filters: &OrderFilters) -> bool {
    filters.status.map_or(true, |s| order.status == s)
        && filters.created_from.map_or(true, |from| order.created_at >= from)
        && filters.created_to.map_or(true, |to| order.created_at <= to)
        && filters
            .client_id
            .map_or(true, |client| order.client_id == Some(client))
}

impl OrderRepository for InMemoryOrderRepository {
    fn insert_order_with_items_and_history(
        &self,
        order: NewOrder,
        items: Vec<NewOrderItem>,
        initial_history: NewStatusHistory,
    ) -> Result<Order, DomainError> {
        let mut tables = self.lock()?;

        let order_id = tables.last_order_id + 1;
        let created_at = order.created_at;
        let items = items
            .into_iter()
            .enumerate()
            .map(|(offset, item)| OrderItem {
                id: tables.last_item_id + 1 + offset as i32,
                order_id,
                variant_id: item.variant_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                item_total_price: item.item_total_price,
                status: item.status,
                notes: item.notes,
                created_at,
            })
            .collect::<Vec<_>>();

        tables.last_order_id = order_id;
        tables.last_item_id += items.len() as i32;
        let first_entry = tables.append_history(order_id, initial_history);

        let stored = Order {
            id: order_id,
            establishment_id: order.establishment_id,
            client_id: order.client_id,
            waiter_id: order.waiter_id,
            table_number: order.table_number,
            status: order.status,
            total_amount: order.total_amount,
            payment_method: order.payment_method,
            payment_status: order.payment_status,
            order_type: order.order_type,
            notes: order.notes,
            created_at,
            updated_at: created_at,
            items,
            history: vec![first_entry],
        };
        tables.orders.insert(order_id, stored.clone());
        Ok(stored)
    }

    fn find_order_by_id(
        &self,
        order_id: i32,
        establishment_id: i32,
    ) -> Result<Option<Order>, DomainError> {
        let tables = self.lock()?;
        Ok(tables
            .orders
            .get(&order_id)
            .filter(|o| o.establishment_id == establishment_id)
            .cloned())
    }

    fn find_orders_by_establishment(
        &self,
        establishment_id: i32,
        filters: &OrderFilters,
    ) -> Result<ListResult, DomainError> {
        let tables = self.lock()?;

        // Ids grow with creation time, so reverse id order is newest first.
        let matching: Vec<&Order> = tables
            .orders
            .values()
            .rev()
            .filter(|o| o.establishment_id == establishment_id && matches_filters(o, filters))
            .collect();

        Ok(ListResult {
            total: matching.len() as i64,
            page: filters.page,
            limit: filters.limit,
            items: matching
                .into_iter()
                .skip(filters.offset() as usize)
                .take(filters.limit as usize)
                .cloned()
                .collect(),
        })
    }

    fn update_status_and_append_history(
        &self,
        order_id: i32,
        establishment_id: i32,
        expected: OrderStatus,
        history: NewStatusHistory,
    ) -> Result<Order, DomainError> {
        let mut tables = self.lock()?;

        let still_expected = tables
            .orders
            .get(&order_id)
            .is_some_and(|o| o.establishment_id == establishment_id && o.status == expected);
        if !still_expected {
            return Err(DomainError::ConcurrencyConflict { order_id, expected });
        }

        let new_status = history.status;
        let changed_at = history.changed_at;
        let entry = tables.append_history(order_id, history);
        let order = tables
            .orders
            .get_mut(&order_id)
            .ok_or_else(DomainError::order_not_found)?;

        order.status = new_status;
        order.updated_at = changed_at;
        if let Some(item_status) = new_status.item_status() {
            for item in order
                .items
                .iter_mut()
                .filter(|i| i.status != ItemStatus::Cancelled)
            {
                item.status = item_status;
            }
        }
        order.history.push(entry);
        Ok(order.clone())
    }
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryCatalog {
    variants: RwLock<HashMap<i32, VariantSnapshot>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_variant(&self, variant: VariantSnapshot) -> Result<(), DomainError> {
        let mut variants = self.variants.write().map_err(|_| poisoned("catalog"))?;
        variants.insert(variant.variant_id, variant);
        Ok(())
    }

    /// Menu edit; existing order items keep their snapshot.
    pub fn set_price(&self, variant_id: i32, price: BigDecimal) -> Result<(), DomainError> {
        let mut variants = self.variants.write().map_err(|_| poisoned("catalog"))?;
        let variant = variants
            .get_mut(&variant_id)
            .ok_or(DomainError::NotFound("Variant"))?;
        variant.price = price;
        Ok(())
    }
}

impl CatalogStore for InMemoryCatalog {
    fn get_variant(&self, variant_id: i32) -> Result<Option<VariantSnapshot>, DomainError> {
        let variants = self.variants.read().map_err(|_| poisoned("catalog"))?;
        Ok(variants.get(&variant_id).cloned())
    }
}

// ── Sessions ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionContext>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        token: impl Into<String>,
        session: SessionContext,
    ) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned("session store"))?;
        sessions.insert(token.into(), session);
        Ok(())
    }
}

impl SessionResolver for InMemorySessionStore {
    fn resolve(&self, token: &str) -> Result<SessionContext, DomainError> {
        let sessions = self.sessions.read().map_err(|_| poisoned("session store"))?;
        sessions
            .get(token)
            .cloned()
            .ok_or(DomainError::Unauthenticated)
    }
}
