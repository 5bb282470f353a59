use std::sync::Arc;

use super::catalog::VariantSnapshot;
use super::errors::DomainError;
use super::order::{
    ListResult, NewOrder, NewOrderItem, NewStatusHistory, Order, OrderFilters,
};
use super::session::SessionContext;
use super::status::OrderStatus;

pub trait OrderRepository: Send + Sync + 'static {
    /// Persists the order, its items and the initial history row in one unit.
    fn insert_order_with_items_and_history(
        &self,
        order: NewOrder,
        items: Vec<NewOrderItem>,
        initial_history: NewStatusHistory,
    ) -> Result<Order, DomainError>;

    fn find_order_by_id(
        &self,
        order_id: i32,
        establishment_id: i32,
    ) -> Result<Option<Order>, DomainError>;

    fn find_orders_by_establishment(
        &self,
        establishment_id: i32,
        filters: &OrderFilters,
    ) -> Result<ListResult, DomainError>;

    /// Moves the order from `expected` to `history.status` and appends
    /// `history`, atomically. Fails with [`DomainError::ConcurrencyConflict`]
    /// when the stored status is no longer `expected`.
    fn update_status_and_append_history(
        &self,
        order_id: i32,
        establishment_id: i32,
        expected: OrderStatus,
        history: NewStatusHistory,
    ) -> Result<Order, DomainError>;
}

pub trait CatalogStore: Send + Sync + 'static {
    fn get_variant(&self, variant_id: i32) -> Result<Option<VariantSnapshot>, DomainError>;
}

/// Maps an opaque session token issued by the identity provider to a caller.
pub trait SessionResolver: Send + Sync + 'static {
    fn resolve(&self, token: &str) -> Result<SessionContext, DomainError>;
}

impl<T: OrderRepository + ?Sized> OrderRepository for Arc<T> {
    fn insert_order_with_items_and_history(
        &self,
        order: NewOrder,
        items: Vec<NewOrderItem>,
        initial_history: NewStatusHistory,
    ) -> Result<Order, DomainError> {
        (**self).insert_order_with_items_and_history(order, items, initial_history)
    }

    fn find_order_by_id(
        &self,
        order_id: i32,
        establishment_id: i32,
    ) -> Result<Option<Order>, DomainError> {
        (**self).find_order_by_id(order_id, establishment_id)
    }

    fn find_orders_by_establishment(
        &self,
        establishment_id: i32,
        filters: &OrderFilters,
    ) -> Result<ListResult, DomainError> {
        (**self).find_orders_by_establishment(establishment_id, filters)
    }

    fn update_status_and_append_history(
        &self,
        order_id: i32,
        establishment_id: i32,
        expected: OrderStatus,
        history: NewStatusHistory,
    ) -> Result<Order, DomainError> {
        (**self).update_status_and_append_history(order_id, establishment_id, expected, history)
    }
}

impl<T: CatalogStore + ?Sized> CatalogStore for Arc<T> {
    fn get_variant(&self, variant_id: i32) -> Result<Option<VariantSnapshot>, DomainError> {
        (**self).get_variant(variant_id)
    }
}

impl<T: SessionResolver + ?Sized> SessionResolver for Arc<T> {
    fn resolve(&self, token: &str) -> Result<SessionContext, DomainError> {
        (**self).resolve(token)
    }
}
