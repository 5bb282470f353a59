use bigdecimal::BigDecimal;
use chrono::Utc;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    price_items, CreateOrder, ListResult, NewOrder, NewStatusHistory, Order, OrderFilters,
    MAX_ITEM_QUANTITY, TOTAL_AMOUNT_CEILING,
};
use crate::domain::ports::{CatalogStore, OrderRepository};
use crate::domain::session::{Role, SessionContext};
use crate::domain::status::{validate_transition, OrderStatus, OrderType, PaymentStatus};

use super::guard;

/// The order lifecycle engine: validates, prices and transitions orders on
/// behalf of an explicit caller.
pub struct OrderService<R, C> {
    repo: R,
    catalog: C,
}

impl<R: OrderRepository, C: CatalogStore> OrderService<R, C> {
    pub fn new(repo: R, catalog: C) -> Self {
        Self { repo, catalog }
    }

    pub fn create_order(
        &self,
        session: &SessionContext,
        input: CreateOrder,
    ) -> Result<Order, DomainError> {
        guard::authorize_create(session, input.establishment_id)?;

        if input.items.is_empty() {
            return Err(DomainError::validation("items", "order must contain at least one item"));
        }

        let mut variants = Vec::with_capacity(input.items.len());
        for (idx, item) in input.items.iter().enumerate() {
            if item.quantity < 1 {
                return Err(DomainError::validation(
                    format!("items[{idx}].quantity"),
                    "must be at least 1",
                ));
            }
            if item.quantity > MAX_ITEM_QUANTITY {
                return Err(DomainError::validation(
                    format!("items[{idx}].quantity"),
                    format!("must be at most {MAX_ITEM_QUANTITY}"),
                ));
            }
            // Unknown and foreign variants are reported identically.
            let variant = self
                .catalog
                .get_variant(item.variant_id)?
                .filter(|v| v.establishment_id == input.establishment_id)
                .ok_or_else(|| {
                    DomainError::validation(
                        format!("items[{idx}].variant_id"),
                        format!("variant {} does not exist", item.variant_id),
                    )
                })?;
            if !variant.is_active {
                return Err(DomainError::validation(
                    format!("items[{idx}].variant_id"),
                    format!("variant {} is not available", item.variant_id),
                ));
            }
            variants.push(variant);
        }

        let (items, total_amount) = price_items(&input.items, &variants);
        // Every line total is bounded by the order total.
        if total_amount >= BigDecimal::from(TOTAL_AMOUNT_CEILING) {
            return Err(DomainError::validation(
                "items",
                format!("order total {total_amount} exceeds the storable maximum"),
            ));
        }

        let client_id = match session.role {
            Role::Client => Some(session.user_id),
            _ => input.client_id,
        };
        let waiter_id = (session.role == Role::Waiter).then_some(session.user_id);
        let order_type = input.order_type.unwrap_or(if input.table_number.is_some() {
            OrderType::DineIn
        } else {
            OrderType::Takeaway
        });
        let now = Utc::now();

        let order = NewOrder {
            establishment_id: input.establishment_id,
            client_id,
            waiter_id,
            table_number: input.table_number,
            status: OrderStatus::Pending,
            total_amount,
            payment_method: input.payment_method,
            payment_status: input.payment_method.map(|_| PaymentStatus::Pending),
            order_type,
            notes: input.notes,
            created_at: now,
        };
        let initial_history = NewStatusHistory {
            status: OrderStatus::Pending,
            changed_by_user_id: client_id,
            changed_at: now,
            notes: Some("Order created".to_string()),
        };

        let created = self
            .repo
            .insert_order_with_items_and_history(order, items, initial_history)?;
        log::info!(
            "order {} created in establishment {} by {} (total {})",
            created.id,
            created.establishment_id,
            session.actor_label(),
            created.total_amount
        );
        Ok(created)
    }

    pub fn get_order(
        &self,
        session: &SessionContext,
        order_id: i32,
        establishment_id: i32,
    ) -> Result<Order, DomainError> {
        guard::authorize_establishment(session, establishment_id)?;
        let order = self
            .repo
            .find_order_by_id(order_id, establishment_id)?
            .ok_or_else(DomainError::order_not_found)?;
        guard::authorize_read(session, &order)?;
        Ok(order)
    }

    pub fn list_orders(
        &self,
        session: &SessionContext,
        establishment_id: i32,
        filters: OrderFilters,
    ) -> Result<ListResult, DomainError> {
        let filters = guard::authorize_list(session, establishment_id, filters)?.normalized()?;
        self.repo
            .find_orders_by_establishment(establishment_id, &filters)
    }

    /// Moves an order one step along its lifecycle.
    ///
    /// The current status is re-read here and passed to the repository as
    /// the expected value, so a concurrent transition that lands first turns
    /// this call into a [`DomainError::ConcurrencyConflict`].
    pub fn transition_status(
        &self,
        session: &SessionContext,
        order_id: i32,
        establishment_id: i32,
        new_status: OrderStatus,
        notes: Option<String>,
    ) -> Result<Order, DomainError> {
        self.apply_transition(session, order_id, establishment_id, None, new_status, notes)
    }

    /// Like [`transition_status`](Self::transition_status), but only if the
    /// order is still in `expected`, the status the caller last observed.
    /// Otherwise fails with [`DomainError::ConcurrencyConflict`].
    pub fn transition_status_if(
        &self,
        session: &SessionContext,
        order_id: i32,
        establishment_id: i32,
        expected: OrderStatus,
        new_status: OrderStatus,
        notes: Option<String>,
    ) -> Result<Order, DomainError> {
        self.apply_transition(
            session,
            order_id,
            establishment_id,
            Some(expected),
            new_status,
            notes,
        )
    }

    fn apply_transition(
        &self,
        session: &SessionContext,
        order_id: i32,
        establishment_id: i32,
        expected: Option<OrderStatus>,
        new_status: OrderStatus,
        notes: Option<String>,
    ) -> Result<Order, DomainError> {
        guard::authorize_transition(session, establishment_id)?;

        let current = self
            .repo
            .find_order_by_id(order_id, establishment_id)?
            .ok_or_else(DomainError::order_not_found)?;

        if let Some(expected) = expected.filter(|&e| e != current.status) {
            log::warn!(
                "order {} is {} but the caller expected {}",
                order_id,
                current.status,
                expected
            );
            return Err(DomainError::ConcurrencyConflict { order_id, expected });
        }

        if let Err(err) = validate_transition(current.status, new_status) {
            log::warn!(
                "rejected transition of order {} from {} to {}",
                order_id,
                current.status,
                new_status
            );
            return Err(err);
        }

        // Clock skew must not reorder the history.
        let changed_at = Utc::now().max(current.updated_at);
        let notes = notes.unwrap_or_else(|| {
            format!("Status changed to {} by {}", new_status, session.actor_label())
        });
        let history = NewStatusHistory {
            status: new_status,
            changed_by_user_id: Some(session.user_id),
            changed_at,
            notes: Some(notes),
        };

        let updated = self.repo.update_status_and_append_history(
            order_id,
            establishment_id,
            current.status,
            history,
        )?;
        log::info!(
            "order {} moved {} -> {} by {}",
            order_id,
            current.status,
            new_status,
            session.actor_label()
        );
        Ok(updated)
    }
}
