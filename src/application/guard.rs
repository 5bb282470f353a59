//! Role and tenant checks, run once at the start of every order operation.
//!
//! Staff (`waiter`, `cook`, `establishment_admin`) are confined to the
//! establishment on their session; `general_admin` is unrestricted; clients
//! may order anywhere but only ever see their own orders.

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderFilters};
use crate::domain::session::{Role, SessionContext};

/// Rejects staff acting outside their own establishment.
pub fn authorize_establishment(
    session: &SessionContext,
    establishment_id: i32,
) -> Result<(), DomainError> {
    if !session.role.is_establishment_staff()
        || session.establishment_id == Some(establishment_id)
    {
        return Ok(());
    }
    log::warn!(
        "user {} ({}) denied access to establishment {}",
        session.user_id,
        session.role,
        establishment_id
    );
    Err(DomainError::Forbidden)
}

pub fn authorize_create(
    session: &SessionContext,
    establishment_id: i32,
) -> Result<(), DomainError> {
    authorize_establishment(session, establishment_id)
}

/// Clients may read only orders they created. A foreign order is reported
/// as missing so its existence is not disclosed.
pub fn authorize_read(session: &SessionContext, order: &Order) -> Result<(), DomainError> {
    authorize_establishment(session, order.establishment_id)?;
    if session.role == Role::Client && order.client_id != Some(session.user_id) {
        return Err(DomainError::order_not_found());
    }
    Ok(())
}

/// Returns the filters the caller is allowed to run; clients are narrowed to
/// their own orders.
pub fn authorize_list(
    session: &SessionContext,
    establishment_id: i32,
    mut filters: OrderFilters,
) -> Result<OrderFilters, DomainError> {
    authorize_establishment(session, establishment_id)?;
    if session.role == Role::Client {
        filters.client_id = Some(session.user_id);
    }
    Ok(filters)
}

pub fn authorize_transition(
    session: &SessionContext,
    establishment_id: i32,
) -> Result<(), DomainError> {
    if !session.role.may_transition_orders() {
        log::warn!(
            "client {} attempted to change an order status",
            session.user_id
        );
        return Err(DomainError::Forbidden);
    }
    authorize_establishment(session, establishment_id)
}
