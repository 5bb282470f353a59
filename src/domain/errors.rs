use thiserror::Error;

use super::status::OrderStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Forbidden")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("order {order_id} is no longer {expected}")]
    ConcurrencyConflict { order_id: i32, expected: OrderStatus },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn order_not_found() -> Self {
        DomainError::NotFound("Order")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_names_the_field() {
        let err = DomainError::validation("items[0].quantity", "must be at least 1");
        assert_eq!(err.to_string(), "invalid items[0].quantity: must be at least 1");
    }

    #[test]
    fn invalid_transition_display_shows_both_statuses() {
        let err = DomainError::InvalidTransition {
            from: OrderStatus::Completed,
            to: OrderStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "cannot change order status from COMPLETED to PENDING"
        );
    }

    #[test]
    fn not_found_names_the_entity() {
        assert_eq!(DomainError::order_not_found().to_string(), "Order not found");
    }
}
