//! Order and item status literals plus the order state machine.

use super::errors::DomainError;

text_enum! {
    pub enum OrderStatus as "order status" {
        Pending => "PENDING",
        Preparing => "PREPARING",
        Ready => "READY",
        Delivered => "DELIVERED",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

text_enum! {
    /// Per-item kitchen progress.
    pub enum ItemStatus as "item status" {
        Pending => "PENDING",
        Preparing => "PREPARING",
        Ready => "READY",
        Delivered => "DELIVERED",
        Cancelled => "CANCELLED",
    }
}

text_enum! {
    pub enum OrderType as "order type" {
        DineIn => "DINE_IN",
        Takeaway => "TAKEAWAY",
        Delivery => "DELIVERY",
    }
}

text_enum! {
    pub enum PaymentMethod as "payment method" {
        Cash => "CASH",
        Card => "CARD",
        Online => "ONLINE",
    }
}

text_enum! {
    pub enum PaymentStatus as "payment status" {
        Pending => "PENDING",
        Paid => "PAID",
        Refunded => "REFUNDED",
    }
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Statuses reachable from `self` in one step.
    pub fn allowed_next(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Preparing, Cancelled],
            Preparing => &[Ready, Cancelled],
            Ready => &[Delivered, Cancelled],
            Delivered => &[Completed],
            Completed | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Item status copied onto non-cancelled items when the order enters
    /// `self`. `None` leaves items untouched.
    pub fn item_status(self) -> Option<ItemStatus> {
        match self {
            OrderStatus::Pending | OrderStatus::Completed => None,
            OrderStatus::Preparing => Some(ItemStatus::Preparing),
            OrderStatus::Ready => Some(ItemStatus::Ready),
            OrderStatus::Delivered => Some(ItemStatus::Delivered),
            OrderStatus::Cancelled => Some(ItemStatus::Cancelled),
        }
    }
}

pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> Result<(), DomainError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(DomainError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn happy_path_transitions() {
        assert!(validate_transition(OrderStatus::Pending, OrderStatus::Preparing).is_ok());
        assert!(validate_transition(OrderStatus::Preparing, OrderStatus::Ready).is_ok());
        assert!(validate_transition(OrderStatus::Ready, OrderStatus::Delivered).is_ok());
        assert!(validate_transition(OrderStatus::Delivered, OrderStatus::Completed).is_ok());
    }

    #[test]
    fn cancellation_allowed_before_delivery() {
        assert!(validate_transition(OrderStatus::Pending, OrderStatus::Cancelled).is_ok());
        assert!(validate_transition(OrderStatus::Preparing, OrderStatus::Cancelled).is_ok());
        assert!(validate_transition(OrderStatus::Ready, OrderStatus::Cancelled).is_ok());
        assert!(validate_transition(OrderStatus::Delivered, OrderStatus::Cancelled).is_err());
    }

    #[test]
    fn self_transitions_are_rejected() {
        for &status in OrderStatus::ALL {
            assert!(
                validate_transition(status, status).is_err(),
                "{status} -> {status} must be rejected"
            );
        }
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for &from in [OrderStatus::Completed, OrderStatus::Cancelled].iter() {
            assert!(from.is_terminal());
            for &to in OrderStatus::ALL {
                assert!(matches!(
                    validate_transition(from, to),
                    Err(DomainError::InvalidTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn skipping_and_backward_moves_are_rejected() {
        assert!(validate_transition(OrderStatus::Pending, OrderStatus::Ready).is_err());
        assert!(validate_transition(OrderStatus::Preparing, OrderStatus::Delivered).is_err());
        assert!(validate_transition(OrderStatus::Ready, OrderStatus::Preparing).is_err());
        assert!(validate_transition(OrderStatus::Delivered, OrderStatus::Pending).is_err());
    }

    #[test]
    fn literals_round_trip_through_from_str() {
        assert_eq!(OrderStatus::from_str("PREPARING"), Ok(OrderStatus::Preparing));
        assert_eq!(OrderType::from_str("DINE_IN"), Ok(OrderType::DineIn));
        let err = OrderStatus::from_str("preparing").unwrap_err();
        assert_eq!(err.to_string(), "unknown order status `preparing`");
    }

    #[test]
    fn completed_keeps_item_statuses() {
        assert_eq!(OrderStatus::Completed.item_status(), None);
        assert_eq!(OrderStatus::Cancelled.item_status(), Some(ItemStatus::Cancelled));
    }
}
