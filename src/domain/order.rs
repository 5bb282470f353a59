use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use super::catalog::VariantSnapshot;
use super::errors::DomainError;
use super::status::{ItemStatus, OrderStatus, OrderType, PaymentMethod, PaymentStatus};

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;
/// Keeps `OFFSET` representable for any accepted limit.
pub const MAX_PAGE: i64 = 100_000;

pub const MAX_ITEM_QUANTITY: i32 = 1_000;
/// Order and line totals are stored as `NUMERIC(12, 2)`.
pub const TOTAL_AMOUNT_CEILING: i64 = 10_000_000_000;

// ── Inputs ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub variant_id: i32,
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub establishment_id: i32,
    /// Ignored for client callers, who always order for themselves.
    pub client_id: Option<i32>,
    pub table_number: Option<i32>,
    pub payment_method: Option<PaymentMethod>,
    pub order_type: Option<OrderType>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Clone)]
pub struct OrderFilters {
    pub status: Option<OrderStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub client_id: Option<i32>,
    pub page: i64,
    pub limit: i64,
}

impl Default for OrderFilters {
    fn default() -> Self {
        Self {
            status: None,
            created_from: None,
            created_to: None,
            client_id: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl OrderFilters {
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Clamps the limit and rejects a reversed date range or a page past
    /// [`MAX_PAGE`].
    pub fn normalized(mut self) -> Result<Self, DomainError> {
        if let (Some(from), Some(to)) = (self.created_from, self.created_to) {
            if from > to {
                return Err(DomainError::validation(
                    "date_range",
                    "start must not be after end",
                ));
            }
        }
        if self.page > MAX_PAGE {
            return Err(DomainError::validation(
                "page",
                format!("must be at most {MAX_PAGE}"),
            ));
        }
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_PAGE_LIMIT);
        Ok(self)
    }
}

// ── Records handed to the repository ────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub establishment_id: i32,
    pub client_id: Option<i32>,
    pub waiter_id: Option<i32>,
    pub table_number: Option<i32>,
    pub status: OrderStatus,
    pub total_amount: BigDecimal,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
    pub order_type: OrderType,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub variant_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub item_total_price: BigDecimal,
    pub status: ItemStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewStatusHistory {
    pub status: OrderStatus,
    pub changed_by_user_id: Option<i32>,
    pub changed_at: DateTime<Utc>,
    pub notes: Option<String>,
}

// ── Materialized aggregate ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub variant_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub item_total_price: BigDecimal,
    pub status: ItemStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusHistoryEntry {
    pub id: i32,
    pub order_id: i32,
    pub status: OrderStatus,
    pub changed_by_user_id: Option<i32>,
    pub changed_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i32,
    pub establishment_id: i32,
    pub client_id: Option<i32>,
    pub waiter_id: Option<i32>,
    pub table_number: Option<i32>,
    pub status: OrderStatus,
    pub total_amount: BigDecimal,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
    pub order_type: OrderType,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    /// Ascending by `changed_at`.
    pub history: Vec<StatusHistoryEntry>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<Order>,
    pub total: i64,
    /// The page and limit actually applied.
    pub page: i64,
    pub limit: i64,
}

// ── Pricing ─────────────────────────────────────────────────────────────────

/// Snapshots each variant's current price onto its item and returns the
/// priced items together with their sum.
///
/// `variants[i]` must be the catalog entry for `inputs[i]`.
pub fn price_items(
    inputs: &[OrderItemInput],
    variants: &[VariantSnapshot],
) -> (Vec<NewOrderItem>, BigDecimal) {
    let mut total = BigDecimal::from(0);
    let items = inputs
        .iter()
        .zip(variants)
        .map(|(input, variant)| {
            let unit_price = variant.price.clone();
            let item_total_price = &unit_price * BigDecimal::from(input.quantity);
            total += &item_total_price;
            NewOrderItem {
                variant_id: input.variant_id,
                quantity: input.quantity,
                unit_price,
                item_total_price,
                status: ItemStatus::Pending,
                notes: input.notes.clone(),
            }
        })
        .collect();
    (items, total)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::TimeZone;

    use super::*;

    fn variant(id: i32, price: &str) -> VariantSnapshot {
        VariantSnapshot {
            variant_id: id,
            establishment_id: 1,
            price: BigDecimal::from_str(price).expect("valid decimal"),
            is_active: true,
        }
    }

    fn input(variant_id: i32, quantity: i32) -> OrderItemInput {
        OrderItemInput {
            variant_id,
            quantity,
            notes: None,
        }
    }

    #[test]
    fn total_is_sum_of_unit_price_times_quantity() {
        let (items, total) = price_items(
            &[input(5, 1), input(9, 2)],
            &[variant(5, "10.50"), variant(9, "3.00")],
        );

        assert_eq!(items.len(), 2);
        assert_eq!(items[1].item_total_price, BigDecimal::from_str("6.00").unwrap());
        assert_eq!(total, BigDecimal::from_str("16.50").unwrap());
        assert!(items.iter().all(|i| i.status == ItemStatus::Pending));
    }

    #[test]
    fn decimal_sums_do_not_drift() {
        let inputs: Vec<_> = (0..10).map(|_| input(1, 1)).collect();
        let variants: Vec<_> = (0..10).map(|_| variant(1, "0.10")).collect();
        let (_, total) = price_items(&inputs, &variants);
        assert_eq!(total, BigDecimal::from(1));
    }

    #[test]
    fn filters_clamp_pagination() {
        let filters = OrderFilters {
            page: 0,
            limit: 1_000,
            ..OrderFilters::default()
        }
        .normalized()
        .unwrap();
        assert_eq!(filters.page, 1);
        assert_eq!(filters.limit, MAX_PAGE_LIMIT);
        assert_eq!(filters.offset(), 0);
    }

    #[test]
    fn filters_reject_pages_past_the_last_addressable_one() {
        let huge = OrderFilters {
            page: i64::MAX / 10,
            limit: MAX_PAGE_LIMIT,
            ..OrderFilters::default()
        };
        assert!(matches!(
            huge.normalized(),
            Err(DomainError::Validation { field, .. }) if field == "page"
        ));

        let last = OrderFilters {
            page: MAX_PAGE,
            limit: MAX_PAGE_LIMIT,
            ..OrderFilters::default()
        }
        .normalized()
        .unwrap();
        assert_eq!(last.offset(), (MAX_PAGE - 1) * MAX_PAGE_LIMIT);
    }

    #[test]
    fn offset_saturates_instead_of_overflowing() {
        let filters = OrderFilters {
            page: i64::MAX,
            limit: MAX_PAGE_LIMIT,
            ..OrderFilters::default()
        };
        assert_eq!(filters.offset(), i64::MAX);
    }

    #[test]
    fn filters_reject_reversed_range() {
        let filters = OrderFilters {
            created_from: Some(Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap()),
            created_to: Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
            ..OrderFilters::default()
        };
        assert!(matches!(
            filters.normalized(),
            Err(DomainError::Validation { field, .. }) if field == "date_range"
        ));
    }
}
