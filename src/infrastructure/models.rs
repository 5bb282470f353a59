use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    NewOrder, NewOrderItem, NewStatusHistory, Order, OrderItem, StatusHistoryEntry,
};
use crate::domain::ParseEnumError;
use crate::schema::{order_items, order_status_history, orders};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: i32,
    pub establishment_id: i32,
    pub client_id: Option<i32>,
    pub waiter_id: Option<i32>,
    pub table_number: Option<i32>,
    pub status: String,
    pub total_amount: BigDecimal,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
    pub order_type: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub establishment_id: i32,
    pub client_id: Option<i32>,
    pub waiter_id: Option<i32>,
    pub table_number: Option<i32>,
    pub status: String,
    pub total_amount: BigDecimal,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
    pub order_type: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NewOrder> for NewOrderRow {
    fn from(o: NewOrder) -> Self {
        Self {
            establishment_id: o.establishment_id,
            client_id: o.client_id,
            waiter_id: o.waiter_id,
            table_number: o.table_number,
            status: o.status.to_string(),
            total_amount: o.total_amount,
            payment_method: o.payment_method.map(|m| m.to_string()),
            payment_status: o.payment_status.map(|s| s.to_string()),
            order_type: o.order_type.to_string(),
            notes: o.notes,
            created_at: o.created_at,
            updated_at: o.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: i32,
    pub order_id: i32,
    pub variant_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub item_total_price: BigDecimal,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub order_id: i32,
    pub variant_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub item_total_price: BigDecimal,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewOrderItemRow {
    pub fn new(order_id: i32, created_at: DateTime<Utc>, item: NewOrderItem) -> Self {
        Self {
            order_id,
            variant_id: item.variant_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            item_total_price: item.item_total_price,
            status: item.status.to_string(),
            notes: item.notes,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_status_history)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StatusHistoryRow {
    pub id: i32,
    pub order_id: i32,
    pub status: String,
    pub changed_by_user_id: Option<i32>,
    pub changed_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_status_history)]
pub struct NewStatusHistoryRow {
    pub order_id: i32,
    pub status: String,
    pub changed_by_user_id: Option<i32>,
    pub changed_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl NewStatusHistoryRow {
    pub fn new(order_id: i32, history: NewStatusHistory) -> Self {
        Self {
            order_id,
            status: history.status.to_string(),
            changed_by_user_id: history.changed_by_user_id,
            changed_at: history.changed_at,
            notes: history.notes,
        }
    }
}

// ── Row → domain ─────────────────────────────────────────────────────────────

fn parse<T>(value: &str) -> Result<T, DomainError>
where
    T: FromStr<Err = ParseEnumError>,
{
    value
        .parse()
        .map_err(|e: ParseEnumError| DomainError::Internal(e.to_string()))
}

fn parse_opt<T>(value: Option<&str>) -> Result<Option<T>, DomainError>
where
    T: FromStr<Err = ParseEnumError>,
{
    value.map(parse::<T>).transpose()
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = DomainError;

    fn try_from(r: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(OrderItem {
            id: r.id,
            order_id: r.order_id,
            variant_id: r.variant_id,
            quantity: r.quantity,
            unit_price: r.unit_price,
            item_total_price: r.item_total_price,
            status: parse(&r.status)?,
            notes: r.notes,
            created_at: r.created_at,
        })
    }
}

impl TryFrom<StatusHistoryRow> for StatusHistoryEntry {
    type Error = DomainError;

    fn try_from(r: StatusHistoryRow) -> Result<Self, Self::Error> {
        Ok(StatusHistoryEntry {
            id: r.id,
            order_id: r.order_id,
            status: parse(&r.status)?,
            changed_by_user_id: r.changed_by_user_id,
            changed_at: r.changed_at,
            notes: r.notes,
        })
    }
}

/// Assembles the aggregate from its rows. `history` must already be in
/// ascending `changed_at` order.
pub fn assemble_order(
    order: OrderRow,
    items: Vec<OrderItemRow>,
    history: Vec<StatusHistoryRow>,
) -> Result<Order, DomainError> {
    Ok(Order {
        id: order.id,
        establishment_id: order.establishment_id,
        client_id: order.client_id,
        waiter_id: order.waiter_id,
        table_number: order.table_number,
        status: parse(&order.status)?,
        total_amount: order.total_amount,
        payment_method: parse_opt(order.payment_method.as_deref())?,
        payment_status: parse_opt(order.payment_status.as_deref())?,
        order_type: parse(&order.order_type)?,
        notes: order.notes,
        created_at: order.created_at,
        updated_at: order.updated_at,
        items: items
            .into_iter()
            .map(OrderItem::try_from)
            .collect::<Result<_, _>>()?,
        history: history
            .into_iter()
            .map(StatusHistoryEntry::try_from)
            .collect::<Result<_, _>>()?,
    })
}
