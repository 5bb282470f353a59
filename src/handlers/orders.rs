use std::str::FromStr;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    CreateOrder, ListResult, Order, OrderFilters, OrderItem, OrderItemInput, StatusHistoryEntry,
    DEFAULT_PAGE_LIMIT,
};
use crate::domain::status::OrderStatus;
use crate::domain::ParseEnumError;
use crate::errors::AppError;
use crate::AppState;

use super::auth::BearerToken;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderItemRequest {
    pub variant_id: i32,
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Only honoured for staff; clients always order for themselves.
    pub client_id: Option<i32>,
    pub table_number: Option<i32>,
    /// One of `CASH`, `CARD`, `ONLINE`.
    pub payment_method: Option<String>,
    /// One of `DINE_IN`, `TAKEAWAY`, `DELIVERY`.
    pub order_type: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<CreateOrderItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionStatusRequest {
    pub status: String,
    /// Status the caller last observed. When present, the change only
    /// applies if the order is still in it.
    pub expected_status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i32,
    pub variant_id: i32,
    pub quantity: i32,
    /// Decimal as a string, e.g. "10.50"
    pub unit_price: String,
    pub item_total_price: String,
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusHistoryResponse {
    pub id: i32,
    pub status: String,
    pub changed_by_user_id: Option<i32>,
    pub changed_at: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i32,
    pub establishment_id: i32,
    pub client_id: Option<i32>,
    pub waiter_id: Option<i32>,
    pub table_number: Option<i32>,
    pub status: String,
    /// Decimal as a string, e.g. "16.50"
    pub total_amount: String,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
    pub order_type: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemResponse>,
    pub history: Vec<StatusHistoryResponse>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(i: OrderItem) -> Self {
        Self {
            id: i.id,
            variant_id: i.variant_id,
            quantity: i.quantity,
            unit_price: i.unit_price.to_string(),
            item_total_price: i.item_total_price.to_string(),
            status: i.status.to_string(),
            notes: i.notes,
        }
    }
}

impl From<StatusHistoryEntry> for StatusHistoryResponse {
    fn from(h: StatusHistoryEntry) -> Self {
        Self {
            id: h.id,
            status: h.status.to_string(),
            changed_by_user_id: h.changed_by_user_id,
            changed_at: h.changed_at.to_rfc3339(),
            notes: h.notes,
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            establishment_id: o.establishment_id,
            client_id: o.client_id,
            waiter_id: o.waiter_id,
            table_number: o.table_number,
            status: o.status.to_string(),
            total_amount: o.total_amount.to_string(),
            payment_method: o.payment_method.map(|m| m.to_string()),
            payment_status: o.payment_status.map(|s| s.to_string()),
            order_type: o.order_type.to_string(),
            notes: o.notes,
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
            items: o.items.into_iter().map(Into::into).collect(),
            history: o.history.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Pagination and filters ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    pub status: Option<String>,
    /// Inclusive lower bound on creation time (RFC 3339).
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time (RFC 3339).
    pub to: Option<DateTime<Utc>>,
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Request parsing ──────────────────────────────────────────────────────────

fn parse_field<T>(field: &str, value: Option<String>) -> Result<Option<T>, DomainError>
where
    T: FromStr<Err = ParseEnumError>,
{
    value
        .map(|v| T::from_str(&v).map_err(|e| DomainError::validation(field, e.to_string())))
        .transpose()
}

impl CreateOrderRequest {
    fn into_domain(self, establishment_id: i32) -> Result<CreateOrder, DomainError> {
        Ok(CreateOrder {
            establishment_id,
            client_id: self.client_id,
            table_number: self.table_number,
            payment_method: parse_field("payment_method", self.payment_method)?,
            order_type: parse_field("order_type", self.order_type)?,
            notes: self.notes,
            items: self
                .items
                .into_iter()
                .map(|i| OrderItemInput {
                    variant_id: i.variant_id,
                    quantity: i.quantity,
                    notes: i.notes,
                })
                .collect(),
        })
    }
}

impl ListOrdersParams {
    fn into_domain(self) -> Result<OrderFilters, DomainError> {
        Ok(OrderFilters {
            status: parse_field("status", self.status)?,
            created_from: self.from,
            created_to: self.to,
            client_id: None,
            page: self.page,
            limit: self.limit,
        })
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /establishments/{establishment_id}/orders
///
/// Creates an order with its items. Prices come from the catalog; the order,
/// its items and the initial `PENDING` history row are written atomically.
#[utoipa::path(
    post,
    path = "/establishments/{establishment_id}/orders",
    params(
        ("establishment_id" = i32, Path, description = "Establishment id"),
    ),
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 401, description = "Missing or unknown session"),
        (status = 403, description = "Establishment not accessible"),
        (status = 422, description = "Invalid items"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    token: BearerToken,
    path: web::Path<i32>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let input = body.into_inner().into_domain(path.into_inner())?;

    let order = web::block(move || {
        let session = state.sessions.resolve(token.as_str())?;
        state.orders.create_order(&session, input)
    })
    .await??;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /establishments/{establishment_id}/orders
///
/// Returns a page of the establishment's orders, newest first.
#[utoipa::path(
    get,
    path = "/establishments/{establishment_id}/orders",
    params(
        ("establishment_id" = i32, Path, description = "Establishment id"),
        ("status" = Option<String>, Query, description = "Only orders in this status"),
        ("from" = Option<String>, Query, description = "Created at or after (RFC 3339)"),
        ("to" = Option<String>, Query, description = "Created at or before (RFC 3339)"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 401, description = "Missing or unknown session"),
        (status = 403, description = "Establishment not accessible"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    token: BearerToken,
    path: web::Path<i32>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let establishment_id = path.into_inner();
    let filters = query.into_inner().into_domain()?;

    let result: ListResult = web::block(move || {
        let session = state.sessions.resolve(token.as_str())?;
        state.orders.list_orders(&session, establishment_id, filters)
    })
    .await??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(Into::into).collect(),
        total: result.total,
        page: result.page,
        limit: result.limit,
    }))
}

/// GET /establishments/{establishment_id}/orders/{order_id}
///
/// Returns the order with its items and status history.
#[utoipa::path(
    get,
    path = "/establishments/{establishment_id}/orders/{order_id}",
    params(
        ("establishment_id" = i32, Path, description = "Establishment id"),
        ("order_id" = i32, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 401, description = "Missing or unknown session"),
        (status = 403, description = "Establishment not accessible"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    token: BearerToken,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, AppError> {
    let (establishment_id, order_id) = path.into_inner();

    let order = web::block(move || {
        let session = state.sessions.resolve(token.as_str())?;
        state.orders.get_order(&session, order_id, establishment_id)
    })
    .await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PATCH /establishments/{establishment_id}/orders/{order_id}/status
///
/// Moves the order to the requested status. Staff only.
#[utoipa::path(
    patch,
    path = "/establishments/{establishment_id}/orders/{order_id}/status",
    params(
        ("establishment_id" = i32, Path, description = "Establishment id"),
        ("order_id" = i32, Path, description = "Order id"),
    ),
    request_body = TransitionStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderResponse),
        (status = 401, description = "Missing or unknown session"),
        (status = 403, description = "Caller may not change this order"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed from the current status, or the order changed concurrently"),
        (status = 422, description = "Unknown status"),
    ),
    tag = "orders"
)]
pub async fn transition_status(
    state: web::Data<AppState>,
    token: BearerToken,
    path: web::Path<(i32, i32)>,
    body: web::Json<TransitionStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let (establishment_id, order_id) = path.into_inner();
    let body = body.into_inner();
    let new_status = OrderStatus::from_str(&body.status)
        .map_err(|e| DomainError::validation("status", e.to_string()))?;
    let expected = parse_field::<OrderStatus>("expected_status", body.expected_status)?;

    let order = web::block(move || {
        let session = state.sessions.resolve(token.as_str())?;
        match expected {
            Some(expected) => state.orders.transition_status_if(
                &session,
                order_id,
                establishment_id,
                expected,
                new_status,
                body.notes,
            ),
            None => state.orders.transition_status(
                &session,
                order_id,
                establishment_id,
                new_status,
                body.notes,
            ),
        }
    })
    .await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
