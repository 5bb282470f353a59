pub mod auth;
pub mod orders;

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::transition_status,
    ),
    components(schemas(
        orders::CreateOrderRequest,
        orders::CreateOrderItemRequest,
        orders::TransitionStatusRequest,
        orders::OrderResponse,
        orders::OrderItemResponse,
        orders::StatusHistoryResponse,
        orders::ListOrdersResponse,
    )),
    tags((name = "orders", description = "Order lifecycle"))
)]
pub struct ApiDoc;
