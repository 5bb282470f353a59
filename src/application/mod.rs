pub mod guard;
pub mod order_service;
