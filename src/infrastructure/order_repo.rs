use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    ListResult, NewOrder, NewOrderItem, NewStatusHistory, Order, OrderFilters,
};
use crate::domain::ports::OrderRepository;
use crate::domain::status::{ItemStatus, OrderStatus};
use crate::schema::{order_items, order_status_history, orders};

use super::models::{
    assemble_order, NewOrderItemRow, NewOrderRow, NewStatusHistoryRow, OrderItemRow, OrderRow,
    StatusHistoryRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn load_aggregate(conn: &mut PgConnection, order: OrderRow) -> Result<Order, DomainError> {
        let items = OrderItemRow::belonging_to(&order)
            .select(OrderItemRow::as_select())
            .order(order_items::id.asc())
            .load(conn)?;
        let history = StatusHistoryRow::belonging_to(&order)
            .select(StatusHistoryRow::as_select())
            .order((
                order_status_history::changed_at.asc(),
                order_status_history::id.asc(),
            ))
            .load(conn)?;
        assemble_order(order, items, history)
    }
}

fn filtered_orders<'a>(
    establishment_id: i32,
    filters: &OrderFilters,
) -> orders::BoxedQuery<'a, Pg> {
    let mut query = orders::table
        .filter(orders::establishment_id.eq(establishment_id))
        .into_boxed();
    if let Some(status) = filters.status {
        query = query.filter(orders::status.eq(status.as_str()));
    }
    if let Some(from) = filters.created_from {
        query = query.filter(orders::created_at.ge(from));
    }
    if let Some(to) = filters.created_to {
        query = query.filter(orders::created_at.le(to));
    }
    if let Some(client_id) = filters.client_id {
        query = query.filter(orders::client_id.eq(client_id));
    }
    query
}

impl OrderRepository for DieselOrderRepository {
    fn insert_order_with_items_and_history(
        &self,
        order: NewOrder,
        items: Vec<NewOrderItem>,
        initial_history: NewStatusHistory,
    ) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let created_at = order.created_at;

            // 1. Insert the order
            let order_row: OrderRow = diesel::insert_into(orders::table)
                .values(NewOrderRow::from(order))
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            // 2. Insert its items with their price snapshots
            let new_items: Vec<NewOrderItemRow> = items
                .into_iter()
                .map(|item| NewOrderItemRow::new(order_row.id, created_at, item))
                .collect();
            diesel::insert_into(order_items::table)
                .values(&new_items)
                .execute(conn)?;

            // 3. Seed the history with the PENDING entry
            diesel::insert_into(order_status_history::table)
                .values(NewStatusHistoryRow::new(order_row.id, initial_history))
                .execute(conn)?;

            Self::load_aggregate(conn, order_row)
        })
    }

    fn find_order_by_id(
        &self,
        order_id: i32,
        establishment_id: i32,
    ) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(order_id))
            .filter(orders::establishment_id.eq(establishment_id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        Self::load_aggregate(&mut conn, order).map(Some)
    }

    fn find_orders_by_establishment(
        &self,
        establishment_id: i32,
        filters: &OrderFilters,
    ) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered_orders(establishment_id, filters)
                .count()
                .get_result(conn)?;

            let rows: Vec<OrderRow> = filtered_orders(establishment_id, filters)
                .select(OrderRow::as_select())
                .order((orders::created_at.desc(), orders::id.desc()))
                .limit(filters.limit)
                .offset(filters.offset())
                .load(conn)?;

            let item_rows: Vec<OrderItemRow> = OrderItemRow::belonging_to(&rows)
                .select(OrderItemRow::as_select())
                .order(order_items::id.asc())
                .load(conn)?;
            let history_rows: Vec<StatusHistoryRow> = StatusHistoryRow::belonging_to(&rows)
                .select(StatusHistoryRow::as_select())
                .order((
                    order_status_history::changed_at.asc(),
                    order_status_history::id.asc(),
                ))
                .load(conn)?;

            let items_per_order = item_rows.grouped_by(&rows);
            let history_per_order = history_rows.grouped_by(&rows);

            let items = rows
                .into_iter()
                .zip(items_per_order)
                .zip(history_per_order)
                .map(|((order, items), history)| assemble_order(order, items, history))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(ListResult {
                items,
                total,
                page: filters.page,
                limit: filters.limit,
            })
        })
    }

    fn update_status_and_append_history(
        &self,
        order_id: i32,
        establishment_id: i32,
        expected: OrderStatus,
        history: NewStatusHistory,
    ) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let new_status = history.status;

            // Conditional on the status the caller validated against; a racing
            // writer that committed first leaves zero matching rows.
            let updated = diesel::update(
                orders::table
                    .filter(orders::id.eq(order_id))
                    .filter(orders::establishment_id.eq(establishment_id))
                    .filter(orders::status.eq(expected.as_str())),
            )
            .set((
                orders::status.eq(new_status.as_str()),
                orders::updated_at.eq(history.changed_at),
            ))
            .execute(conn)?;

            if updated == 0 {
                return Err(DomainError::ConcurrencyConflict { order_id, expected });
            }

            if let Some(item_status) = new_status.item_status() {
                diesel::update(
                    order_items::table
                        .filter(order_items::order_id.eq(order_id))
                        .filter(order_items::status.ne(ItemStatus::Cancelled.as_str())),
                )
                .set(order_items::status.eq(item_status.as_str()))
                .execute(conn)?;
            }

            diesel::insert_into(order_status_history::table)
                .values(NewStatusHistoryRow::new(order_id, history))
                .execute(conn)?;

            let order = orders::table
                .find(order_id)
                .select(OrderRow::as_select())
                .first(conn)?;
            Self::load_aggregate(conn, order)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::{Duration, Utc};

    use super::DieselOrderRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::order::{NewOrder, NewOrderItem, NewStatusHistory, OrderFilters};
    use crate::domain::ports::OrderRepository;
    use crate::domain::status::{ItemStatus, OrderStatus, OrderType};
    use crate::infrastructure::test_support::seeded_db;

    fn new_order(establishment_id: i32, client_id: Option<i32>, total: &str) -> NewOrder {
        NewOrder {
            establishment_id,
            client_id,
            waiter_id: None,
            table_number: Some(3),
            status: OrderStatus::Pending,
            total_amount: BigDecimal::from_str(total).expect("valid decimal"),
            payment_method: None,
            payment_status: None,
            order_type: OrderType::DineIn,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn new_item(variant_id: i32, quantity: i32, price: &str) -> NewOrderItem {
        let unit_price = BigDecimal::from_str(price).expect("valid decimal");
        NewOrderItem {
            variant_id,
            quantity,
            item_total_price: &unit_price * BigDecimal::from(quantity),
            unit_price,
            status: ItemStatus::Pending,
            notes: None,
        }
    }

    fn pending(changed_by: Option<i32>) -> NewStatusHistory {
        NewStatusHistory {
            status: OrderStatus::Pending,
            changed_by_user_id: changed_by,
            changed_at: Utc::now(),
            notes: Some("Order created".to_string()),
        }
    }

    fn history(status: OrderStatus) -> NewStatusHistory {
        NewStatusHistory {
            status,
            changed_by_user_id: Some(2),
            changed_at: Utc::now() + Duration::milliseconds(1),
            notes: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires a container runtime for Postgres"]
    async fn insert_and_find_roundtrip() {
        let (_container, pool) = seeded_db().await;
        let repo = DieselOrderRepository::new(pool);

        let created = repo
            .insert_order_with_items_and_history(
                new_order(1, Some(7), "16.50"),
                vec![new_item(5, 1, "10.50"), new_item(9, 2, "3.00")],
                pending(Some(7)),
            )
            .expect("insert failed");

        let order = repo
            .find_order_by_id(created.id, 1)
            .expect("find failed")
            .expect("order should exist");

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.client_id, Some(7));
        assert_eq!(order.total_amount, BigDecimal::from_str("16.50").unwrap());
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[1].item_total_price, BigDecimal::from_str("6.00").unwrap());
        assert_eq!(order.history.len(), 1);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime for Postgres"]
    async fn find_is_scoped_by_establishment() {
        let (_container, pool) = seeded_db().await;
        let repo = DieselOrderRepository::new(pool);

        let created = repo
            .insert_order_with_items_and_history(
                new_order(1, None, "10.50"),
                vec![new_item(5, 1, "10.50")],
                pending(None),
            )
            .expect("insert failed");

        assert!(repo.find_order_by_id(created.id, 2).unwrap().is_none());
        assert!(repo.find_order_by_id(created.id + 1000, 1).unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires a container runtime for Postgres"]
    async fn failed_item_insert_rolls_back_order() {
        let (_container, pool) = seeded_db().await;
        let repo = DieselOrderRepository::new(pool);

        // Variant 999 violates the foreign key.
        let result = repo.insert_order_with_items_and_history(
            new_order(1, None, "10.50"),
            vec![new_item(999, 1, "10.50")],
            pending(None),
        );
        assert!(matches!(result, Err(DomainError::Internal(_))));

        let listed = repo
            .find_orders_by_establishment(1, &OrderFilters::default())
            .unwrap();
        assert_eq!(listed.total, 0);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime for Postgres"]
    async fn stale_expected_status_is_a_conflict() {
        let (_container, pool) = seeded_db().await;
        let repo = DieselOrderRepository::new(pool);

        let created = repo
            .insert_order_with_items_and_history(
                new_order(1, None, "10.50"),
                vec![new_item(5, 1, "10.50")],
                pending(None),
            )
            .unwrap();

        let updated = repo
            .update_status_and_append_history(
                created.id,
                1,
                OrderStatus::Pending,
                history(OrderStatus::Preparing),
            )
            .expect("first update failed");
        assert_eq!(updated.status, OrderStatus::Preparing);
        assert_eq!(updated.history.len(), 2);
        assert_eq!(updated.items[0].status, ItemStatus::Preparing);

        let err = repo
            .update_status_and_append_history(
                created.id,
                1,
                OrderStatus::Pending,
                history(OrderStatus::Cancelled),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::ConcurrencyConflict { .. }));

        let order = repo.find_order_by_id(created.id, 1).unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.history.len(), 2, "a lost race must not append history");
    }

    #[tokio::test]
    #[ignore = "requires a container runtime for Postgres"]
    async fn list_filters_and_paginates() {
        let (_container, pool) = seeded_db().await;
        let repo = DieselOrderRepository::new(pool);

        for client in [Some(7), Some(7), Some(8), None, None] {
            repo.insert_order_with_items_and_history(
                new_order(1, client, "3.00"),
                vec![new_item(9, 1, "3.00")],
                pending(client),
            )
            .expect("insert failed");
        }
        let first = repo
            .find_orders_by_establishment(1, &OrderFilters::default())
            .unwrap();
        repo.update_status_and_append_history(
            first.items[0].id,
            1,
            OrderStatus::Pending,
            history(OrderStatus::Cancelled),
        )
        .unwrap();

        let page1 = repo
            .find_orders_by_establishment(
                1,
                &OrderFilters {
                    limit: 3,
                    ..OrderFilters::default()
                },
            )
            .unwrap();
        assert_eq!(page1.total, 5);
        assert_eq!(page1.items.len(), 3);
        assert!(page1.items.iter().all(|o| !o.items.is_empty()));

        let page2 = repo
            .find_orders_by_establishment(
                1,
                &OrderFilters {
                    page: 2,
                    limit: 3,
                    ..OrderFilters::default()
                },
            )
            .unwrap();
        assert_eq!(page2.items.len(), 2);

        let cancelled = repo
            .find_orders_by_establishment(
                1,
                &OrderFilters {
                    status: Some(OrderStatus::Cancelled),
                    ..OrderFilters::default()
                },
            )
            .unwrap();
        assert_eq!(cancelled.total, 1);
        assert_eq!(cancelled.items[0].history.len(), 2);

        let mine = repo
            .find_orders_by_establishment(
                1,
                &OrderFilters {
                    client_id: Some(7),
                    ..OrderFilters::default()
                },
            )
            .unwrap();
        assert_eq!(mine.total, 2);

        let future = repo
            .find_orders_by_establishment(
                1,
                &OrderFilters {
                    created_from: Some(Utc::now() + Duration::hours(1)),
                    ..OrderFilters::default()
                },
            )
            .unwrap();
        assert_eq!(future.total, 0);

        let other = repo
            .find_orders_by_establishment(2, &OrderFilters::default())
            .unwrap();
        assert_eq!(other.total, 0);
    }
}
