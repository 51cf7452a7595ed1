//! Order queries
//!
//! Checkout turns a cart into an immutable order snapshot inside one
//! transaction. After creation only status, payment_status, updated_at and
//! completed_at change, and only through the guarded transitions.

use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderCreate, OrderDetail, OrderItem, OrderPage, SelectedOption};
use shared::money::{from_cents, sum_lines};
use shared::order::{OrderStatus, PaymentStatus, Trigger};
use shared::util::{now_millis, order_number};
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::{cart, payments};
use crate::error::{ServiceResult, is_unique_violation};

/// Order number allocation attempts before giving up
const MAX_ORDER_NUMBER_ATTEMPTS: usize = 5;

pub(crate) const ORDER_COLUMNS: &str = "id, order_number, user_id, table_id, status, total, notes, payment_method, payment_status, created_at, updated_at, completed_at";

const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, menu_item_id, name, price, quantity, options, notes, created_at";

#[derive(sqlx::FromRow)]
pub(crate) struct OrderRow {
    id: i64,
    order_number: String,
    user_id: Option<i64>,
    table_id: i64,
    status: String,
    total: i64,
    notes: Option<String>,
    payment_method: String,
    payment_status: String,
    created_at: i64,
    updated_at: i64,
    completed_at: Option<i64>,
}

impl OrderRow {
    pub(crate) fn into_order(self) -> ServiceResult<Order> {
        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            user_id: self.user_id,
            table_id: self.table_id,
            status: self.status.parse::<OrderStatus>()?,
            total: from_cents(self.total),
            notes: self.notes,
            payment_method: self.payment_method,
            payment_status: self.payment_status.parse::<PaymentStatus>()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    menu_item_id: i64,
    name: String,
    price: i64,
    quantity: i64,
    options: String,
    notes: Option<String>,
    created_at: i64,
}

impl OrderItemRow {
    fn into_item(self) -> ServiceResult<OrderItem> {
        let options: Vec<SelectedOption> = serde_json::from_str(&self.options)?;
        Ok(OrderItem {
            id: self.id,
            order_id: self.order_id,
            menu_item_id: self.menu_item_id,
            name: self.name,
            price: from_cents(self.price),
            quantity: self.quantity,
            options,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

fn order_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::OrderNotFound).with_detail("id", id)
}

pub(crate) async fn find_order(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Order> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
    sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| order_not_found(id))?
        .into_order()
}

async fn list_items(conn: &mut SqliteConnection, order_id: i64) -> ServiceResult<Vec<OrderItem>> {
    let sql = format!("SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = ? ORDER BY id");
    sqlx::query_as::<_, OrderItemRow>(&sql)
        .bind(order_id)
        .fetch_all(conn)
        .await?
        .into_iter()
        .map(OrderItemRow::into_item)
        .collect()
}

/// Insert the order row, drawing a fresh order number on UNIQUE collisions
async fn insert_order(
    conn: &mut SqliteConnection,
    input: &OrderCreate,
    payment_method: &str,
    user_id: Option<i64>,
    total: i64,
    now: i64,
) -> ServiceResult<Order> {
    let sql = format!(
        "INSERT INTO orders (order_number, user_id, table_id, status, total, notes, payment_method, payment_status, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING {ORDER_COLUMNS}"
    );

    for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
        let number = order_number();
        let result = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(&number)
            .bind(user_id)
            .bind(input.table_id)
            .bind(OrderStatus::Pending.as_str())
            .bind(total)
            .bind(&input.notes)
            .bind(payment_method)
            .bind(PaymentStatus::Pending.as_str())
            .bind(now)
            .bind(now)
            .fetch_one(&mut *conn)
            .await;

        match result {
            Ok(row) => return row.into_order(),
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!(attempt, order_number = %number, "Order number collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::new(ErrorCode::OrderNumberExhausted).into())
}

/// Checkout: snapshot the cart into a new pending order and empty the cart
///
/// Everything happens in one transaction; any failure leaves the cart and the
/// orders table exactly as they were.
pub async fn create_order(
    pool: &SqlitePool,
    input: &OrderCreate,
    user_id: Option<i64>,
) -> ServiceResult<OrderDetail> {
    let payment_method = input.payment_method.trim();
    if payment_method.is_empty() {
        return Err(AppError::required("paymentMethod").into());
    }

    let mut tx = super::begin_write(pool).await?;

    let cart_row = cart::find_cart(&mut tx, input.cart_id).await?;
    if cart_row.table_id != input.table_id {
        return Err(AppError::validation("Cart does not belong to this table")
            .with_detail("cartId", input.cart_id)
            .with_detail("tableId", input.table_id)
            .into());
    }

    let lines = cart::list_item_rows(&mut tx, cart_row.id).await?;
    if lines.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty)
            .with_detail("cartId", input.cart_id)
            .into());
    }

    let total = sum_lines(lines.iter().map(|l| (l.price, l.quantity)))?;
    let now = now_millis();
    let order = insert_order(&mut tx, input, payment_method, user_id, total, now).await?;

    let item_sql = format!(
        "INSERT INTO order_items (order_id, menu_item_id, name, price, quantity, options, notes, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING {ORDER_ITEM_COLUMNS}"
    );
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let row = sqlx::query_as::<_, OrderItemRow>(&item_sql)
            .bind(order.id)
            .bind(line.menu_item_id)
            .bind(&line.name)
            .bind(line.price)
            .bind(line.quantity)
            .bind(&line.options)
            .bind(&line.notes)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
        items.push(row.into_item()?);
    }

    cart::empty_cart(&mut tx, cart_row.id).await?;
    tx.commit().await?;

    tracing::info!(
        order_id = order.id,
        order_number = %order.order_number,
        table_id = order.table_id,
        total = %order.total,
        items = items.len(),
        "Order created"
    );

    Ok(OrderDetail {
        order,
        items,
        payment: None,
    })
}

/// Order with its lines and payment
pub async fn get_order(pool: &SqlitePool, id: i64) -> ServiceResult<OrderDetail> {
    let mut conn = pool.acquire().await?;
    let order = find_order(&mut conn, id).await?;
    let items = list_items(&mut conn, id).await?;
    let payment = payments::find_by_order(&mut conn, id).await?;
    Ok(OrderDetail {
        order,
        items,
        payment,
    })
}

/// Admin listing, newest first
pub async fn list_orders(
    pool: &SqlitePool,
    status: Option<OrderStatus>,
    page: i64,
    per_page: i64,
) -> ServiceResult<OrderPage> {
    let page = page.max(1);
    let per_page = per_page.clamp(1, 100);
    let status = status.map(|s| s.as_str());

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE (?1 IS NULL OR status = ?1)")
            .bind(status)
            .fetch_one(pool)
            .await?;

    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY created_at DESC, id DESC
         LIMIT ?2 OFFSET ?3"
    );
    let orders = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(status)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(OrderRow::into_order)
        .collect::<ServiceResult<Vec<_>>>()?;

    Ok(OrderPage {
        orders,
        total,
        page,
        per_page,
    })
}

/// Persist a status that has already passed the transition guard
pub(crate) async fn write_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: OrderStatus,
    now: i64,
) -> ServiceResult<Order> {
    let sql = format!(
        "UPDATE orders SET
            status = ?,
            updated_at = ?,
            completed_at = CASE WHEN ? THEN ? ELSE completed_at END
         WHERE id = ?
         RETURNING {ORDER_COLUMNS}"
    );
    sqlx::query_as::<_, OrderRow>(&sql)
        .bind(status.as_str())
        .bind(now)
        .bind(status == OrderStatus::Completed)
        .bind(now)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| order_not_found(id))?
        .into_order()
}

/// Admin status change through the lifecycle guard
pub async fn update_status(pool: &SqlitePool, id: i64, to: OrderStatus) -> ServiceResult<Order> {
    let mut tx = super::begin_write(pool).await?;
    let order = find_order(&mut tx, id).await?;
    let next = order.status.transition(to, Trigger::Admin)?;
    let updated = write_status(&mut tx, id, next, now_millis()).await?;
    tx.commit().await?;

    tracing::info!(
        order_id = id,
        from = %order.status,
        to = %updated.status,
        "Order status changed"
    );
    Ok(updated)
}

/// Admin payment status change (e.g. refund after cancellation)
pub async fn update_payment_status(
    pool: &SqlitePool,
    id: i64,
    to: PaymentStatus,
) -> ServiceResult<Order> {
    let mut tx = super::begin_write(pool).await?;
    let order = find_order(&mut tx, id).await?;
    let next = order.payment_status.transition(to, order.status)?;
    let now = now_millis();

    let sql = format!(
        "UPDATE orders SET payment_status = ?, updated_at = ? WHERE id = ? RETURNING {ORDER_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(next.as_str())
        .bind(now)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?
        .into_order()?;
    payments::sync_status(&mut tx, id, next, now).await?;
    tx.commit().await?;

    tracing::info!(
        order_id = id,
        from = %order.payment_status,
        to = %updated.payment_status,
        "Order payment status changed"
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;
    use shared::models::CartItemAdd;

    struct Fixture {
        pool: SqlitePool,
        cart_id: i64,
        noodles: i64,
    }

    /// Cart on table 1 holding 18.00 × 2 + 32.00 × 1
    async fn fixture() -> Fixture {
        let pool = test_support::pool().await;
        let noodles = test_support::menu_item(&pool, "Noodles", 1800).await;
        let soup = test_support::menu_item(&pool, "Soup", 3200).await;
        let cart_id = cart::read_cart(&pool, 1, "s").await.unwrap().id;
        for (item, qty) in [(noodles, 2), (soup, 1)] {
            cart::add_item(
                &pool,
                &CartItemAdd {
                    cart_id,
                    menu_item_id: item,
                    quantity: qty,
                    options: vec![],
                    notes: None,
                },
            )
            .await
            .unwrap();
        }
        Fixture {
            pool,
            cart_id,
            noodles,
        }
    }

    fn checkout(cart_id: i64) -> OrderCreate {
        OrderCreate {
            cart_id,
            table_id: 1,
            notes: Some("window seat".into()),
            payment_method: "card".into(),
        }
    }

    async fn order_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_checkout_snapshots_cart_and_empties_it() {
        let f = fixture().await;
        let cart_before = cart::read_cart(&f.pool, 1, "s").await.unwrap();

        let detail = create_order(&f.pool, &checkout(f.cart_id), None).await.unwrap();
        assert_eq!(detail.order.total, cart_before.total);
        assert_eq!(detail.order.total.to_string(), "68.00");
        assert_eq!(detail.order.status, OrderStatus::Pending);
        assert_eq!(detail.order.payment_status, PaymentStatus::Pending);
        assert!(detail.order.order_number.starts_with("ORD-"));
        assert_eq!(detail.items.len(), 2);
        assert!(detail.payment.is_none());

        let cart_after = cart::read_cart(&f.pool, 1, "s").await.unwrap();
        assert_eq!(cart_after.id, f.cart_id);
        assert!(cart_after.items.is_empty());
        assert_eq!(cart_after.total.to_string(), "0.00");
    }

    #[tokio::test]
    async fn test_empty_cart_checkout_writes_nothing() {
        let pool = test_support::pool().await;
        let cart_id = cart::read_cart(&pool, 1, "s").await.unwrap().id;

        let err: AppError = create_order(&pool, &checkout(cart_id), None)
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::OrderEmpty);
        assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);
        assert_eq!(order_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_checkout_validation() {
        let f = fixture().await;

        let mut input = checkout(f.cart_id);
        input.payment_method = "  ".into();
        let err: AppError = create_order(&f.pool, &input, None).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::RequiredField);

        let err: AppError = create_order(&f.pool, &checkout(999), None)
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::CartNotFound);

        let mut input = checkout(f.cart_id);
        input.table_id = 2;
        let err: AppError = create_order(&f.pool, &input, None).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        assert_eq!(order_count(&f.pool).await, 0);
        assert_eq!(cart::read_cart(&f.pool, 1, "s").await.unwrap().items.len(), 2);
    }

    #[tokio::test]
    async fn test_order_items_frozen_against_menu_edits() {
        let f = fixture().await;
        let detail = create_order(&f.pool, &checkout(f.cart_id), None).await.unwrap();

        sqlx::query("UPDATE menu_items SET name = 'Renamed', price = 9900 WHERE id = ?")
            .bind(f.noodles)
            .execute(&f.pool)
            .await
            .unwrap();

        let reloaded = get_order(&f.pool, detail.order.id).await.unwrap();
        let line = reloaded
            .items
            .iter()
            .find(|i| i.menu_item_id == f.noodles)
            .unwrap();
        assert_eq!(line.name, "Noodles");
        assert_eq!(line.price.to_string(), "18.00");
        assert_eq!(reloaded.order.total.to_string(), "68.00");
    }

    #[tokio::test]
    async fn test_get_missing_order() {
        let pool = test_support::pool().await;
        let err: AppError = get_order(&pool, 1).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }

    #[tokio::test]
    async fn test_admin_transitions_and_completed_at() {
        let f = fixture().await;
        let id = create_order(&f.pool, &checkout(f.cart_id), None)
            .await
            .unwrap()
            .order
            .id;

        let err: AppError = update_status(&f.pool, id, OrderStatus::Completed)
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::OrderInvalidTransition);

        let order = update_status(&f.pool, id, OrderStatus::Processing).await.unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
        assert!(order.completed_at.is_none());

        let order = update_status(&f.pool, id, OrderStatus::Completed).await.unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.completed_at.is_some());

        let err: AppError = update_status(&f.pool, id, OrderStatus::Pending)
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::OrderInvalidTransition);
        assert_eq!(
            get_order(&f.pool, id).await.unwrap().order.status,
            OrderStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_refund_only_after_cancellation() {
        let f = fixture().await;
        let id = create_order(&f.pool, &checkout(f.cart_id), None)
            .await
            .unwrap()
            .order
            .id;
        update_payment_status(&f.pool, id, PaymentStatus::Paid).await.unwrap();

        let err: AppError = update_payment_status(&f.pool, id, PaymentStatus::Refunded)
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::PaymentInvalidTransition);

        update_status(&f.pool, id, OrderStatus::Cancelled).await.unwrap();
        let order = update_payment_status(&f.pool, id, PaymentStatus::Refunded)
            .await
            .unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Refunded);
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_list_orders_filters_and_pages() {
        let pool = test_support::pool().await;
        let tea = test_support::menu_item(&pool, "Tea", 300).await;
        let mut ids = Vec::new();
        for session in ["a", "b", "c"] {
            let cart_id = cart::read_cart(&pool, 1, session).await.unwrap().id;
            cart::add_item(
                &pool,
                &CartItemAdd {
                    cart_id,
                    menu_item_id: tea,
                    quantity: 1,
                    options: vec![],
                    notes: None,
                },
            )
            .await
            .unwrap();
            ids.push(create_order(&pool, &checkout(cart_id), None).await.unwrap().order.id);
        }
        update_status(&pool, ids[0], OrderStatus::Cancelled).await.unwrap();

        let all = list_orders(&pool, None, 1, 2).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.orders.len(), 2);
        assert_eq!(all.orders[0].id, ids[2]);

        let second = list_orders(&pool, None, 2, 2).await.unwrap();
        assert_eq!(second.orders.len(), 1);
        assert_eq!(second.orders[0].id, ids[0]);

        let pending = list_orders(&pool, Some(OrderStatus::Pending), 1, 20).await.unwrap();
        assert_eq!(pending.total, 2);
        assert!(pending.orders.iter().all(|o| o.status == OrderStatus::Pending));
    }

    #[tokio::test]
    async fn test_unique_violation_keeps_transaction_usable() {
        let f = fixture().await;
        let first = create_order(&f.pool, &checkout(f.cart_id), None).await.unwrap();

        // A colliding number fails the insert but not the transaction
        let mut tx = f.pool.begin().await.unwrap();
        let err = sqlx::query(
            "INSERT INTO orders (order_number, table_id, total, payment_method, created_at, updated_at)
             VALUES (?, 1, 0, 'card', 0, 0)",
        )
        .bind(&first.order.order_number)
        .execute(&mut *tx)
        .await
        .unwrap_err();
        assert!(is_unique_violation(&err));

        let input = checkout(f.cart_id);
        let order = insert_order(&mut tx, &input, "card", None, 100, now_millis())
            .await
            .unwrap();
        assert_ne!(order.order_number, first.order.order_number);
        tx.commit().await.unwrap();
    }
}
