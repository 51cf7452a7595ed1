//! Racing writers on a file-backed WAL pool
//!
//! The in-memory pool has a single connection and serializes everything, so
//! these run against `DbService::new` with its five connections.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{CartItemAdd, OrderCreate, PaymentCreate};
use sqlx::SqlitePool;
use tokio::sync::Barrier;

use crate::db::{cart, orders, payments, test_support};
use crate::services::SimulatedGateway;

fn add(cart_id: i64, menu_item_id: i64, quantity: i64) -> CartItemAdd {
    CartItemAdd {
        cart_id,
        menu_item_id,
        quantity,
        options: vec![],
        notes: None,
    }
}

fn checkout(cart_id: i64) -> OrderCreate {
    OrderCreate {
        cart_id,
        table_id: 1,
        notes: None,
        payment_method: "card".into(),
    }
}

/// Cart on table 1 holding 18.00 × 2 + 32.00 × 1
async fn filled_cart(pool: &SqlitePool) -> i64 {
    let noodles = test_support::menu_item(pool, "Noodles", 1800).await;
    let soup = test_support::menu_item(pool, "Soup", 3200).await;
    let cart_id = cart::read_cart(pool, 1, "s").await.unwrap().id;
    cart::add_item(pool, &add(cart_id, noodles, 2)).await.unwrap();
    cart::add_item(pool, &add(cart_id, soup, 1)).await.unwrap();
    cart_id
}

async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_sum_quantities() {
    let (_dir, pool) = test_support::file_pool().await;
    let tea = test_support::menu_item(&pool, "Tea", 300).await;
    let cart_id = cart::read_cart(&pool, 9, "s").await.unwrap().id;

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (1..=8)
        .map(|q| {
            let pool = pool.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                cart::add_item(&pool, &add(cart_id, tea, q)).await
            })
        })
        .collect();
    for h in handles {
        h.await.unwrap().unwrap();
    }

    let snapshot = cart::read_cart(&pool, 9, "s").await.unwrap();
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].quantity, 36);
    assert_eq!(snapshot.total.to_string(), "108.00");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_checkouts_create_one_order() {
    let (_dir, pool) = test_support::file_pool().await;
    let cart_id = filled_cart(&pool).await;

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let pool = pool.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                orders::create_order(&pool, &checkout(cart_id), None).await
            })
        })
        .collect();

    let mut created = Vec::new();
    let mut rejected = Vec::new();
    for h in handles {
        match h.await.unwrap() {
            Ok(detail) => created.push(detail),
            Err(e) => rejected.push(AppError::from(e)),
        }
    }

    assert_eq!(created.len(), 1);
    assert_eq!(created[0].order.total.to_string(), "68.00");
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].code, ErrorCode::OrderEmpty);
    assert_eq!(count(&pool, "orders").await, 1);
    assert_eq!(count(&pool, "order_items").await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_payments_record_one_payment() {
    let (_dir, pool) = test_support::file_pool().await;
    let cart_id = filled_cart(&pool).await;
    let order_id = orders::create_order(&pool, &checkout(cart_id), None)
        .await
        .unwrap()
        .order
        .id;

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let pool = pool.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                let input = PaymentCreate {
                    order_id,
                    payment_method: "card".into(),
                    amount: Decimal::from_str("68.00").unwrap(),
                    payment_details: None,
                };
                barrier.wait().await;
                payments::process_payment(&pool, &SimulatedGateway, &input).await
            })
        })
        .collect();

    let mut paid = 0;
    let mut rejected = Vec::new();
    for h in handles {
        match h.await.unwrap() {
            Ok(_) => paid += 1,
            Err(e) => rejected.push(AppError::from(e)),
        }
    }

    assert_eq!(paid, 1);
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].code, ErrorCode::OrderAlreadyPaid);
    assert_eq!(rejected[0].http_status(), http::StatusCode::CONFLICT);
    assert_eq!(count(&pool, "payments").await, 1);
}
