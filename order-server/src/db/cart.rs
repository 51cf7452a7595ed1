//! Cart queries
//!
//! One cart per (table, session). Lines are keyed by (cart, menu item): adding
//! the same menu item again increments the existing line in a single upsert
//! statement. The stored cart total is recomputed lazily on read; only clear
//! and checkout write it otherwise (both zero it).

use shared::error::{AppError, ErrorCode};
use shared::models::{Cart, CartItem, CartItemAdd, MAX_QUANTITY, SelectedOption};
use shared::money::{from_cents, sum_lines};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::menu;
use crate::error::ServiceResult;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CartRow {
    pub id: i64,
    pub table_id: i64,
    pub session_id: String,
    pub total: i64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct CartItemRow {
    pub id: i64,
    pub cart_id: i64,
    pub menu_item_id: i64,
    pub name: String,
    pub quantity: i64,
    pub price: i64,
    pub options: String,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl CartItemRow {
    pub(crate) fn into_item(self) -> ServiceResult<CartItem> {
        let options: Vec<SelectedOption> = serde_json::from_str(&self.options)?;
        Ok(CartItem {
            id: self.id,
            cart_id: self.cart_id,
            menu_item_id: self.menu_item_id,
            name: self.name,
            quantity: self.quantity,
            price: from_cents(self.price),
            options,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ITEM_SELECT: &str = "SELECT ci.id, ci.cart_id, ci.menu_item_id, mi.name AS name, ci.quantity,
        ci.price, ci.options, ci.notes, ci.created_at, ci.updated_at
     FROM cart_items ci
     JOIN menu_items mi ON mi.id = ci.menu_item_id";

fn invalid_quantity(quantity: i64) -> AppError {
    AppError::new(ErrorCode::CartInvalidQuantity)
        .with_detail("quantity", quantity)
        .with_detail("max", MAX_QUANTITY)
}

/// Find the cart for (table, session), creating it if absent
///
/// Concurrent callers race on the UNIQUE (table_id, session_id) constraint and
/// all observe the same row.
pub(crate) async fn resolve_cart(
    conn: &mut SqliteConnection,
    table_id: i64,
    session_id: &str,
) -> ServiceResult<CartRow> {
    let now = now_millis();
    sqlx::query(
        "INSERT INTO carts (table_id, session_id, total, created_at, updated_at)
         VALUES (?, ?, 0, ?, ?)
         ON CONFLICT (table_id, session_id) DO NOTHING",
    )
    .bind(table_id)
    .bind(session_id)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let row = sqlx::query_as::<_, CartRow>(
        "SELECT id, table_id, session_id, total FROM carts WHERE table_id = ? AND session_id = ?",
    )
    .bind(table_id)
    .bind(session_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

pub(crate) async fn find_cart(conn: &mut SqliteConnection, cart_id: i64) -> ServiceResult<CartRow> {
    sqlx::query_as::<_, CartRow>("SELECT id, table_id, session_id, total FROM carts WHERE id = ?")
        .bind(cart_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::CartNotFound)
                .with_detail("cartId", cart_id)
                .into()
        })
}

pub(crate) async fn list_item_rows(
    conn: &mut SqliteConnection,
    cart_id: i64,
) -> ServiceResult<Vec<CartItemRow>> {
    let sql = format!("{ITEM_SELECT} WHERE ci.cart_id = ? ORDER BY ci.created_at, ci.id");
    let rows = sqlx::query_as::<_, CartItemRow>(&sql)
        .bind(cart_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

async fn find_item(conn: &mut SqliteConnection, item_id: i64) -> ServiceResult<Option<CartItem>> {
    let sql = format!("{ITEM_SELECT} WHERE ci.id = ?");
    sqlx::query_as::<_, CartItemRow>(&sql)
        .bind(item_id)
        .fetch_optional(conn)
        .await?
        .map(CartItemRow::into_item)
        .transpose()
}

/// Add a menu item to a cart, merging with an existing line for the same item
///
/// The unit price is copied from the menu item now. On merge the existing
/// line keeps its price, options and notes; only the quantity grows.
pub async fn add_item(pool: &SqlitePool, input: &CartItemAdd) -> ServiceResult<CartItem> {
    if !(1..=MAX_QUANTITY).contains(&input.quantity) {
        return Err(invalid_quantity(input.quantity).into());
    }

    let mut conn = pool.acquire().await?;
    find_cart(&mut conn, input.cart_id).await?;

    let item = menu::find_menu_item(&mut conn, input.menu_item_id)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::MenuItemNotFound).with_detail("menuItemId", input.menu_item_id)
        })?;
    if !item.is_available {
        return Err(AppError::new(ErrorCode::MenuItemUnavailable)
            .with_detail("menuItemId", item.id)
            .into());
    }
    let price = shared::money::to_cents(item.price)?;
    let options = serde_json::to_string(&input.options)?;
    let now = now_millis();

    // A merge that would pass MAX_QUANTITY leaves the row untouched and returns nothing
    let item_id: Option<i64> = sqlx::query_scalar(
        "INSERT INTO cart_items (cart_id, menu_item_id, quantity, price, options, notes, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (cart_id, menu_item_id) DO UPDATE SET
            quantity = cart_items.quantity + excluded.quantity,
            updated_at = excluded.updated_at
         WHERE cart_items.quantity + excluded.quantity <= ?
         RETURNING id",
    )
    .bind(input.cart_id)
    .bind(input.menu_item_id)
    .bind(input.quantity)
    .bind(price)
    .bind(options)
    .bind(&input.notes)
    .bind(now)
    .bind(now)
    .bind(MAX_QUANTITY)
    .fetch_optional(&mut *conn)
    .await?;
    let Some(item_id) = item_id else {
        return Err(invalid_quantity(input.quantity)
            .with_detail("menuItemId", input.menu_item_id)
            .into());
    };

    tracing::debug!(
        cart_id = input.cart_id,
        menu_item_id = input.menu_item_id,
        quantity = input.quantity,
        "Cart item added"
    );

    find_item(&mut conn, item_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CartItemNotFound).into())
}

/// Set a line's quantity; quantities below 1 are rejected and nothing changes
pub async fn update_item_quantity(
    pool: &SqlitePool,
    item_id: i64,
    quantity: i64,
) -> ServiceResult<CartItem> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(invalid_quantity(quantity).into());
    }

    let mut conn = pool.acquire().await?;
    let updated = sqlx::query("UPDATE cart_items SET quantity = ?, updated_at = ? WHERE id = ?")
        .bind(quantity)
        .bind(now_millis())
        .bind(item_id)
        .execute(&mut *conn)
        .await?;
    if updated.rows_affected() == 0 {
        return Err(AppError::new(ErrorCode::CartItemNotFound)
            .with_detail("id", item_id)
            .into());
    }

    find_item(&mut conn, item_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CartItemNotFound).into())
}

/// Delete a line. Removing a missing line is not an error.
pub async fn remove_item(pool: &SqlitePool, item_id: i64) -> ServiceResult<()> {
    sqlx::query("DELETE FROM cart_items WHERE id = ?")
        .bind(item_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete all lines and zero the total; the cart row itself stays
pub async fn clear_cart(pool: &SqlitePool, cart_id: i64) -> ServiceResult<()> {
    let mut tx = super::begin_write(pool).await?;
    find_cart(&mut tx, cart_id).await?;
    empty_cart(&mut tx, cart_id).await?;
    tx.commit().await?;
    tracing::debug!(cart_id, "Cart cleared");
    Ok(())
}

/// Delete all lines of a cart and zero its total (caller owns the transaction)
pub(crate) async fn empty_cart(conn: &mut SqliteConnection, cart_id: i64) -> ServiceResult<()> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE carts SET total = 0, updated_at = ? WHERE id = ?")
        .bind(now_millis())
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Resolve-or-create the cart and return a snapshot with a freshly computed total
///
/// The recomputed total is written back when it differs from the stored one.
pub async fn read_cart(pool: &SqlitePool, table_id: i64, session_id: &str) -> ServiceResult<Cart> {
    let mut conn = pool.acquire().await?;
    let cart = resolve_cart(&mut conn, table_id, session_id).await?;
    let rows = list_item_rows(&mut conn, cart.id).await?;

    let total = sum_lines(rows.iter().map(|r| (r.price, r.quantity)))?;
    let item_count: i64 = rows.iter().map(|r| r.quantity).sum();

    if total != cart.total {
        sqlx::query("UPDATE carts SET total = ?, updated_at = ? WHERE id = ?")
            .bind(total)
            .bind(now_millis())
            .bind(cart.id)
            .execute(&mut *conn)
            .await?;
    }

    let items = rows
        .into_iter()
        .map(CartItemRow::into_item)
        .collect::<ServiceResult<Vec<_>>>()?;

    Ok(Cart {
        id: cart.id,
        table_id: cart.table_id,
        session_id: cart.session_id,
        items,
        total: from_cents(total),
        item_count,
    })
}

/// Cart read for the customer page: any failure degrades to an empty snapshot
pub async fn read_cart_or_empty(pool: &SqlitePool, table_id: i64, session_id: &str) -> Cart {
    match read_cart(pool, table_id, session_id).await {
        Ok(cart) => cart,
        Err(e) => {
            tracing::warn!(
                table_id,
                session_id,
                error = %e,
                "Cart read failed, returning empty cart"
            );
            Cart::empty(table_id, session_id)
        }
    }
}
