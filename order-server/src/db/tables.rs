//! Dining table queries

use shared::error::{AppError, ErrorCode};
use shared::models::DiningTable;
use shared::util::now_millis;
use sqlx::SqlitePool;

use crate::error::ServiceResult;

const TABLE_COLUMNS: &str = "id, name, qr_code, is_active, created_at, updated_at";

pub async fn list_tables(pool: &SqlitePool) -> ServiceResult<Vec<DiningTable>> {
    let sql = format!("SELECT {TABLE_COLUMNS} FROM dining_tables ORDER BY id");
    Ok(sqlx::query_as::<_, DiningTable>(&sql).fetch_all(pool).await?)
}

pub async fn get_table(pool: &SqlitePool, id: i64) -> ServiceResult<DiningTable> {
    let sql = format!("SELECT {TABLE_COLUMNS} FROM dining_tables WHERE id = ?");
    sqlx::query_as::<_, DiningTable>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::TableNotFound)
                .with_detail("id", id)
                .into()
        })
}

/// Create a table; its QR code target is `<base_url>/table/<id>`
pub async fn create_table(
    pool: &SqlitePool,
    name: &str,
    base_url: &str,
) -> ServiceResult<DiningTable> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::required("name").into());
    }
    let now = now_millis();

    let mut tx = super::begin_write(pool).await?;
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO dining_tables (name, is_active, created_at, updated_at) VALUES (?, 1, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let sql = format!("UPDATE dining_tables SET qr_code = ? WHERE id = ? RETURNING {TABLE_COLUMNS}");
    let table = sqlx::query_as::<_, DiningTable>(&sql)
        .bind(qr_target(base_url, id))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(table_id = id, name = %table.name, "Dining table created");
    Ok(table)
}

fn qr_target(base_url: &str, id: i64) -> String {
    format!("{}/table/{}", base_url.trim_end_matches('/'), id)
}
