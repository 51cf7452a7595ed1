//! Menu catalog queries
//!
//! Categories → menu items → option groups → options. Prices are stored in
//! cents and surfaced as `Decimal`.

use shared::error::{AppError, ErrorCode};
use shared::models::{
    Category, MenuItem, MenuItemCreate, MenuItemDetail, MenuItemUpdate, MenuOption, OptionGroup,
};
use shared::money::{from_cents, price_to_cents};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::ServiceResult;

const ITEM_COLUMNS: &str = "id, name, description, price, image_url, category_id, is_available, display_order, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct MenuItemRow {
    id: i64,
    name: String,
    description: Option<String>,
    price: i64,
    image_url: Option<String>,
    category_id: Option<i64>,
    is_available: bool,
    display_order: i64,
    created_at: i64,
    updated_at: i64,
}

impl From<MenuItemRow> for MenuItem {
    fn from(r: MenuItemRow) -> Self {
        MenuItem {
            id: r.id,
            name: r.name,
            description: r.description,
            price: from_cents(r.price),
            image_url: r.image_url,
            category_id: r.category_id,
            is_available: r.is_available,
            display_order: r.display_order,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OptionGroupRow {
    id: i64,
    name: String,
    description: Option<String>,
    is_required: bool,
    min_select: i64,
    max_select: i64,
    display_order: i64,
}

#[derive(sqlx::FromRow)]
struct OptionRow {
    id: i64,
    group_id: i64,
    name: String,
    price: i64,
    display_order: i64,
}

pub async fn list_categories(pool: &SqlitePool) -> ServiceResult<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>(
        "SELECT id, name, description, image_url, display_order, is_active, created_at, updated_at
         FROM categories WHERE is_active = 1 ORDER BY display_order, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Available menu items, optionally restricted to one category
pub async fn list_menu_items(
    pool: &SqlitePool,
    category_id: Option<i64>,
) -> ServiceResult<Vec<MenuItem>> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM menu_items
         WHERE is_available = 1 AND (?1 IS NULL OR category_id = ?1)
         ORDER BY display_order, id"
    );
    let rows = sqlx::query_as::<_, MenuItemRow>(&sql)
        .bind(category_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn find_menu_item(
    conn: &mut SqliteConnection,
    id: i64,
) -> ServiceResult<Option<MenuItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM menu_items WHERE id = ?");
    let row = sqlx::query_as::<_, MenuItemRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(Into::into))
}

/// Menu item with its option groups and options, each ordered by display order
pub async fn get_menu_item(pool: &SqlitePool, id: i64) -> ServiceResult<MenuItemDetail> {
    let mut conn = pool.acquire().await?;
    let item = find_menu_item(&mut conn, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MenuItemNotFound).with_detail("id", id))?;

    let groups = sqlx::query_as::<_, OptionGroupRow>(
        "SELECT g.id, g.name, g.description, g.is_required, g.min_select, g.max_select, g.display_order
         FROM option_groups g
         JOIN menu_item_option_groups l ON l.option_group_id = g.id
         WHERE l.menu_item_id = ?
         ORDER BY g.display_order, g.id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let options = sqlx::query_as::<_, OptionRow>(
        "SELECT o.id, o.group_id, o.name, o.price, o.display_order
         FROM options o
         JOIN menu_item_option_groups l ON l.option_group_id = o.group_id
         WHERE l.menu_item_id = ?
         ORDER BY o.display_order, o.id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let option_groups = groups
        .into_iter()
        .map(|g| OptionGroup {
            options: options
                .iter()
                .filter(|o| o.group_id == g.id)
                .map(|o| MenuOption {
                    id: o.id,
                    group_id: o.group_id,
                    name: o.name.clone(),
                    price: from_cents(o.price),
                    display_order: o.display_order,
                })
                .collect(),
            id: g.id,
            name: g.name,
            description: g.description,
            is_required: g.is_required,
            min_select: g.min_select,
            max_select: g.max_select,
            display_order: g.display_order,
        })
        .collect();

    Ok(MenuItemDetail {
        item,
        option_groups,
    })
}

async fn ensure_category(
    conn: &mut SqliteConnection,
    category_id: Option<i64>,
) -> ServiceResult<()> {
    let Some(id) = category_id else {
        return Ok(());
    };
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    if exists.is_none() {
        return Err(AppError::new(ErrorCode::CategoryNotFound)
            .with_detail("categoryId", id)
            .into());
    }
    Ok(())
}

pub async fn create_menu_item(pool: &SqlitePool, data: &MenuItemCreate) -> ServiceResult<MenuItem> {
    let name = data.name.trim();
    if name.is_empty() {
        return Err(AppError::required("name").into());
    }
    let price = price_to_cents(data.price)?;
    let now = now_millis();

    let mut tx = super::begin_write(pool).await?;
    ensure_category(&mut tx, data.category_id).await?;

    let sql = format!(
        "INSERT INTO menu_items (name, description, price, image_url, category_id, is_available, display_order, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING {ITEM_COLUMNS}"
    );
    let row = sqlx::query_as::<_, MenuItemRow>(&sql)
        .bind(name)
        .bind(&data.description)
        .bind(price)
        .bind(&data.image_url)
        .bind(data.category_id)
        .bind(data.is_available.unwrap_or(true))
        .bind(data.display_order.unwrap_or(0))
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

    for group_id in &data.option_group_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO menu_item_option_groups (menu_item_id, option_group_id) VALUES (?, ?)",
        )
        .bind(row.id)
        .bind(group_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::info!(menu_item_id = row.id, name = %row.name, "Menu item created");
    Ok(row.into())
}

/// Partial update; prices already copied into carts and orders are untouched
pub async fn update_menu_item(
    pool: &SqlitePool,
    id: i64,
    data: &MenuItemUpdate,
) -> ServiceResult<MenuItem> {
    let price = data.price.map(price_to_cents).transpose()?;
    if let Some(name) = &data.name
        && name.trim().is_empty()
    {
        return Err(AppError::validation("name must not be empty").into());
    }

    let mut tx = super::begin_write(pool).await?;
    ensure_category(&mut tx, data.category_id).await?;

    let sql = format!(
        "UPDATE menu_items SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            price = COALESCE(?, price),
            image_url = COALESCE(?, image_url),
            category_id = COALESCE(?, category_id),
            is_available = COALESCE(?, is_available),
            display_order = COALESCE(?, display_order),
            updated_at = ?
         WHERE id = ?
         RETURNING {ITEM_COLUMNS}"
    );
    let row = sqlx::query_as::<_, MenuItemRow>(&sql)
        .bind(data.name.as_deref().map(str::trim))
        .bind(&data.description)
        .bind(price)
        .bind(&data.image_url)
        .bind(data.category_id)
        .bind(data.is_available)
        .bind(data.display_order)
        .bind(now_millis())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MenuItemNotFound).with_detail("id", id))?;

    tx.commit().await?;
    tracing::info!(menu_item_id = id, "Menu item updated");
    Ok(row.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    async fn attach_group(pool: &SqlitePool, item_id: i64, name: &str, order: i64) -> i64 {
        let now = now_millis();
        let group_id: i64 = sqlx::query_scalar(
            "INSERT INTO option_groups (name, display_order, created_at, updated_at) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(name)
        .bind(order)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO menu_item_option_groups (menu_item_id, option_group_id) VALUES (?, ?)")
            .bind(item_id)
            .bind(group_id)
            .execute(pool)
            .await
            .unwrap();
        group_id
    }

    async fn add_option(pool: &SqlitePool, group_id: i64, name: &str, price: i64, order: i64) {
        let now = now_millis();
        sqlx::query(
            "INSERT INTO options (group_id, name, price, display_order, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(group_id)
        .bind(name)
        .bind(price)
        .bind(order)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_list_categories_ordered_and_active_only() {
        let pool = test_support::pool().await;
        test_support::category(&pool, "Drinks", 2).await;
        test_support::category(&pool, "Mains", 1).await;
        let hidden = test_support::category(&pool, "Hidden", 0).await;
        sqlx::query("UPDATE categories SET is_active = 0 WHERE id = ?")
            .bind(hidden)
            .execute(&pool)
            .await
            .unwrap();

        let names: Vec<String> = list_categories(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Mains", "Drinks"]);
    }

    #[tokio::test]
    async fn test_list_menu_items_filters_by_category_and_availability() {
        let pool = test_support::pool().await;
        let mains = test_support::category(&pool, "Mains", 1).await;
        let a = test_support::menu_item(&pool, "Noodles", 1800).await;
        let b = test_support::menu_item(&pool, "Sold out", 900).await;
        test_support::menu_item(&pool, "Tea", 300).await;
        sqlx::query("UPDATE menu_items SET category_id = ? WHERE id IN (?, ?)")
            .bind(mains)
            .bind(a)
            .bind(b)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("UPDATE menu_items SET is_available = 0 WHERE id = ?")
            .bind(b)
            .execute(&pool)
            .await
            .unwrap();

        let all = list_menu_items(&pool, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let in_mains = list_menu_items(&pool, Some(mains)).await.unwrap();
        assert_eq!(in_mains.len(), 1);
        assert_eq!(in_mains[0].name, "Noodles");
        assert_eq!(in_mains[0].price.to_string(), "18.00");
    }

    #[tokio::test]
    async fn test_get_menu_item_with_option_groups() {
        let pool = test_support::pool().await;
        let item = test_support::menu_item(&pool, "Ramen", 1800).await;
        let size = attach_group(&pool, item, "Size", 2).await;
        let spice = attach_group(&pool, item, "Spice", 1).await;
        add_option(&pool, size, "Large", 300, 2).await;
        add_option(&pool, size, "Regular", 0, 1).await;
        add_option(&pool, spice, "Hot", 0, 1).await;

        let detail = get_menu_item(&pool, item).await.unwrap();
        assert_eq!(detail.item.name, "Ramen");
        let groups: Vec<&str> = detail.option_groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(groups, vec!["Spice", "Size"]);
        let sizes: Vec<&str> = detail.option_groups[1]
            .options
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(sizes, vec!["Regular", "Large"]);
        assert_eq!(detail.option_groups[1].options[1].price.to_string(), "3.00");
    }

    #[tokio::test]
    async fn test_get_missing_menu_item() {
        let pool = test_support::pool().await;
        let err: AppError = get_menu_item(&pool, 999).await.unwrap_err().into();
        assert_eq!(err.code, ErrorCode::MenuItemNotFound);
    }

    #[tokio::test]
    async fn test_create_and_update_menu_item() {
        let pool = test_support::pool().await;
        let created = create_menu_item(
            &pool,
            &MenuItemCreate {
                name: " Dumplings ".into(),
                description: None,
                price: Decimal::from_str("12.5").unwrap(),
                image_url: None,
                category_id: None,
                is_available: None,
                display_order: None,
                option_group_ids: vec![],
            },
        )
        .await
        .unwrap();
        assert_eq!(created.name, "Dumplings");
        assert_eq!(created.price.to_string(), "12.50");
        assert!(created.is_available);

        let updated = update_menu_item(
            &pool,
            created.id,
            &MenuItemUpdate {
                price: Some(Decimal::from_str("14.00").unwrap()),
                is_available: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.price.to_string(), "14.00");
        assert!(!updated.is_available);
        assert_eq!(updated.name, "Dumplings");
    }

    #[tokio::test]
    async fn test_create_menu_item_rejects_unknown_category() {
        let pool = test_support::pool().await;
        let err: AppError = create_menu_item(
            &pool,
            &MenuItemCreate {
                name: "Soup".into(),
                description: None,
                price: Decimal::ONE,
                image_url: None,
                category_id: Some(42),
                is_available: None,
                display_order: None,
                option_group_ids: vec![],
            },
        )
        .await
        .unwrap_err()
        .into();
        assert_eq!(err.code, ErrorCode::CategoryNotFound);
    }

    #[tokio::test]
    async fn test_update_missing_menu_item() {
        let pool = test_support::pool().await;
        let err: AppError = update_menu_item(&pool, 7, &MenuItemUpdate::default())
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::MenuItemNotFound);
    }
}
