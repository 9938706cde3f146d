use chrono::{DateTime, Utc};
use mathlingo_algo::{ModuleId, UserId};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::{format_timestamp, parse_timestamp, DatabaseProxy};

/// XP a learner has collected in one module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleProgress {
    pub user_id: UserId,
    pub module_id: ModuleId,
    pub xp: i64,
    pub updated_at: DateTime<Utc>,
}

/// Adds `xp` to the (user, module) row, creating it on first award.
pub async fn add_module_xp(
    proxy: &DatabaseProxy,
    user_id: UserId,
    module_id: ModuleId,
    xp: i64,
    at: DateTime<Utc>,
) -> Result<ModuleProgress, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO "module_progress" ("user_id", "module_id", "xp", "updated_at")
        VALUES (?, ?, ?, ?)
        ON CONFLICT ("user_id", "module_id") DO UPDATE SET
            "xp" = "module_progress"."xp" + excluded."xp",
            "updated_at" = excluded."updated_at"
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(module_id)
    .bind(xp)
    .bind(format_timestamp(at))
    .fetch_one(proxy.pool())
    .await?;
    map_progress(&row)
}

pub async fn get_module_progress(
    proxy: &DatabaseProxy,
    user_id: UserId,
) -> Result<Vec<ModuleProgress>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT * FROM "module_progress" WHERE "user_id" = ? ORDER BY "module_id" ASC"#,
    )
    .bind(user_id)
    .fetch_all(proxy.pool())
    .await?;
    rows.iter().map(map_progress).collect()
}

pub async fn total_xp(proxy: &DatabaseProxy, user_id: UserId) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT COALESCE(SUM("xp"), 0) FROM "module_progress" WHERE "user_id" = ?"#)
        .bind(user_id)
        .fetch_one(proxy.pool())
        .await
}

fn map_progress(row: &SqliteRow) -> Result<ModuleProgress, sqlx::Error> {
    let updated_at: String = row.try_get("updated_at")?;
    Ok(ModuleProgress {
        user_id: row.try_get("user_id")?,
        module_id: row.try_get("module_id")?,
        xp: row.try_get("xp")?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
