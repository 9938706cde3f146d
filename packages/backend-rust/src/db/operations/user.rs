use chrono::{DateTime, Utc};
use mathlingo_algo::UserId;

use crate::db::{format_timestamp, DatabaseProxy};

pub async fn insert_user(
    proxy: &DatabaseProxy,
    email: &str,
    now: DateTime<Utc>,
) -> Result<UserId, sqlx::Error> {
    let result = sqlx::query(r#"INSERT INTO "users" ("email", "created_at") VALUES (?, ?)"#)
        .bind(email.trim().to_ascii_lowercase())
        .bind(format_timestamp(now))
        .execute(proxy.pool())
        .await?;
    Ok(result.last_insert_rowid())
}

pub async fn find_user_by_email(
    proxy: &DatabaseProxy,
    email: &str,
) -> Result<Option<UserId>, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT "id" FROM "users" WHERE "email" = ? LIMIT 1"#)
        .bind(email.trim().to_ascii_lowercase())
        .fetch_optional(proxy.pool())
        .await
}

pub async fn user_exists(proxy: &DatabaseProxy, user_id: UserId) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar(r#"SELECT 1 FROM "users" WHERE "id" = ? LIMIT 1"#)
        .bind(user_id)
        .fetch_optional(proxy.pool())
        .await?;
    Ok(found.is_some())
}
