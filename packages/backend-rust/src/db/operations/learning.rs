use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mathlingo_algo::{ExerciseId, MasteryRecord, TopicId, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::{format_timestamp, parse_timestamp, DatabaseProxy};

/// Input for the attempt + mastery transaction.
#[derive(Debug, Clone, Copy)]
pub struct AttemptWrite {
    pub user_id: UserId,
    pub exercise_id: ExerciseId,
    pub topic_id: TopicId,
    pub is_correct: bool,
    pub at: DateTime<Utc>,
}

/// Result of the attempt + mastery transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedAttempt {
    pub attempt_id: i64,
    pub previous_score: f64,
    pub new_score: f64,
}

pub async fn get_mastery(
    proxy: &DatabaseProxy,
    user_id: UserId,
    topic_id: TopicId,
) -> Result<Option<MasteryRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT * FROM "user_mastery" WHERE "user_id" = ? AND "topic_id" = ? LIMIT 1"#,
    )
    .bind(user_id)
    .bind(topic_id)
    .fetch_optional(proxy.pool())
    .await?;
    row.as_ref().map(map_mastery).transpose()
}

pub async fn get_user_mastery(
    proxy: &DatabaseProxy,
    user_id: UserId,
) -> Result<Vec<MasteryRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT * FROM "user_mastery" WHERE "user_id" = ? ORDER BY "topic_id" ASC"#,
    )
    .bind(user_id)
    .fetch_all(proxy.pool())
    .await?;
    rows.iter().map(map_mastery).collect()
}

/// Records the attempt and moves the (user, topic) score in one transaction.
///
/// The idempotent insert runs before the read so the transaction holds the
/// database write lock while computing the new score. Concurrent submissions
/// for the same pair therefore apply one after the other.
pub async fn apply_attempt(
    proxy: &DatabaseProxy,
    write: AttemptWrite,
    update: &(dyn Fn(f64) -> f64 + Send + Sync),
) -> Result<AppliedAttempt, sqlx::Error> {
    let at = format_timestamp(write.at);
    let mut tx = proxy.pool().begin().await?;

    sqlx::query(
        r#"
        INSERT INTO "user_mastery" ("user_id", "topic_id", "mastery_score", "last_updated")
        VALUES (?, ?, 0.0, ?)
        ON CONFLICT ("user_id", "topic_id") DO NOTHING
        "#,
    )
    .bind(write.user_id)
    .bind(write.topic_id)
    .bind(&at)
    .execute(&mut *tx)
    .await?;

    let previous_score: f64 = sqlx::query_scalar(
        r#"SELECT "mastery_score" FROM "user_mastery" WHERE "user_id" = ? AND "topic_id" = ?"#,
    )
    .bind(write.user_id)
    .bind(write.topic_id)
    .fetch_one(&mut *tx)
    .await?;

    let new_score = update(previous_score);

    sqlx::query(
        r#"
        UPDATE "user_mastery" SET "mastery_score" = ?, "last_updated" = ?
        WHERE "user_id" = ? AND "topic_id" = ?
        "#,
    )
    .bind(new_score)
    .bind(&at)
    .bind(write.user_id)
    .bind(write.topic_id)
    .execute(&mut *tx)
    .await?;

    let attempt_id = sqlx::query(
        r#"INSERT INTO "attempts" ("user_id", "exercise_id", "is_correct", "created_at") VALUES (?, ?, ?, ?)"#,
    )
    .bind(write.user_id)
    .bind(write.exercise_id)
    .bind(write.is_correct)
    .bind(&at)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;

    Ok(AppliedAttempt {
        attempt_id,
        previous_score,
        new_score,
    })
}

/// Writes a score directly, for seeding and data migration.
pub async fn import_mastery(
    proxy: &DatabaseProxy,
    record: &MasteryRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO "user_mastery" ("user_id", "topic_id", "mastery_score", "last_updated")
        VALUES (?, ?, ?, ?)
        ON CONFLICT ("user_id", "topic_id") DO UPDATE SET
            "mastery_score" = excluded."mastery_score",
            "last_updated" = excluded."last_updated"
        "#,
    )
    .bind(record.user_id)
    .bind(record.topic_id)
    .bind(record.mastery_score)
    .bind(format_timestamp(record.last_updated))
    .execute(proxy.pool())
    .await?;
    Ok(())
}

pub async fn count_recent_correct_attempts(
    proxy: &DatabaseProxy,
    user_id: UserId,
    topic_id: TopicId,
    since: DateTime<Utc>,
) -> Result<u32, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM "attempts" a
        JOIN "exercises" e ON e."id" = a."exercise_id"
        WHERE a."user_id" = ? AND e."topic_id" = ? AND a."is_correct" = 1 AND a."created_at" >= ?
        "#,
    )
    .bind(user_id)
    .bind(topic_id)
    .bind(format_timestamp(since))
    .fetch_one(proxy.pool())
    .await?;
    Ok(count.max(0) as u32)
}

pub async fn recent_correct_by_topic(
    proxy: &DatabaseProxy,
    user_id: UserId,
    since: DateTime<Utc>,
) -> Result<HashMap<TopicId, u32>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT e."topic_id" AS "topic_id", COUNT(*) AS "correct" FROM "attempts" a
        JOIN "exercises" e ON e."id" = a."exercise_id"
        WHERE a."user_id" = ? AND a."is_correct" = 1 AND a."created_at" >= ?
        GROUP BY e."topic_id"
        "#,
    )
    .bind(user_id)
    .bind(format_timestamp(since))
    .fetch_all(proxy.pool())
    .await?;

    let mut counts = HashMap::with_capacity(rows.len());
    for row in &rows {
        let topic_id: TopicId = row.try_get("topic_id")?;
        let correct: i64 = row.try_get("correct")?;
        counts.insert(topic_id, correct.max(0) as u32);
    }
    Ok(counts)
}

pub async fn count_attempts(proxy: &DatabaseProxy, user_id: UserId) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM "attempts" WHERE "user_id" = ?"#)
        .bind(user_id)
        .fetch_one(proxy.pool())
        .await
}

fn map_mastery(row: &SqliteRow) -> Result<MasteryRecord, sqlx::Error> {
    let last_updated: String = row.try_get("last_updated")?;
    Ok(MasteryRecord {
        user_id: row.try_get("user_id")?,
        topic_id: row.try_get("topic_id")?,
        mastery_score: row.try_get("mastery_score")?,
        last_updated: parse_timestamp(&last_updated)?,
    })
}
