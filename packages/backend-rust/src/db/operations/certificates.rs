use chrono::{DateTime, Utc};
use mathlingo_algo::{Certificate, CertificateStatus, SubjectId, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::{format_timestamp, parse_timestamp, DatabaseProxy};

#[derive(Debug, Clone)]
pub struct NewCertificate {
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub avg_mastery: f64,
    pub verification_hash: String,
    pub issued_at: DateTime<Utc>,
}

pub async fn get_valid_certificate(
    proxy: &DatabaseProxy,
    user_id: UserId,
    subject_id: SubjectId,
) -> Result<Option<Certificate>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT * FROM "certificates"
        WHERE "user_id" = ? AND "subject_id" = ? AND "status" = 'valid'
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(subject_id)
    .fetch_optional(proxy.pool())
    .await?;
    row.as_ref().map(map_certificate).transpose()
}

pub async fn find_certificate_by_hash(
    proxy: &DatabaseProxy,
    hash: &str,
) -> Result<Option<Certificate>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "certificates" WHERE "verification_hash" = ? LIMIT 1"#)
        .bind(hash)
        .fetch_optional(proxy.pool())
        .await?;
    row.as_ref().map(map_certificate).transpose()
}

pub async fn insert_certificate(
    proxy: &DatabaseProxy,
    cert: &NewCertificate,
) -> Result<Certificate, sqlx::Error> {
    let id = sqlx::query(
        r#"
        INSERT INTO "certificates" (
            "user_id", "subject_id", "avg_mastery", "verification_hash", "status", "issued_at"
        ) VALUES (?, ?, ?, ?, 'valid', ?)
        "#,
    )
    .bind(cert.user_id)
    .bind(cert.subject_id)
    .bind(cert.avg_mastery)
    .bind(&cert.verification_hash)
    .bind(format_timestamp(cert.issued_at))
    .execute(proxy.pool())
    .await?
    .last_insert_rowid();

    let row = sqlx::query(r#"SELECT * FROM "certificates" WHERE "id" = ?"#)
        .bind(id)
        .fetch_one(proxy.pool())
        .await?;
    map_certificate(&row)
}

pub async fn count_certificates(
    proxy: &DatabaseProxy,
    user_id: UserId,
    subject_id: SubjectId,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM "certificates" WHERE "user_id" = ? AND "subject_id" = ?"#,
    )
    .bind(user_id)
    .bind(subject_id)
    .fetch_one(proxy.pool())
    .await
}

fn map_certificate(row: &SqliteRow) -> Result<Certificate, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let issued_at: String = row.try_get("issued_at")?;
    Ok(Certificate {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        subject_id: row.try_get("subject_id")?,
        avg_mastery: row.try_get("avg_mastery")?,
        verification_hash: row.try_get("verification_hash")?,
        status: CertificateStatus::parse(&status).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: format!("unknown certificate status {status}").into(),
        })?,
        issued_at: parse_timestamp(&issued_at)?,
    })
}
