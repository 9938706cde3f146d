use mathlingo_backend::db::config::DbConfig;
use mathlingo_backend::db::schema::SCHEMA_VERSION;
use mathlingo_backend::db::DatabaseProxy;
use mathlingo_backend::services::EngineError;

mod common;

use common::{now, TestEnv};

#[tokio::test]
async fn test_module_xp_accumulates_per_module() {
    let env = TestEnv::new().await;
    let subject = env.subject("Matemáticas").await;
    let arithmetic = env.module(subject, "Aritmética").await;
    let algebra = env.module(subject, "Álgebra").await;
    let user = env.user("ana@example.com").await;
    let other = env.user("luis@example.com").await;

    let first = env
        .engine
        .add_module_xp_at(user, arithmetic, 15, now())
        .await
        .unwrap();
    assert_eq!(first.xp, 15);
    assert_eq!(first.updated_at, now());

    let again = env
        .engine
        .add_module_xp_at(user, arithmetic, 5, now())
        .await
        .unwrap();
    assert_eq!(again.xp, 20);
    env.engine
        .add_module_xp_at(user, algebra, 7, now())
        .await
        .unwrap();
    env.engine
        .add_module_xp_at(other, algebra, 100, now())
        .await
        .unwrap();

    let summary = env.engine.progress_summary(user).await.unwrap();
    assert_eq!(summary.total_xp, 27);
    assert_eq!(summary.modules, 2);

    let rows = env.engine.module_progress(user).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].module_id, arithmetic);
}

#[tokio::test]
async fn test_module_xp_rejects_bad_input() {
    let env = TestEnv::new().await;
    let subject = env.subject("Matemáticas").await;
    let module = env.module(subject, "Aritmética").await;
    let user = env.user("ana@example.com").await;

    let err = env
        .engine
        .add_module_xp_at(user, module, -3, now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = env
        .engine
        .add_module_xp_at(user, 999, 3, now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let err = env
        .engine
        .add_module_xp_at(999, module, 3, now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let summary = env.engine.progress_summary(user).await.unwrap();
    assert_eq!(summary.total_xp, 0);
}

#[tokio::test]
async fn test_older_schema_is_upgraded_on_connect() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("upgrade.db");

    let proxy = DatabaseProxy::connect(DbConfig::for_path(&path)).await.unwrap();
    sqlx::query(r#"DROP TABLE "module_progress""#)
        .execute(proxy.pool())
        .await
        .unwrap();
    sqlx::query(r#"UPDATE "_db_metadata" SET "value" = '1.0.0' WHERE "key" = 'schema_version'"#)
        .execute(proxy.pool())
        .await
        .unwrap();
    proxy.pool().close().await;

    let proxy = DatabaseProxy::connect(DbConfig::for_path(&path)).await.unwrap();
    let version: String = sqlx::query_scalar(
        r#"SELECT "value" FROM "_db_metadata" WHERE "key" = 'schema_version'"#,
    )
    .fetch_one(proxy.pool())
    .await
    .unwrap();
    assert_eq!(version, SCHEMA_VERSION);

    let table: Option<String> = sqlx::query_scalar(
        r#"SELECT "name" FROM "sqlite_master" WHERE "type" = 'table' AND "name" = 'module_progress'"#,
    )
    .fetch_optional(proxy.pool())
    .await
    .unwrap();
    assert!(table.is_some());
}
