use mathlingo_algo::{
    validate_edge, Exercise, ExerciseId, GraphError, Module, ModuleId, Subject, SubjectId, Topic,
    TopicDependency, TopicId,
};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};

use crate::db::DatabaseProxy;

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubject {
    pub name: String,
    pub description: Option<String>,
    pub threshold_c1: f64,
    pub threshold_c2: f64,
    pub threshold_c3: f64,
    pub certificate_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTopic {
    pub subject_id: SubjectId,
    pub module_id: ModuleId,
    pub name: String,
    pub description: Option<String>,
    pub difficulty_level: f64,
    pub criticality_level: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExercise {
    pub topic_id: TopicId,
    pub question: String,
    pub answer: String,
    pub difficulty: f64,
}

// ==================== Subjects ====================

pub async fn get_subjects(proxy: &DatabaseProxy) -> Result<Vec<Subject>, sqlx::Error> {
    let rows = sqlx::query(r#"SELECT * FROM "subjects" ORDER BY "id" ASC"#)
        .fetch_all(proxy.pool())
        .await?;
    rows.iter().map(map_subject).collect()
}

pub async fn get_subject(
    proxy: &DatabaseProxy,
    subject_id: SubjectId,
) -> Result<Option<Subject>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "subjects" WHERE "id" = ? LIMIT 1"#)
        .bind(subject_id)
        .fetch_optional(proxy.pool())
        .await?;
    row.as_ref().map(map_subject).transpose()
}

pub async fn find_subject_by_name(
    proxy: &DatabaseProxy,
    name: &str,
) -> Result<Option<SubjectId>, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT "id" FROM "subjects" WHERE "name" = ? LIMIT 1"#)
        .bind(name)
        .fetch_optional(proxy.pool())
        .await
}

pub async fn insert_subject(
    proxy: &DatabaseProxy,
    subject: &NewSubject,
) -> Result<SubjectId, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO "subjects" (
            "name", "description", "threshold_c1", "threshold_c2", "threshold_c3",
            "certificate_threshold"
        ) VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&subject.name)
    .bind(&subject.description)
    .bind(subject.threshold_c1)
    .bind(subject.threshold_c2)
    .bind(subject.threshold_c3)
    .bind(subject.certificate_threshold)
    .execute(proxy.pool())
    .await?;
    Ok(result.last_insert_rowid())
}

// ==================== Modules ====================

pub async fn get_modules(
    proxy: &DatabaseProxy,
    subject_id: SubjectId,
) -> Result<Vec<Module>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT * FROM "modules" WHERE "subject_id" = ? ORDER BY "position" ASC, "id" ASC"#,
    )
    .bind(subject_id)
    .fetch_all(proxy.pool())
    .await?;
    rows.iter().map(map_module).collect()
}

pub async fn get_all_modules(proxy: &DatabaseProxy) -> Result<Vec<Module>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT * FROM "modules" ORDER BY "subject_id" ASC, "position" ASC, "id" ASC"#,
    )
    .fetch_all(proxy.pool())
    .await?;
    rows.iter().map(map_module).collect()
}

pub async fn get_module(
    proxy: &DatabaseProxy,
    module_id: ModuleId,
) -> Result<Option<Module>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "modules" WHERE "id" = ? LIMIT 1"#)
        .bind(module_id)
        .fetch_optional(proxy.pool())
        .await?;
    row.as_ref().map(map_module).transpose()
}

pub async fn insert_module(
    proxy: &DatabaseProxy,
    subject_id: SubjectId,
    name: &str,
    position: i32,
) -> Result<ModuleId, sqlx::Error> {
    let result = sqlx::query(
        r#"INSERT INTO "modules" ("subject_id", "name", "position") VALUES (?, ?, ?)"#,
    )
    .bind(subject_id)
    .bind(name)
    .bind(position)
    .execute(proxy.pool())
    .await?;
    Ok(result.last_insert_rowid())
}

// ==================== Topics ====================

pub async fn get_topics(proxy: &DatabaseProxy) -> Result<Vec<Topic>, sqlx::Error> {
    fetch_topics(proxy.pool()).await
}

async fn fetch_topics<'e, E>(executor: E) -> Result<Vec<Topic>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(r#"SELECT * FROM "topics" ORDER BY "id" ASC"#)
        .fetch_all(executor)
        .await?;
    rows.iter().map(map_topic).collect()
}

pub async fn get_topics_for_subject(
    proxy: &DatabaseProxy,
    subject_id: SubjectId,
) -> Result<Vec<Topic>, sqlx::Error> {
    let rows = sqlx::query(r#"SELECT * FROM "topics" WHERE "subject_id" = ? ORDER BY "id" ASC"#)
        .bind(subject_id)
        .fetch_all(proxy.pool())
        .await?;
    rows.iter().map(map_topic).collect()
}

pub async fn get_topic(
    proxy: &DatabaseProxy,
    topic_id: TopicId,
) -> Result<Option<Topic>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "topics" WHERE "id" = ? LIMIT 1"#)
        .bind(topic_id)
        .fetch_optional(proxy.pool())
        .await?;
    row.as_ref().map(map_topic).transpose()
}

pub async fn insert_topic(proxy: &DatabaseProxy, topic: &NewTopic) -> Result<TopicId, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO "topics" (
            "subject_id", "module_id", "name", "description", "difficulty_level",
            "criticality_level"
        ) VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(topic.subject_id)
    .bind(topic.module_id)
    .bind(&topic.name)
    .bind(&topic.description)
    .bind(topic.difficulty_level)
    .bind(topic.criticality_level)
    .execute(proxy.pool())
    .await?;
    Ok(result.last_insert_rowid())
}

// ==================== Dependencies ====================

pub async fn get_dependencies(proxy: &DatabaseProxy) -> Result<Vec<TopicDependency>, sqlx::Error> {
    fetch_dependencies(proxy.pool()).await
}

async fn fetch_dependencies<'e, E>(executor: E) -> Result<Vec<TopicDependency>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"SELECT "topic_id", "depends_on_id" FROM "topic_dependencies" ORDER BY "topic_id", "depends_on_id""#,
    )
    .fetch_all(executor)
    .await?;
    rows.iter()
        .map(|row| -> Result<TopicDependency, sqlx::Error> {
            Ok(TopicDependency {
                topic_id: row.try_get("topic_id")?,
                depends_on_id: row.try_get("depends_on_id")?,
            })
        })
        .collect()
}

/// Validates `edge` against the stored graph and inserts it in one transaction.
///
/// Bumping the graph revision first takes the database write lock, so the
/// graph read below cannot go stale before the insert. Two writers adding
/// opposite edges are serialized and the second one sees the cycle.
pub async fn insert_dependency_checked(
    proxy: &DatabaseProxy,
    edge: TopicDependency,
) -> Result<Result<(), GraphError>, sqlx::Error> {
    let mut tx = proxy.pool().begin().await?;

    sqlx::query(
        r#"
        INSERT INTO "_db_metadata" ("key", "value") VALUES ('graph_revision', '1')
        ON CONFLICT ("key") DO UPDATE SET "value" = CAST("value" AS INTEGER) + 1
        "#,
    )
    .execute(&mut *tx)
    .await?;

    let topics = fetch_topics(&mut *tx).await?;
    let edges = fetch_dependencies(&mut *tx).await?;
    if let Err(err) = validate_edge(&topics, &edges, edge) {
        tx.rollback().await?;
        return Ok(Err(err));
    }

    sqlx::query(r#"INSERT INTO "topic_dependencies" ("topic_id", "depends_on_id") VALUES (?, ?)"#)
        .bind(edge.topic_id)
        .bind(edge.depends_on_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(Ok(()))
}

// ==================== Exercises ====================

pub async fn get_exercises_for_topic(
    proxy: &DatabaseProxy,
    topic_id: TopicId,
) -> Result<Vec<Exercise>, sqlx::Error> {
    let rows = sqlx::query(r#"SELECT * FROM "exercises" WHERE "topic_id" = ? ORDER BY "id" ASC"#)
        .bind(topic_id)
        .fetch_all(proxy.pool())
        .await?;
    rows.iter().map(map_exercise).collect()
}

pub async fn get_exercise(
    proxy: &DatabaseProxy,
    exercise_id: ExerciseId,
) -> Result<Option<Exercise>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "exercises" WHERE "id" = ? LIMIT 1"#)
        .bind(exercise_id)
        .fetch_optional(proxy.pool())
        .await?;
    row.as_ref().map(map_exercise).transpose()
}

pub async fn get_lowest_exercise(proxy: &DatabaseProxy) -> Result<Option<Exercise>, sqlx::Error> {
    let row = sqlx::query(r#"SELECT * FROM "exercises" ORDER BY "id" ASC LIMIT 1"#)
        .fetch_optional(proxy.pool())
        .await?;
    row.as_ref().map(map_exercise).transpose()
}

pub async fn insert_exercise(
    proxy: &DatabaseProxy,
    exercise: &NewExercise,
) -> Result<ExerciseId, sqlx::Error> {
    let result = sqlx::query(
        r#"INSERT INTO "exercises" ("topic_id", "question", "answer", "difficulty") VALUES (?, ?, ?, ?)"#,
    )
    .bind(exercise.topic_id)
    .bind(&exercise.question)
    .bind(&exercise.answer)
    .bind(exercise.difficulty)
    .execute(proxy.pool())
    .await?;
    Ok(result.last_insert_rowid())
}

fn map_subject(row: &SqliteRow) -> Result<Subject, sqlx::Error> {
    Ok(Subject {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        threshold_c1: row.try_get("threshold_c1")?,
        threshold_c2: row.try_get("threshold_c2")?,
        threshold_c3: row.try_get("threshold_c3")?,
        certificate_threshold: row.try_get("certificate_threshold")?,
    })
}

fn map_module(row: &SqliteRow) -> Result<Module, sqlx::Error> {
    Ok(Module {
        id: row.try_get("id")?,
        subject_id: row.try_get("subject_id")?,
        name: row.try_get("name")?,
        position: row.try_get("position")?,
    })
}

fn map_topic(row: &SqliteRow) -> Result<Topic, sqlx::Error> {
    Ok(Topic {
        id: row.try_get("id")?,
        subject_id: row.try_get("subject_id")?,
        module_id: row.try_get("module_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        difficulty_level: row.try_get("difficulty_level")?,
        criticality_level: row.try_get("criticality_level")?,
    })
}

fn map_exercise(row: &SqliteRow) -> Result<Exercise, sqlx::Error> {
    Ok(Exercise {
        id: row.try_get("id")?,
        topic_id: row.try_get("topic_id")?,
        question: row.try_get("question")?,
        answer: row.try_get("answer")?,
        difficulty: row.try_get("difficulty")?,
    })
}
