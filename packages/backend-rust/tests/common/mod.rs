#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use mathlingo_algo::{
    ExerciseId, MasteryRecord, ModuleId, SubjectId, TopicDependency, TopicId, UserId,
};
use mathlingo_backend::config::EngineConfig;
use mathlingo_backend::db::config::DbConfig;
use mathlingo_backend::db::operations::content::{NewExercise, NewSubject, NewTopic};
use mathlingo_backend::db::DatabaseProxy;
use mathlingo_backend::services::{AdaptationEngine, ContentService};
use mathlingo_backend::state::AppState;
use mathlingo_backend::store::LearningStore;

/// Fixed clock for deterministic tests; whole seconds survive the
/// millisecond timestamp round-trip.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

pub struct TestEnv {
    _dir: TempDir,
    pub proxy: Arc<DatabaseProxy>,
    pub engine: Arc<AdaptationEngine>,
    pub content: Arc<ContentService>,
}

impl TestEnv {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let config = DbConfig::for_path(&dir.path().join("mathlingo-test.db"));
        let proxy = DatabaseProxy::connect(config)
            .await
            .expect("connect test database");
        let store: Arc<dyn LearningStore> = proxy.clone();
        Self {
            _dir: dir,
            engine: Arc::new(AdaptationEngine::new(
                Arc::clone(&store),
                EngineConfig::default(),
            )),
            content: Arc::new(ContentService::new(store)),
            proxy,
        }
    }

    pub fn app(&self) -> Router {
        mathlingo_backend::build_app(AppState::new(
            Arc::clone(&self.proxy),
            EngineConfig::default(),
        ))
    }

    /// Subject with thresholds 0.65 / 0.75 / 0.85 and certificate 0.80.
    pub async fn subject(&self, name: &str) -> SubjectId {
        self.content
            .create_subject(&NewSubject {
                name: name.to_string(),
                description: None,
                threshold_c1: 0.65,
                threshold_c2: 0.75,
                threshold_c3: 0.85,
                certificate_threshold: 0.80,
            })
            .await
            .expect("create subject")
    }

    pub async fn module(&self, subject_id: SubjectId, name: &str) -> ModuleId {
        self.content
            .create_module(subject_id, name, 0)
            .await
            .expect("create module")
    }

    pub async fn topic(
        &self,
        subject_id: SubjectId,
        module_id: ModuleId,
        name: &str,
        criticality: i32,
    ) -> TopicId {
        self.content
            .create_topic(&NewTopic {
                subject_id,
                module_id,
                name: name.to_string(),
                description: None,
                difficulty_level: 0.5,
                criticality_level: criticality,
            })
            .await
            .expect("create topic")
    }

    pub async fn exercise(&self, topic_id: TopicId, difficulty: f64, answer: &str) -> ExerciseId {
        self.content
            .create_exercise(&NewExercise {
                topic_id,
                question: format!("question for topic {topic_id} at {difficulty}"),
                answer: answer.to_string(),
                difficulty,
            })
            .await
            .expect("create exercise")
    }

    pub async fn depends(&self, topic_id: TopicId, depends_on_id: TopicId) {
        self.content
            .add_dependency(TopicDependency {
                topic_id,
                depends_on_id,
            })
            .await
            .expect("add dependency");
    }

    pub async fn user(&self, email: &str) -> UserId {
        self.content
            .create_user(email, now())
            .await
            .expect("create user")
    }

    pub async fn set_mastery(
        &self,
        user_id: UserId,
        topic_id: TopicId,
        score: f64,
        last_updated: DateTime<Utc>,
    ) {
        self.proxy
            .import_mastery(&MasteryRecord {
                user_id,
                topic_id,
                mastery_score: score,
                last_updated,
            })
            .await
            .expect("import mastery");
    }
}
