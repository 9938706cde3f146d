//! Storage contract consumed by the services.
//!
//! `DatabaseProxy` implements it over SQLite. Every call is a fresh read;
//! nothing is cached between requests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mathlingo_algo::{
    Certificate, Exercise, ExerciseId, GraphError, MasteryRecord, Module, ModuleId, Subject,
    SubjectId, Topic, TopicDependency, TopicId, UserId,
};

use crate::db::operations::certificates::{self, NewCertificate};
use crate::db::operations::content::{self, NewExercise, NewSubject, NewTopic};
use crate::db::operations::learning::{self, AppliedAttempt, AttemptWrite};
use crate::db::operations::progress::{self, ModuleProgress};
use crate::db::operations::user;
use crate::db::DatabaseProxy;

pub type StoreResult<T> = Result<T, sqlx::Error>;

/// Maps the stored score to the new one inside the attempt transaction.
pub type ScoreUpdate<'a> = &'a (dyn Fn(f64) -> f64 + Send + Sync);

#[async_trait]
pub trait LearningStore: Send + Sync {
    // Content
    async fn get_subjects(&self) -> StoreResult<Vec<Subject>>;
    async fn get_subject(&self, subject_id: SubjectId) -> StoreResult<Option<Subject>>;
    async fn find_subject_by_name(&self, name: &str) -> StoreResult<Option<SubjectId>>;
    async fn get_modules(&self, subject_id: SubjectId) -> StoreResult<Vec<Module>>;
    async fn get_all_modules(&self) -> StoreResult<Vec<Module>>;
    async fn get_module(&self, module_id: ModuleId) -> StoreResult<Option<Module>>;
    async fn get_topics(&self) -> StoreResult<Vec<Topic>>;
    async fn get_topics_for_subject(&self, subject_id: SubjectId) -> StoreResult<Vec<Topic>>;
    async fn get_topic(&self, topic_id: TopicId) -> StoreResult<Option<Topic>>;
    async fn get_dependencies(&self) -> StoreResult<Vec<TopicDependency>>;
    async fn get_exercises_for_topic(&self, topic_id: TopicId) -> StoreResult<Vec<Exercise>>;
    async fn get_exercise(&self, exercise_id: ExerciseId) -> StoreResult<Option<Exercise>>;
    async fn get_lowest_exercise(&self) -> StoreResult<Option<Exercise>>;

    async fn insert_subject(&self, subject: &NewSubject) -> StoreResult<SubjectId>;
    async fn insert_module(
        &self,
        subject_id: SubjectId,
        name: &str,
        position: i32,
    ) -> StoreResult<ModuleId>;
    async fn insert_topic(&self, topic: &NewTopic) -> StoreResult<TopicId>;
    async fn insert_exercise(&self, exercise: &NewExercise) -> StoreResult<ExerciseId>;
    /// Validates and inserts atomically; the inner error is the graph rejection.
    async fn insert_dependency(
        &self,
        edge: TopicDependency,
    ) -> StoreResult<Result<(), GraphError>>;

    // Users
    async fn insert_user(&self, email: &str, now: DateTime<Utc>) -> StoreResult<UserId>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserId>>;
    async fn user_exists(&self, user_id: UserId) -> StoreResult<bool>;

    // Learner state
    async fn get_mastery(
        &self,
        user_id: UserId,
        topic_id: TopicId,
    ) -> StoreResult<Option<MasteryRecord>>;
    async fn get_user_mastery(&self, user_id: UserId) -> StoreResult<Vec<MasteryRecord>>;
    async fn add_module_xp(
        &self,
        user_id: UserId,
        module_id: ModuleId,
        xp: i64,
        at: DateTime<Utc>,
    ) -> StoreResult<ModuleProgress>;
    async fn get_module_progress(&self, user_id: UserId) -> StoreResult<Vec<ModuleProgress>>;
    async fn total_xp(&self, user_id: UserId) -> StoreResult<i64>;
    async fn apply_attempt(
        &self,
        write: AttemptWrite,
        update: ScoreUpdate<'_>,
    ) -> StoreResult<AppliedAttempt>;
    async fn import_mastery(&self, record: &MasteryRecord) -> StoreResult<()>;
    async fn count_recent_correct_attempts(
        &self,
        user_id: UserId,
        topic_id: TopicId,
        since: DateTime<Utc>,
    ) -> StoreResult<u32>;
    async fn recent_correct_by_topic(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> StoreResult<HashMap<TopicId, u32>>;

    // Certificates
    async fn get_valid_certificate(
        &self,
        user_id: UserId,
        subject_id: SubjectId,
    ) -> StoreResult<Option<Certificate>>;
    async fn find_certificate_by_hash(&self, hash: &str) -> StoreResult<Option<Certificate>>;
    async fn insert_certificate(&self, cert: &NewCertificate) -> StoreResult<Certificate>;
}

#[async_trait]
impl LearningStore for DatabaseProxy {
    async fn get_subjects(&self) -> StoreResult<Vec<Subject>> {
        content::get_subjects(self).await
    }

    async fn get_subject(&self, subject_id: SubjectId) -> StoreResult<Option<Subject>> {
        content::get_subject(self, subject_id).await
    }

    async fn find_subject_by_name(&self, name: &str) -> StoreResult<Option<SubjectId>> {
        content::find_subject_by_name(self, name).await
    }

    async fn get_modules(&self, subject_id: SubjectId) -> StoreResult<Vec<Module>> {
        content::get_modules(self, subject_id).await
    }

    async fn get_all_modules(&self) -> StoreResult<Vec<Module>> {
        content::get_all_modules(self).await
    }

    async fn get_module(&self, module_id: ModuleId) -> StoreResult<Option<Module>> {
        content::get_module(self, module_id).await
    }

    async fn get_topics(&self) -> StoreResult<Vec<Topic>> {
        content::get_topics(self).await
    }

    async fn get_topics_for_subject(&self, subject_id: SubjectId) -> StoreResult<Vec<Topic>> {
        content::get_topics_for_subject(self, subject_id).await
    }

    async fn get_topic(&self, topic_id: TopicId) -> StoreResult<Option<Topic>> {
        content::get_topic(self, topic_id).await
    }

    async fn get_dependencies(&self) -> StoreResult<Vec<TopicDependency>> {
        content::get_dependencies(self).await
    }

    async fn get_exercises_for_topic(&self, topic_id: TopicId) -> StoreResult<Vec<Exercise>> {
        content::get_exercises_for_topic(self, topic_id).await
    }

    async fn get_exercise(&self, exercise_id: ExerciseId) -> StoreResult<Option<Exercise>> {
        content::get_exercise(self, exercise_id).await
    }

    async fn get_lowest_exercise(&self) -> StoreResult<Option<Exercise>> {
        content::get_lowest_exercise(self).await
    }

    async fn insert_subject(&self, subject: &NewSubject) -> StoreResult<SubjectId> {
        content::insert_subject(self, subject).await
    }

    async fn insert_module(
        &self,
        subject_id: SubjectId,
        name: &str,
        position: i32,
    ) -> StoreResult<ModuleId> {
        content::insert_module(self, subject_id, name, position).await
    }

    async fn insert_topic(&self, topic: &NewTopic) -> StoreResult<TopicId> {
        content::insert_topic(self, topic).await
    }

    async fn insert_exercise(&self, exercise: &NewExercise) -> StoreResult<ExerciseId> {
        content::insert_exercise(self, exercise).await
    }

    async fn insert_dependency(
        &self,
        edge: TopicDependency,
    ) -> StoreResult<Result<(), GraphError>> {
        content::insert_dependency_checked(self, edge).await
    }

    async fn insert_user(&self, email: &str, now: DateTime<Utc>) -> StoreResult<UserId> {
        user::insert_user(self, email, now).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserId>> {
        user::find_user_by_email(self, email).await
    }

    async fn user_exists(&self, user_id: UserId) -> StoreResult<bool> {
        user::user_exists(self, user_id).await
    }

    async fn get_mastery(
        &self,
        user_id: UserId,
        topic_id: TopicId,
    ) -> StoreResult<Option<MasteryRecord>> {
        learning::get_mastery(self, user_id, topic_id).await
    }

    async fn get_user_mastery(&self, user_id: UserId) -> StoreResult<Vec<MasteryRecord>> {
        learning::get_user_mastery(self, user_id).await
    }

    async fn add_module_xp(
        &self,
        user_id: UserId,
        module_id: ModuleId,
        xp: i64,
        at: DateTime<Utc>,
    ) -> StoreResult<ModuleProgress> {
        progress::add_module_xp(self, user_id, module_id, xp, at).await
    }

    async fn get_module_progress(&self, user_id: UserId) -> StoreResult<Vec<ModuleProgress>> {
        progress::get_module_progress(self, user_id).await
    }

    async fn total_xp(&self, user_id: UserId) -> StoreResult<i64> {
        progress::total_xp(self, user_id).await
    }

    async fn apply_attempt(
        &self,
        write: AttemptWrite,
        update: ScoreUpdate<'_>,
    ) -> StoreResult<AppliedAttempt> {
        learning::apply_attempt(self, write, update).await
    }

    async fn import_mastery(&self, record: &MasteryRecord) -> StoreResult<()> {
        learning::import_mastery(self, record).await
    }

    async fn count_recent_correct_attempts(
        &self,
        user_id: UserId,
        topic_id: TopicId,
        since: DateTime<Utc>,
    ) -> StoreResult<u32> {
        learning::count_recent_correct_attempts(self, user_id, topic_id, since).await
    }

    async fn recent_correct_by_topic(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> StoreResult<HashMap<TopicId, u32>> {
        learning::recent_correct_by_topic(self, user_id, since).await
    }

    async fn get_valid_certificate(
        &self,
        user_id: UserId,
        subject_id: SubjectId,
    ) -> StoreResult<Option<Certificate>> {
        certificates::get_valid_certificate(self, user_id, subject_id).await
    }

    async fn find_certificate_by_hash(&self, hash: &str) -> StoreResult<Option<Certificate>> {
        certificates::find_certificate_by_hash(self, hash).await
    }

    async fn insert_certificate(&self, cert: &NewCertificate) -> StoreResult<Certificate> {
        certificates::insert_certificate(self, cert).await
    }
}
