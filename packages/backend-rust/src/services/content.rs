use std::sync::Arc;

use chrono::{DateTime, Utc};
use mathlingo_algo::sanitize::{is_unit_interval, is_valid_difficulty};
use mathlingo_algo::{
    DependencyGraph, ExerciseId, GraphError, Module, ModuleId, SubjectId, Topic, TopicDependency,
    TopicId, UserId, MAX_CRITICALITY, MIN_CRITICALITY,
};
use serde::Serialize;

use crate::db::operations::content::{NewExercise, NewSubject, NewTopic};
use crate::services::{EngineError, EngineResult};
use crate::store::LearningStore;

#[derive(Debug, Clone, Serialize)]
pub struct TopicOverview {
    #[serde(flatten)]
    pub topic: Topic,
    pub prerequisites: Vec<TopicId>,
    pub dependents: Vec<TopicId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleDetail {
    #[serde(flatten)]
    pub module: Module,
    pub topics: Vec<Topic>,
}

/// Validated writes for subjects, topics, exercises, dependencies and users.
pub struct ContentService {
    store: Arc<dyn LearningStore>,
}

impl ContentService {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }

    pub async fn create_subject(&self, subject: &NewSubject) -> EngineResult<SubjectId> {
        require_text("subject name", &subject.name)?;
        for (field, value) in [
            ("threshold_c1", subject.threshold_c1),
            ("threshold_c2", subject.threshold_c2),
            ("threshold_c3", subject.threshold_c3),
            ("certificate_threshold", subject.certificate_threshold),
        ] {
            if !is_unit_interval(value) {
                return Err(EngineError::Validation(format!(
                    "{field} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(self.store.insert_subject(subject).await?)
    }

    pub async fn create_module(
        &self,
        subject_id: SubjectId,
        name: &str,
        position: i32,
    ) -> EngineResult<ModuleId> {
        require_text("module name", name)?;
        self.require_subject(subject_id).await?;
        Ok(self.store.insert_module(subject_id, name.trim(), position).await?)
    }

    pub async fn create_topic(&self, topic: &NewTopic) -> EngineResult<TopicId> {
        require_text("topic name", &topic.name)?;
        if !(MIN_CRITICALITY..=MAX_CRITICALITY).contains(&topic.criticality_level) {
            return Err(EngineError::Validation(format!(
                "criticality_level must be 1, 2 or 3, got {}",
                topic.criticality_level
            )));
        }
        self.require_subject(topic.subject_id).await?;
        let modules = self.store.get_modules(topic.subject_id).await?;
        if !modules.iter().any(|m| m.id == topic.module_id) {
            return Err(EngineError::Validation(format!(
                "module {} does not belong to subject {}",
                topic.module_id, topic.subject_id
            )));
        }
        Ok(self.store.insert_topic(topic).await?)
    }

    pub async fn create_exercise(&self, exercise: &NewExercise) -> EngineResult<ExerciseId> {
        require_text("question", &exercise.question)?;
        require_text("answer", &exercise.answer)?;
        if !is_valid_difficulty(exercise.difficulty) {
            return Err(EngineError::Validation(format!(
                "difficulty must be within [0.1, 2.0], got {}",
                exercise.difficulty
            )));
        }
        if self.store.get_topic(exercise.topic_id).await?.is_none() {
            return Err(EngineError::not_found("topic", exercise.topic_id));
        }
        Ok(self.store.insert_exercise(exercise).await?)
    }

    /// Adds `topic_id -> depends_on_id`. Validation and insert share one
    /// write transaction, so concurrent writers cannot close a cycle.
    pub async fn add_dependency(&self, edge: TopicDependency) -> EngineResult<()> {
        self.store
            .insert_dependency(edge)
            .await?
            .map_err(graph_error)?;
        tracing::info!(
            topic_id = edge.topic_id,
            depends_on_id = edge.depends_on_id,
            "dependency added"
        );
        Ok(())
    }

    pub async fn create_user(&self, email: &str, now: DateTime<Utc>) -> EngineResult<UserId> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(EngineError::Validation(format!("invalid email: {email}")));
        }
        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(EngineError::InvalidState(format!("user {email} already exists")));
        }
        Ok(self.store.insert_user(email, now).await?)
    }

    pub async fn list_topics(&self) -> EngineResult<Vec<TopicOverview>> {
        let topics = self.store.get_topics().await?;
        let edges = self.store.get_dependencies().await?;
        let graph = DependencyGraph::from_edges(&topics, &edges);
        Ok(topics
            .into_iter()
            .map(|topic| TopicOverview {
                prerequisites: graph.prerequisites(topic.id).to_vec(),
                dependents: graph.dependents_of(topic.id).to_vec(),
                topic,
            })
            .collect())
    }

    /// Modules of one subject, or of every subject when `subject_id` is `None`.
    pub async fn list_modules(&self, subject_id: Option<SubjectId>) -> EngineResult<Vec<Module>> {
        match subject_id {
            Some(subject_id) => {
                self.require_subject(subject_id).await?;
                Ok(self.store.get_modules(subject_id).await?)
            }
            None => Ok(self.store.get_all_modules().await?),
        }
    }

    pub async fn get_module(&self, module_id: ModuleId) -> EngineResult<ModuleDetail> {
        let module = self
            .store
            .get_module(module_id)
            .await?
            .ok_or_else(|| EngineError::not_found("module", module_id))?;
        let topics = self
            .store
            .get_topics_for_subject(module.subject_id)
            .await?
            .into_iter()
            .filter(|t| t.module_id == module_id)
            .collect();
        Ok(ModuleDetail { module, topics })
    }

    async fn require_subject(&self, subject_id: SubjectId) -> EngineResult<()> {
        match self.store.get_subject(subject_id).await? {
            Some(_) => Ok(()),
            None => Err(EngineError::not_found("subject", subject_id)),
        }
    }
}

fn require_text(field: &str, value: &str) -> EngineResult<()> {
    if value.trim().is_empty() {
        Err(EngineError::Validation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

fn graph_error(err: GraphError) -> EngineError {
    match err {
        GraphError::UnknownTopic(id) => EngineError::not_found("topic", id),
        GraphError::SelfLoop(_) => EngineError::Validation(err.to_string()),
        GraphError::CrossSubject { .. }
        | GraphError::Duplicate { .. }
        | GraphError::Cycle { .. } => EngineError::InvalidState(err.to_string()),
    }
}
