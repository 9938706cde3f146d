use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mathlingo_algo::topic_state::revalidation_since;
use mathlingo_algo::{
    pick_exercise, rank_topics, update_score, DependencyGraph, Exercise, ExerciseId,
    LearnerSnapshot, LearnerView, MasteryRecord, Subject, SubjectId, Topic, TopicId, TopicRanking, UserId,
};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::db::operations::learning::AttemptWrite;
use crate::services::{EngineError, EngineResult};
use crate::store::LearningStore;

/// Everything loaded for one learner-scoped request.
pub(crate) struct LearnerContext {
    pub subjects: HashMap<SubjectId, Subject>,
    pub topics: Vec<Topic>,
    pub snapshot: LearnerSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptOutcome {
    pub attempt_id: i64,
    pub exercise_id: ExerciseId,
    pub topic_id: TopicId,
    pub is_correct: bool,
    pub correct_answer: String,
    pub previous_mastery_score: f64,
    pub new_mastery_score: f64,
    pub next_exercise_id: Option<ExerciseId>,
}

pub struct AdaptationEngine {
    store: Arc<dyn LearningStore>,
    config: EngineConfig,
}

impl AdaptationEngine {
    pub fn new(store: Arc<dyn LearningStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn LearningStore> {
        &self.store
    }

    pub(crate) async fn require_user(&self, user_id: UserId) -> EngineResult<()> {
        if self.store.user_exists(user_id).await? {
            Ok(())
        } else {
            Err(EngineError::not_found("user", user_id))
        }
    }

    pub(crate) async fn load_snapshot(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> EngineResult<LearnerSnapshot> {
        let since = revalidation_since(now, &self.config.adaptation.topic_state);
        let records = self.store.get_user_mastery(user_id).await?;
        let recent = self.store.recent_correct_by_topic(user_id, since).await?;
        Ok(LearnerSnapshot::from_records(records, recent))
    }

    pub(crate) async fn load_learner(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> EngineResult<LearnerContext> {
        let subjects = self
            .store
            .get_subjects()
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        let topics = self.store.get_topics().await?;
        let snapshot = self.load_snapshot(user_id, now).await?;
        Ok(LearnerContext {
            subjects,
            topics,
            snapshot,
        })
    }

    pub async fn user_mastery(&self, user_id: UserId) -> EngineResult<Vec<MasteryRecord>> {
        self.require_user(user_id).await?;
        Ok(self.store.get_user_mastery(user_id).await?)
    }

    pub async fn topic_ranking(&self, user_id: UserId) -> EngineResult<Vec<TopicRanking>> {
        self.topic_ranking_at(user_id, Utc::now()).await
    }

    /// Candidate topics in the order the selector would try them.
    pub async fn topic_ranking_at(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<TopicRanking>> {
        self.require_user(user_id).await?;
        let ctx = self.load_learner(user_id, now).await?;
        self.rank(&ctx, now).await
    }

    async fn rank(&self, ctx: &LearnerContext, now: DateTime<Utc>) -> EngineResult<Vec<TopicRanking>> {
        let edges = self.store.get_dependencies().await?;
        let graph = DependencyGraph::from_edges(&ctx.topics, &edges);
        let adaptation = &self.config.adaptation;
        let view = LearnerView::new(&ctx.subjects, &ctx.snapshot, now, &adaptation.topic_state);
        Ok(rank_topics(&ctx.topics, &graph, &view, &adaptation.selection))
    }

    pub async fn select_next_exercise(&self, user_id: UserId) -> EngineResult<Option<Exercise>> {
        self.select_next_exercise_at(user_id, Utc::now()).await
    }

    pub async fn select_next_exercise_at(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> EngineResult<Option<Exercise>> {
        self.require_user(user_id).await?;
        let ctx = self.load_learner(user_id, now).await?;
        if ctx.topics.is_empty() {
            tracing::debug!(user_id, "no topics, nothing to select");
            return Ok(None);
        }

        let rankings = self.rank(&ctx, now).await?;
        let selection = &self.config.adaptation.selection;
        for ranking in &rankings {
            let exercises = self.store.get_exercises_for_topic(ranking.topic_id).await?;
            if let Some(exercise) = pick_exercise(&exercises, ranking.score, selection) {
                tracing::debug!(
                    user_id,
                    topic_id = ranking.topic_id,
                    exercise_id = exercise.id,
                    urgency = ranking.urgency,
                    mastery = ranking.score,
                    "exercise selected"
                );
                return Ok(Some(exercise.clone()));
            }
        }

        let fallback = self.store.get_lowest_exercise().await?;
        if let Some(exercise) = &fallback {
            tracing::debug!(user_id, exercise_id = exercise.id, "ranked topics empty, using pool fallback");
        }
        Ok(fallback)
    }

    pub async fn record_attempt(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
        answer: &str,
    ) -> EngineResult<AttemptOutcome> {
        self.record_attempt_at(user_id, exercise_id, answer, Utc::now())
            .await
    }

    /// Grades `answer` against the stored one and applies the result.
    pub async fn record_attempt_at(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
        answer: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<AttemptOutcome> {
        let exercise = self.require_exercise(exercise_id).await?;
        let is_correct = answers_match(answer, &exercise.answer);
        self.apply(user_id, exercise, is_correct, now).await
    }

    pub async fn record_attempt_result(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
        is_correct: bool,
    ) -> EngineResult<AttemptOutcome> {
        self.record_attempt_result_at(user_id, exercise_id, is_correct, Utc::now())
            .await
    }

    /// Applies a result graded by the client.
    pub async fn record_attempt_result_at(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
        is_correct: bool,
        now: DateTime<Utc>,
    ) -> EngineResult<AttemptOutcome> {
        let exercise = self.require_exercise(exercise_id).await?;
        self.apply(user_id, exercise, is_correct, now).await
    }

    async fn require_exercise(&self, exercise_id: ExerciseId) -> EngineResult<Exercise> {
        self.store
            .get_exercise(exercise_id)
            .await?
            .ok_or_else(|| EngineError::not_found("exercise", exercise_id))
    }

    async fn apply(
        &self,
        user_id: UserId,
        exercise: Exercise,
        is_correct: bool,
        now: DateTime<Utc>,
    ) -> EngineResult<AttemptOutcome> {
        self.require_user(user_id).await?;
        let topic = self.store.get_topic(exercise.topic_id).await?.ok_or_else(|| {
            EngineError::InvalidState(format!(
                "exercise {} references missing topic {}",
                exercise.id, exercise.topic_id
            ))
        })?;

        let params = self.config.adaptation.mastery.clone();
        let difficulty = exercise.difficulty;
        let criticality = topic.criticality_level;
        let update =
            move |old: f64| update_score(old, is_correct, difficulty, criticality, &params).score;

        let applied = self
            .store
            .apply_attempt(
                AttemptWrite {
                    user_id,
                    exercise_id: exercise.id,
                    topic_id: topic.id,
                    is_correct,
                    at: now,
                },
                &update,
            )
            .await?;

        tracing::info!(
            user_id,
            topic_id = topic.id,
            exercise_id = exercise.id,
            is_correct,
            previous = applied.previous_score,
            score = applied.new_score,
            "attempt recorded"
        );

        let next_exercise_id = self
            .select_next_exercise_at(user_id, now)
            .await?
            .map(|e| e.id);

        Ok(AttemptOutcome {
            attempt_id: applied.attempt_id,
            exercise_id: exercise.id,
            topic_id: topic.id,
            is_correct,
            correct_answer: exercise.answer,
            previous_mastery_score: applied.previous_score,
            new_mastery_score: applied.new_score,
            next_exercise_id,
        })
    }
}

/// Case-insensitive comparison with collapsed whitespace.
pub fn answers_match(given: &str, expected: &str) -> bool {
    normalize_answer(given) == normalize_answer(expected)
}

fn normalize_answer(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers_match_normalizes() {
        assert!(answers_match("  X = 4 ", "x = 4"));
        assert!(answers_match("Teorema  de\tPitágoras", "teorema de pitágoras"));
        assert!(!answers_match("x=4", "x = 4"));
        assert!(!answers_match("", "0"));
    }
}
