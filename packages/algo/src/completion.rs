//! Subject Completion
//!
//! A subject is complete when it has topics, every topic is dominated and
//! fresh (or revalidated), and the criticality-weighted mastery average
//! reaches the subject's certificate threshold.

use serde::{Deserialize, Serialize};

use crate::sanitize::clamp_criticality;
use crate::topic_state::{is_dominated, needs_revalidation, threshold, LearnerView};
use crate::types::{Subject, SubjectId, Topic, TopicId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionBlocker {
    NoMastery,
    BelowThreshold,
    NeedsRevalidation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicCompletion {
    pub topic_id: TopicId,
    pub score: f64,
    pub threshold: f64,
    pub criticality: i32,
    pub blocker: Option<CompletionBlocker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEvaluation {
    pub subject_id: SubjectId,
    pub weighted_average: f64,
    pub certificate_threshold: f64,
    pub completed: bool,
    pub topics: Vec<TopicCompletion>,
}

impl CompletionEvaluation {
    pub fn blocked_topics(&self) -> impl Iterator<Item = &TopicCompletion> {
        self.topics.iter().filter(|t| t.blocker.is_some())
    }
}

/// `Σ(score·crit) / Σcrit`, unseen topics contribute 0. Empty input gives 0.
pub fn weighted_subject_mastery(topics: &[Topic], view: &LearnerView<'_>) -> f64 {
    let (weighted, total) = topics.iter().fold((0.0, 0.0), |(sum, weight), topic| {
        let crit = clamp_criticality(topic.criticality_level) as f64;
        (sum + view.score(topic.id) * crit, weight + crit)
    });
    if total > 0.0 {
        weighted / total
    } else {
        0.0
    }
}

fn blocker_for(topic: &Topic, threshold: f64, view: &LearnerView<'_>) -> Option<CompletionBlocker> {
    let record = view.record(topic.id)?;
    if !is_dominated(record.mastery_score, threshold) {
        return Some(CompletionBlocker::BelowThreshold);
    }
    if needs_revalidation(
        Some(record),
        view.recent_correct(topic.id),
        view.now(),
        view.config(),
    ) {
        return Some(CompletionBlocker::NeedsRevalidation);
    }
    None
}

/// `topics` must be the subject's own topics.
pub fn evaluate_subject(
    subject: &Subject,
    topics: &[Topic],
    view: &LearnerView<'_>,
) -> CompletionEvaluation {
    let topic_results: Vec<TopicCompletion> = topics
        .iter()
        .map(|topic| {
            let threshold = threshold(subject, topic.criticality_level);
            let blocker = match view.record(topic.id) {
                None => Some(CompletionBlocker::NoMastery),
                Some(_) => blocker_for(topic, threshold, view),
            };
            TopicCompletion {
                topic_id: topic.id,
                score: view.score(topic.id),
                threshold,
                criticality: clamp_criticality(topic.criticality_level),
                blocker,
            }
        })
        .collect();

    let weighted_average = weighted_subject_mastery(topics, view);
    let completed = !topic_results.is_empty()
        && topic_results.iter().all(|t| t.blocker.is_none())
        && weighted_average >= subject.certificate_threshold;

    CompletionEvaluation {
        subject_id: subject.id,
        weighted_average,
        certificate_threshold: subject.certificate_threshold,
        completed,
        topics: topic_results,
    }
}
