use chrono::{DateTime, Utc};
use mathlingo_algo::{evaluate_subject, Certificate, CompletionEvaluation, LearnerView, SubjectId, UserId};
use std::collections::HashMap;

use crate::db::operations::certificates::NewCertificate;
use crate::services::{AdaptationEngine, EngineError, EngineResult};

/// Byte length of a verification hash before hex encoding.
pub const VERIFICATION_HASH_BYTES: usize = 32;

pub fn generate_verification_hash() -> String {
    let bytes: [u8; VERIFICATION_HASH_BYTES] = rand::random();
    hex::encode(bytes)
}

pub fn is_well_formed_hash(hash: &str) -> bool {
    hash.len() == VERIFICATION_HASH_BYTES * 2 && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

impl AdaptationEngine {
    pub async fn subject_progress(
        &self,
        user_id: UserId,
        subject_id: SubjectId,
    ) -> EngineResult<CompletionEvaluation> {
        self.subject_progress_at(user_id, subject_id, Utc::now()).await
    }

    /// Completion evaluation without issuing anything.
    pub async fn subject_progress_at(
        &self,
        user_id: UserId,
        subject_id: SubjectId,
        now: DateTime<Utc>,
    ) -> EngineResult<CompletionEvaluation> {
        self.require_user(user_id).await?;
        let subject = self
            .store()
            .get_subject(subject_id)
            .await?
            .ok_or_else(|| EngineError::not_found("subject", subject_id))?;
        let topics = self.store().get_topics_for_subject(subject_id).await?;
        let snapshot = self.load_snapshot(user_id, now).await?;

        let mut subjects = HashMap::with_capacity(1);
        subjects.insert(subject.id, subject.clone());
        let view = LearnerView::new(
            &subjects,
            &snapshot,
            now,
            &self.config().adaptation.topic_state,
        );
        Ok(evaluate_subject(&subject, &topics, &view))
    }

    pub async fn ensure_subject_certificate(
        &self,
        user_id: UserId,
        subject_id: SubjectId,
    ) -> EngineResult<Option<Certificate>> {
        self.ensure_subject_certificate_at(user_id, subject_id, Utc::now())
            .await
    }

    /// Returns the valid certificate for (user, subject), issuing one when the
    /// subject is complete. `None` when the subject is not complete yet.
    pub async fn ensure_subject_certificate_at(
        &self,
        user_id: UserId,
        subject_id: SubjectId,
        now: DateTime<Utc>,
    ) -> EngineResult<Option<Certificate>> {
        let evaluation = self.subject_progress_at(user_id, subject_id, now).await?;

        if let Some(existing) = self.store().get_valid_certificate(user_id, subject_id).await? {
            return Ok(Some(existing));
        }

        if !evaluation.completed {
            tracing::debug!(
                user_id,
                subject_id,
                average = evaluation.weighted_average,
                blocked = evaluation.blocked_topics().count(),
                "subject not complete"
            );
            return Ok(None);
        }

        let attempts = self.config().certificate_hash_attempts.max(1);
        for attempt in 1..=attempts {
            let hash = generate_verification_hash();
            if self.store().find_certificate_by_hash(&hash).await?.is_some() {
                tracing::warn!(attempt, "verification hash collision, retrying");
                continue;
            }

            let new_cert = NewCertificate {
                user_id,
                subject_id,
                avg_mastery: evaluation.weighted_average,
                verification_hash: hash,
                issued_at: now,
            };
            match self.store().insert_certificate(&new_cert).await {
                Ok(cert) => {
                    tracing::info!(
                        user_id,
                        subject_id,
                        certificate_id = cert.id,
                        avg_mastery = cert.avg_mastery,
                        "certificate issued"
                    );
                    return Ok(Some(cert));
                }
                Err(err) if is_unique_violation(&err) => {
                    // Lost a race with a concurrent issuer, or the hash collided.
                    if let Some(existing) =
                        self.store().get_valid_certificate(user_id, subject_id).await?
                    {
                        return Ok(Some(existing));
                    }
                    tracing::warn!(attempt, "certificate insert conflicted, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(EngineError::Internal(format!(
            "could not allocate a unique verification hash after {attempts} attempts"
        )))
    }

    pub async fn verify_certificate(&self, hash: &str) -> EngineResult<Option<Certificate>> {
        let hash = hash.trim().to_ascii_lowercase();
        if !is_well_formed_hash(&hash) {
            return Err(EngineError::Validation(
                "verification hash must be 64 hex characters".to_string(),
            ));
        }
        Ok(self.store().find_certificate_by_hash(&hash).await?)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
