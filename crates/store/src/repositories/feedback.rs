//! Feedback form entries.

use chrono::{DateTime, Utc};

use bloom_core::chat::{Feedback, NewFeedback};
use bloom_core::types::{FeedbackId, FeedbackStatus};

use crate::error::RepositoryError;
use crate::store::Store;

/// Repository for feedback.
pub struct FeedbackRepository<'a> {
    store: &'a Store,
}

impl<'a> FeedbackRepository<'a> {
    /// Create a new feedback repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Entries, newest first, optionally in one status.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list(
        &self,
        status: Option<FeedbackStatus>,
    ) -> Result<Vec<Feedback>, RepositoryError> {
        let mut entries: Vec<Feedback> = self
            .store
            .all::<Feedback>()
            .await?
            .into_iter()
            .filter(|f| status.is_none_or(|s| f.status == s))
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    /// Record a submission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for invalid input.
    pub async fn create(
        &self,
        input: NewFeedback,
        now: DateTime<Utc>,
    ) -> Result<Feedback, RepositoryError> {
        let feedback = input
            .into_feedback(now)
            .map_err(RepositoryError::validation)?;
        let feedback = self.store.insert(feedback).await?;
        tracing::info!(feedback_id = %feedback.id, rating = ?feedback.rating, "Feedback received");
        Ok(feedback)
    }

    /// Set the triage status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the entry does not exist.
    pub async fn set_status(
        &self,
        id: &FeedbackId,
        status: FeedbackStatus,
        now: DateTime<Utc>,
    ) -> Result<Feedback, RepositoryError> {
        self.store
            .update(id.as_str(), move |f: &mut Feedback| {
                f.set_status(status, now);
                Ok(())
            })
            .await
    }

    /// Delete an entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it does not exist.
    pub async fn delete(&self, id: &FeedbackId) -> Result<(), RepositoryError> {
        if self.store.delete::<Feedback>(id.as_str()).await? {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}
