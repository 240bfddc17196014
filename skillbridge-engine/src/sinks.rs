//! Downstream collaborators and the per-user generation job
//!
//! The engine only invokes these traits. Storage and notification delivery
//! belong to the host application.

use crate::orchestrator::RoadmapOrchestrator;
use async_trait::async_trait;
use serde::Serialize;
use skillbridge_core::{GeneratedRoadmap, RoadmapRequest, SinkError};
use std::sync::Arc;

/// Stores a generated roadmap against a user record.
#[async_trait]
pub trait RoadmapSink: Send + Sync {
    /// Persist `roadmap` and return the id of the stored record.
    async fn persist(&self, user_id: &str, roadmap: &GeneratedRoadmap) -> Result<String, SinkError>;
}

/// Delivers user-facing notices.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, user_id: &str, notification: Notification) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub content: String,
}

impl Notification {
    pub fn roadmap_ready(roadmap: &GeneratedRoadmap) -> Self {
        let origin = if roadmap.generated_by.is_ai() {
            "It was generated with AI assistance."
        } else {
            "It was assembled from our curated catalog."
        };
        Self {
            kind: NotificationKind::Success,
            content: format!(
                "Your personalized {} roadmap has been generated! {} Start your learning journey today.",
                roadmap.domain, origin
            ),
        }
    }

    pub fn generation_failed() -> Self {
        Self {
            kind: NotificationKind::Error,
            content: "Sorry, we encountered an error saving your roadmap. \
                      Please try again or contact support."
                .to_string(),
        }
    }
}

/// Result of a successful [`RoadmapJob::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub record_id: String,
    pub roadmap: GeneratedRoadmap,
}

/// Generate, persist and notify for one user.
pub struct RoadmapJob {
    engine: Arc<RoadmapOrchestrator>,
    store: Arc<dyn RoadmapSink>,
    notifier: Arc<dyn NotificationSink>,
}

impl RoadmapJob {
    pub fn new(
        engine: Arc<RoadmapOrchestrator>,
        store: Arc<dyn RoadmapSink>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            engine,
            store,
            notifier,
        }
    }

    /// Notification failures are logged and never fail the job.
    pub async fn run(&self, user_id: &str, request: &RoadmapRequest) -> Result<JobOutcome, SinkError> {
        let roadmap = self.engine.generate(request, true).await;

        let record_id = match self.store.persist(user_id, &roadmap).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(user_id, error = %e, "Failed to persist roadmap");
                self.send(user_id, Notification::generation_failed()).await;
                return Err(e);
            }
        };

        tracing::info!(
            user_id,
            record_id = %record_id,
            generated_by = %roadmap.generated_by,
            "Roadmap stored"
        );
        self.send(user_id, Notification::roadmap_ready(&roadmap)).await;

        Ok(JobOutcome { record_id, roadmap })
    }

    async fn send(&self, user_id: &str, notification: Notification) {
        if let Err(e) = self.notifier.notify(user_id, notification).await {
            tracing::warn!(user_id, error = %e, "Failed to deliver notification");
        }
    }
}

impl std::fmt::Debug for RoadmapJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoadmapJob")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FallbackGenerator;
    use skillbridge_core::{SkillLevel, TimeAvailability};

    #[test]
    fn test_ready_notice_names_generation_path() {
        let roadmap =
            FallbackGenerator::new().generate("Python", SkillLevel::Beginner, TimeAvailability::Casual);
        let notice = Notification::roadmap_ready(&roadmap);
        assert_eq!(notice.kind, NotificationKind::Success);
        assert!(notice.content.contains("Your personalized Python roadmap"));
        assert!(notice.content.contains("curated catalog"));
    }

    #[test]
    fn test_failure_notice_is_error() {
        assert_eq!(Notification::generation_failed().kind, NotificationKind::Error);
    }
}
