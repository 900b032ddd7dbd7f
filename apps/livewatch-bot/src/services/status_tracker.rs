use anyhow::Result;
use chrono::{DateTime, Local};
use livewatch_core::{Liveness, Resolution};
use livewatch_db::models::TargetStatus;
use livewatch_db::repositories::TargetRepository;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

/// A target's resolved status differs from the one stored before.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEvent {
    pub target_id: String,
    pub url: String,
    pub display_name: Option<String>,
    pub previous: TargetStatus,
    pub current: Liveness,
    pub observed_at: DateTime<Local>,
}

/// Single entry point for storing verdicts. Every caller that resolves a
/// target goes through here so each transition is detected exactly once.
#[derive(Clone)]
pub struct StatusTracker {
    targets: TargetRepository,
    events: UnboundedSender<TransitionEvent>,
}

impl StatusTracker {
    pub fn new(targets: TargetRepository, events: UnboundedSender<TransitionEvent>) -> Self {
        Self { targets, events }
    }

    /// Stores `resolution` for the target and queues a `TransitionEvent` if
    /// the status changed. Returns the event that was queued, if any.
    pub async fn apply(
        &self,
        target_id: &str,
        url: &str,
        resolution: &Resolution,
    ) -> Result<Option<TransitionEvent>> {
        let previous = self
            .targets
            .record_resolution(target_id, resolution.status, resolution.display_name.as_deref())
            .await?;

        let Some(previous) = previous else {
            warn!("{} vanished before its result could be stored", target_id);
            return Ok(None);
        };
        if previous == TargetStatus::from(resolution.status) {
            return Ok(None);
        }

        let event = TransitionEvent {
            target_id: target_id.to_string(),
            url: url.to_string(),
            display_name: resolution.display_name.clone(),
            previous,
            current: resolution.status,
            observed_at: Local::now(),
        };
        info!("{}: {} -> {}", target_id, previous, resolution.status);

        if self.events.send(event.clone()).is_err() {
            warn!("Notifier is gone, transition of {} not delivered", target_id);
        }
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    async fn setup() -> (
        TargetRepository,
        StatusTracker,
        mpsc::UnboundedReceiver<TransitionEvent>,
    ) {
        let pool = livewatch_db::connect_in_memory().await.unwrap();
        let targets = TargetRepository::new(pool);
        let (tx, rx) = mpsc::unbounded_channel();
        (targets.clone(), StatusTracker::new(targets, tx), rx)
    }

    fn resolved(status: Liveness, name: Option<&str>) -> Resolution {
        Resolution {
            status,
            display_name: name.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn live_to_die_emits_exactly_one_event() {
        let (targets, tracker, mut rx) = setup().await;
        targets.upsert("t1", "u1", None, TargetStatus::Live).await.unwrap();

        let event = tracker
            .apply("t1", "u1", &resolved(Liveness::Die, None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.previous, TargetStatus::Live);
        assert_eq!(event.current, Liveness::Die);

        assert_eq!(rx.try_recv().unwrap().target_id, "t1");
        assert!(rx.try_recv().is_err());
        assert_eq!(targets.get("t1").await.unwrap().unwrap().last_status, TargetStatus::Die);
    }

    #[tokio::test]
    async fn same_status_refreshes_name_without_event() {
        let (targets, tracker, mut rx) = setup().await;
        targets.upsert("t1", "u1", Some("Old"), TargetStatus::Live).await.unwrap();

        let event = tracker
            .apply("t1", "u1", &resolved(Liveness::Live, Some("New")))
            .await
            .unwrap();
        assert!(event.is_none());
        assert!(rx.try_recv().is_err());
        assert_eq!(
            targets.get("t1").await.unwrap().unwrap().display_name.as_deref(),
            Some("New")
        );
    }

    #[tokio::test]
    async fn first_verdict_after_unknown_is_a_transition() {
        let (targets, tracker, mut rx) = setup().await;
        targets.ensure("t1", "u1").await.unwrap();

        tracker
            .apply("t1", "u1", &resolved(Liveness::Live, None))
            .await
            .unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.previous, TargetStatus::Unknown);
        assert_eq!(event.current, Liveness::Live);
    }

    #[tokio::test]
    async fn missing_target_is_ignored() {
        let (_, tracker, mut rx) = setup().await;
        let event = tracker
            .apply("ghost", "u", &resolved(Liveness::Die, None))
            .await
            .unwrap();
        assert!(event.is_none());
        assert!(rx.try_recv().is_err());
    }
}
