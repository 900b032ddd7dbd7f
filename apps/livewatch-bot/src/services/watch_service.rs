use crate::services::status_tracker::StatusTracker;
use livewatch_core::{LivenessCheck, NormalizeError, NormalizedTarget, Normalizer, TargetKind};
use livewatch_db::models::{TargetStatus, WatchedTarget};
use livewatch_db::repositories::{SubscriptionRepository, TargetRepository};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Invalid(#[from] NormalizeError),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// One parsed add request: `target | note | owner | kind`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddRequest {
    pub target: String,
    pub annotation: Option<String>,
    pub owner_label: Option<String>,
    pub kind: Option<TargetKind>,
}

impl AddRequest {
    /// Splits `line` on `separator`. Empty fields count as absent.
    pub fn parse(line: &str, separator: char) -> Result<Self, WatchError> {
        let mut fields = line.split(separator).map(str::trim);
        let target = fields.next().unwrap_or_default().to_string();
        if target.is_empty() {
            return Err(WatchError::BadRequest("missing target".to_string()));
        }

        let mut optional = || {
            fields
                .next()
                .filter(|field| !field.is_empty())
                .map(str::to_string)
        };
        let annotation = optional();
        let owner_label = optional();
        let kind = optional()
            .map(|raw| raw.parse::<TargetKind>().map_err(WatchError::BadRequest))
            .transpose()?;

        Ok(Self {
            target,
            annotation,
            owner_label,
            kind,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub target: NormalizedTarget,
    pub status: TargetStatus,
    pub display_name: Option<String>,
    pub annotation: Option<String>,
    pub owner_label: Option<String>,
}

/// Current state of one watched target after a live re-check.
#[derive(Debug, Clone)]
pub struct CheckedTarget {
    pub watched: WatchedTarget,
    pub status: TargetStatus,
    pub display_name: Option<String>,
}

/// Command-side flows: add, list, remove, identify.
#[derive(Clone)]
pub struct WatchService {
    normalizer: Normalizer,
    resolver: Arc<dyn LivenessCheck>,
    targets: TargetRepository,
    subscriptions: SubscriptionRepository,
    tracker: StatusTracker,
}

impl WatchService {
    pub fn new(
        normalizer: Normalizer,
        resolver: Arc<dyn LivenessCheck>,
        targets: TargetRepository,
        subscriptions: SubscriptionRepository,
        tracker: StatusTracker,
    ) -> Self {
        Self {
            normalizer,
            resolver,
            targets,
            subscriptions,
            tracker,
        }
    }

    pub fn identify(&self, input: &str) -> Result<NormalizedTarget, NormalizeError> {
        self.normalizer.normalize(input, None)
    }

    /// normalize → resolve → store → subscribe. An unresolved probe leaves the target `UNKNOWN`.
    /// A target nobody watched yet is stored directly since there is nobody to alert.
    /// An already stored target keeps the URL it was first added with.
    pub async fn add(
        &self,
        watcher_id: i64,
        request: AddRequest,
    ) -> Result<AddOutcome, WatchError> {
        let mut target = self.normalizer.normalize(&request.target, request.kind)?;

        let stored_url = self.targets.get(&target.id).await?.map(|t| t.url);
        let known = stored_url.is_some();
        if let Some(url) = stored_url {
            target.canonical_url = url;
        }
        let resolution = self.resolver.resolve(&target.id, &target.canonical_url).await;

        match (known, resolution) {
            // Watched by others already: their alerts go through the tracker.
            (true, Some(resolution)) => {
                self.tracker
                    .apply(&target.id, &target.canonical_url, &resolution)
                    .await?;
            }
            (false, Some(resolution)) => {
                self.targets
                    .upsert(
                        &target.id,
                        &target.canonical_url,
                        resolution.display_name.as_deref(),
                        resolution.status.into(),
                    )
                    .await?;
            }
            (_, None) => {
                self.targets.ensure(&target.id, &target.canonical_url).await?;
            }
        }

        self.subscriptions
            .record(
                watcher_id,
                &target.id,
                request.annotation.as_deref(),
                request.owner_label.as_deref(),
                target.kind,
            )
            .await?;

        let stored = self.targets.get(&target.id).await?;
        let (status, display_name) = stored
            .map(|t| (t.last_status, t.display_name))
            .unwrap_or((TargetStatus::Unknown, None));
        info!("{} now watches {} ({})", watcher_id, target.id, status);

        Ok(AddOutcome {
            target,
            status,
            display_name,
            annotation: request.annotation,
            owner_label: request.owner_label,
        })
    }

    pub async fn list(&self, watcher_id: i64) -> anyhow::Result<Vec<WatchedTarget>> {
        self.subscriptions.list_for_watcher(watcher_id).await
    }

    /// Re-resolves one watched target and returns what is stored afterwards.
    pub async fn check(&self, watched: WatchedTarget) -> anyhow::Result<CheckedTarget> {
        let mut status = watched.last_status;
        let mut display_name = watched.display_name.clone();

        if let Some(resolution) = self.resolver.resolve(&watched.target_id, &watched.url).await {
            self.tracker
                .apply(&watched.target_id, &watched.url, &resolution)
                .await?;
            status = resolution.status.into();
            display_name = resolution.display_name.or(display_name);
        }

        Ok(CheckedTarget {
            watched,
            status,
            display_name,
        })
    }

    /// Accepts a link or a raw id. Returns the id and whether anything was removed.
    pub async fn remove(&self, watcher_id: i64, input: &str) -> anyhow::Result<(String, bool)> {
        let id = match self.normalizer.normalize(input, None) {
            Ok(target) => target.id,
            Err(_) => input.trim().to_string(),
        };
        let removed = self.subscriptions.remove(watcher_id, &id).await?;
        if removed {
            info!("{} stopped watching {}", watcher_id, id);
        }
        Ok((id, removed))
    }
}
