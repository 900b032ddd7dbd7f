use crate::bot::utils::{escape_html, status_icon};
use crate::services::status_tracker::TransitionEvent;
use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use livewatch_core::Liveness;
use livewatch_db::models::{Subscription, TargetStatus};
use livewatch_db::repositories::SubscriptionRepository;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};

/// An HTML alert ready to hand to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub target_id: String,
    pub url: String,
    pub text: String,
}

/// Transport used to reach a watcher.
#[async_trait]
pub trait Deliver: Send + Sync {
    async fn deliver(&self, watcher_id: i64, message: &RenderedMessage) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

/// Fans transition events out to every subscriber of the target.
pub struct NotificationService {
    subscriptions: SubscriptionRepository,
    transport: Arc<dyn Deliver>,
}

impl NotificationService {
    pub fn new(subscriptions: SubscriptionRepository, transport: Arc<dyn Deliver>) -> Self {
        Self {
            subscriptions,
            transport,
        }
    }

    /// Drains events one at a time so alerts for a target keep their order.
    pub async fn run(self, mut events: UnboundedReceiver<TransitionEvent>) {
        info!("Notifier started");
        while let Some(event) = events.recv().await {
            if let Err(e) = self.notify(&event).await {
                error!("Failed to notify watchers of {}: {:#}", event.target_id, e);
            }
        }
        info!("Notifier stopped: event channel closed");
    }

    pub async fn notify(&self, event: &TransitionEvent) -> Result<DeliveryReport> {
        let subscribers = self.subscriptions.subscribers_of(&event.target_id).await?;
        if subscribers.is_empty() {
            info!("No watchers for {}, nothing to send", event.target_id);
            return Ok(DeliveryReport::default());
        }

        let deliveries = subscribers.iter().map(|sub| {
            let message = render_transition(event, sub);
            async move {
                let result = self.transport.deliver(sub.watcher_id, &message).await;
                (sub.watcher_id, result)
            }
        });

        let mut report = DeliveryReport::default();
        for (watcher_id, result) in join_all(deliveries).await {
            match result {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!("Failed to notify {} about {}: {:#}", watcher_id, event.target_id, e);
                }
            }
        }

        info!(
            "{} {} -> {}: {}/{} alerts sent, {} failed",
            event.target_id,
            event.previous,
            event.current,
            report.sent,
            subscribers.len(),
            report.failed
        );
        Ok(report)
    }
}

pub fn render_transition(event: &TransitionEvent, sub: &Subscription) -> RenderedMessage {
    let headline = match event.current {
        Liveness::Live => "🚀 <b>Back LIVE!</b>",
        Liveness::Die => "☠️ <b>Went DIE!</b>",
    };
    let name_line = event
        .display_name
        .as_deref()
        .map(|name| format!("👤 <b>Name</b>: {}\n", escape_html(name)))
        .unwrap_or_default();

    let text = format!(
        "{headline}\n\
         ━━━━━━━━━━━━━━━━━━━━\n\
         🪪 <b>ID</b>: <a href=\"{url}\">{id}</a>\n\
         {name_line}\
         📝 <b>Note</b>: {note}\n\
         🙍 <b>Owner</b>: {owner}\n\
         📟 <b>Status</b>: {old} → {new}\n\
         ⏰ <b>Time</b>: {time}\n\
         ━━━━━━━━━━━━━━━━━━━━",
        url = escape_html(&event.url),
        id = escape_html(&event.target_id),
        note = escape_html(sub.annotation.as_deref().unwrap_or("—")),
        owner = escape_html(sub.owner_label.as_deref().unwrap_or("—")),
        old = status_icon(event.previous),
        new = status_icon(TargetStatus::from(event.current)),
        time = event.observed_at.format("%Y-%m-%d %H:%M:%S"),
    );

    RenderedMessage {
        target_id: event.target_id.clone(),
        url: event.url.clone(),
        text,
    }
}
