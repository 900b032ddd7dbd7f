use crate::services::poll_scheduler::PollScheduler;
use crate::services::watch_service::WatchService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub watch: WatchService,
    pub scheduler: PollScheduler,
    /// Chats allowed to use the bot. Empty means everyone.
    pub allowed_chats: Arc<Vec<i64>>,
}

impl AppState {
    pub fn is_allowed(&self, chat_id: i64) -> bool {
        self.allowed_chats.is_empty() || self.allowed_chats.contains(&chat_id)
    }
}
