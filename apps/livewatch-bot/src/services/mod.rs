pub mod notification_service;
pub mod poll_scheduler;
pub mod status_tracker;
pub mod telegram_delivery;
pub mod watch_service;
