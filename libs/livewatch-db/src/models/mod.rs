pub mod subscription;
pub mod target;

pub use subscription::{Subscription, WatchedTarget};
pub use target::{Target, TargetStatus};
