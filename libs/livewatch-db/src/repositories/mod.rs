pub mod subscription_repo;
pub mod target_repo;

pub use subscription_repo::SubscriptionRepository;
pub use target_repo::TargetRepository;
