pub mod health_feed;
pub mod notifier;
pub mod resources;
pub mod upstream;
pub mod weather;

pub use notifier::NotificationService;
pub use upstream::UpstreamClient;
