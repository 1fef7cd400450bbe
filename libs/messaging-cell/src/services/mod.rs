pub mod identity;
pub mod relay;
pub mod summary;

pub use identity::IdentityResolver;
pub use relay::MessagingService;
