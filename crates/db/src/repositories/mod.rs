//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod email_channel_repo;
pub mod slack_channel_repo;

pub use email_channel_repo::EmailChannelRepo;
pub use slack_channel_repo::SlackChannelRepo;
