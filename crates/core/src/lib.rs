//! Domain core for organization notification channels.
//!
//! Pure types and logic shared by the storage, delivery and HTTP crates:
//!
//! - [`channels`]: Slack and email channel records.
//! - [`validation`]: structural and duplicate checks for channel input.
//! - [`access`]: the "may this principal manage this organization" guard.
//! - [`store`]: the [`ChannelStore`](store::ChannelStore) seam plus an
//!   in-memory implementation.
//! - [`registry`]: guard, validator and store composed into one service.
//! - [`event`] and [`templates`]: data-request events and message rendering.

pub mod access;
pub mod channels;
pub mod error;
pub mod event;
pub mod registry;
pub mod store;
pub mod templates;
pub mod types;
pub mod validation;
