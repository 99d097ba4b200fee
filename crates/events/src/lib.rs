//! Data-request notification delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`Dispatcher`]: renders messages for one event and delivers them to
//!   every channel the organization registered.
//! - [`NotificationWorker`]: background loop feeding bus events to the
//!   dispatcher.
//! - [`delivery`]: Slack webhook and SMTP transports.

pub mod bus;
pub mod delivery;
pub mod dispatcher;
pub mod worker;

pub use bus::EventBus;
pub use delivery::email::{EmailConfig, Mailer, SmtpMailer};
pub use delivery::webhook::{ReqwestWebhookClient, WebhookClient};
pub use dispatcher::{
    DeliveryFailure, DeliveryTarget, DispatchConfig, DispatchReport, Dispatcher, SiteSlackTarget,
};
pub use worker::NotificationWorker;
