//! System event ingestion and notification fan-out
//!
//! This crate records operational events (deployments, incidents, ...) in a
//! time-partitioned document store and announces them to the chat webhooks
//! and pub/sub topics subscribed to their category.

pub mod clock;
pub mod config;
pub mod errors;
pub mod index;
pub mod model;
pub mod monitoring;
pub mod notification;
pub mod policy;
pub mod service;
pub mod slack;
pub mod store;
pub mod timestamp;
pub mod validation;

// Re-export commonly used types
pub use config::{AppConfig, ConfigError};
pub use errors::{NotifyError, NotifyResult, StoreError, StoreResult};
pub use model::{EventRequest, Level, SystemEventDocument};
pub use notification::{LifecycleStage, NotificationRouter};
pub use policy::{CategoryPolicy, CategorySubscription, ChannelType};
pub use service::{SenderError, SenderResult, SystemEventSender, SystemEventService};
pub use store::DocumentStoreClient;
