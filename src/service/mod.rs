// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for System Events
//!
//! Orchestrates validation, persistence and best-effort notification.
//!
//! # Architecture
//!
//! ```text
//! Caller (HTTP layer, CLI)
//!     ↓
//! SystemEventService (this module)
//!     ├── validate → CategoryPolicy
//!     ├── persist  → DocumentStoreClient → SearchBackend
//!     └── notify   → NotificationRouter → Slack / SNS      (failures absorbed)
//! ```
//!
//! # Propagation
//!
//! Failures that affect durable state (validation, persistence) are returned
//! to the caller. Failures of the notification step are logged and dropped:
//! once a write is committed, the operation succeeds.
//!
//! # Example
//!
//! ```rust,ignore
//! use system_events::service::{SystemEventSender, SystemEventService};
//!
//! let sender = SystemEventSender::new(store, timestamps, policy)
//!     .with_notifier(router);
//!
//! let id = sender.create(request, &CancellationToken::new()).await?;
//! sender.end(&id, &CancellationToken::new()).await?;
//! ```

pub mod sender;

pub use sender::{SenderError, SenderResult, SystemEventSender, SystemEventService};
