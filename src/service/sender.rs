// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Sender
//!
//! Lifecycle of a system event:
//!
//! ```text
//! create / start ──> index into current partition ──> re-read ──> notify(Created|Started)
//! end(id)        ──> update endtime (current, then previous partition)
//!                                       ──> re-read ──> notify(Finished, stored category)
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::{StoreError, StoreResult};
use crate::model::{EventRequest, PartialSystemEventDocument, SystemEventDocument};
use crate::notification::{LifecycleStage, NotificationRouter};
use crate::policy::CategoryPolicy;
use crate::store::{DocumentStoreClient, UpdateOptions};
use crate::timestamp::TimestampProvider;
use crate::validation::{validate_request, ValidationError, ValidationResult};

/// Service layer result type
pub type SenderResult<T> = Result<T, SenderError>;

/// Service layer errors
#[derive(Debug, thiserror::Error)]
pub enum SenderError {
    /// Request rejected before anything was written
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Store answered but refused the write
    #[error("System event was not created")]
    NotCreated { details: Option<String> },

    /// Store answered but refused the update in every partition tried
    #[error("System event was not updated")]
    NotUpdated { details: Option<String> },

    /// Store could not be reached or answered garbage
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Caller cancelled before the write completed
    #[error("Operation cancelled")]
    Cancelled,
}

/// System event service trait
///
/// Every operation takes the caller's cancellation token. Cancelling during
/// notification never unwinds a committed write.
#[async_trait]
pub trait SystemEventService: Send + Sync {
    /// Check a request against the policy, trimming its fields
    fn validate(&self, request: &mut EventRequest) -> ValidationResult;

    /// Record a point-in-time event and announce it
    ///
    /// # Returns
    /// - Store-assigned id of the new event
    async fn create(&self, request: EventRequest, cancel: &CancellationToken)
        -> SenderResult<String>;

    /// Record a long-running event that will later be ended
    async fn start(&self, request: EventRequest, cancel: &CancellationToken)
        -> SenderResult<String>;

    /// Stamp the end time of an existing event
    async fn end(&self, id: &str, cancel: &CancellationToken) -> SenderResult<()>;

    /// Look an event up by id
    async fn get(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> SenderResult<Option<SystemEventDocument>>;
}

/// Store-backed implementation of [`SystemEventService`]
#[derive(Debug, Clone)]
pub struct SystemEventSender {
    store: DocumentStoreClient,
    timestamps: TimestampProvider,
    policy: Arc<CategoryPolicy>,
    notifier: Option<NotificationRouter>,
}

impl SystemEventSender {
    pub fn new(
        store: DocumentStoreClient,
        timestamps: TimestampProvider,
        policy: Arc<CategoryPolicy>,
    ) -> Self {
        Self {
            store,
            timestamps,
            policy,
            notifier: None,
        }
    }

    /// Attach the notification router; without one nothing is announced
    pub fn with_notifier(mut self, notifier: NotificationRouter) -> Self {
        self.notifier = Some(notifier);
        self
    }

    async fn record(
        &self,
        mut request: EventRequest,
        stage: LifecycleStage,
        cancel: &CancellationToken,
    ) -> SenderResult<String> {
        self.validate(&mut request)?;

        let document = SystemEventDocument::from_request(&request, self.timestamps.timestamp());
        let response = guard(cancel, self.store.index(&document)).await?;

        if !response.is_valid {
            warn!(
                "System event for category {} refused by the store: {}",
                request.category,
                response.debug_information.as_deref().unwrap_or("no details")
            );
            return Err(SenderError::NotCreated {
                details: response.debug_information,
            });
        }

        info!(
            "System event {} recorded in {} ({})",
            response.id, response.index, request.category
        );
        self.announce(
            stage,
            Some(request.category.as_str()),
            &response.index,
            &response.id,
            cancel,
        )
        .await;

        Ok(response.id)
    }

    /// Re-read the stored document and notify subscribers, absorbing failures
    async fn announce(
        &self,
        stage: LifecycleStage,
        category: Option<&str>,
        index: &str,
        id: &str,
        cancel: &CancellationToken,
    ) {
        let Some(router) = &self.notifier else {
            return;
        };

        let document = match guard(cancel, self.store.get_in(index, id)).await {
            Ok(Some(document)) => document,
            Ok(None) => {
                error!(
                    "Error sending notifications for event with id {}: not found in {}",
                    id, index
                );
                return;
            }
            Err(e) => {
                error!("Error sending notifications for event with id {}: {}", id, e);
                return;
            }
        };

        let category = category.unwrap_or(document.category.as_str());
        match router.notify(stage, category, &document, cancel).await {
            Ok(report) if report.failed > 0 => warn!(
                "{} of {} notifications for event {} failed",
                report.failed,
                report.attempted(),
                id
            ),
            Ok(report) => debug!("Notifications for event {}: {:?}", id, report),
            Err(e) => error!("Error sending notifications for event with id {}: {}", id, e),
        }
    }
}

#[async_trait]
impl SystemEventService for SystemEventSender {
    fn validate(&self, request: &mut EventRequest) -> ValidationResult {
        validate_request(request, &self.policy)
    }

    async fn create(
        &self,
        request: EventRequest,
        cancel: &CancellationToken,
    ) -> SenderResult<String> {
        self.record(request, LifecycleStage::Created, cancel).await
    }

    async fn start(
        &self,
        request: EventRequest,
        cancel: &CancellationToken,
    ) -> SenderResult<String> {
        self.record(request, LifecycleStage::Started, cancel).await
    }

    async fn end(&self, id: &str, cancel: &CancellationToken) -> SenderResult<()> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ValidationError::EmptyEventId.into());
        }

        let partial = PartialSystemEventDocument {
            endtime: self.timestamps.timestamp(),
        };
        let response = guard(
            cancel,
            self.store
                .update(id, &partial, UpdateOptions::spanning_partitions()),
        )
        .await?;

        if !response.is_valid {
            return Err(SenderError::NotUpdated {
                details: response.debug_information,
            });
        }

        info!("System event {} ended in {}", response.id, response.index);
        // No category argument: the stored document's category is used
        self.announce(
            LifecycleStage::Finished,
            None,
            &response.index,
            &response.id,
            cancel,
        )
        .await;

        Ok(())
    }

    async fn get(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> SenderResult<Option<SystemEventDocument>> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ValidationError::EmptyEventId.into());
        }
        guard(cancel, self.store.get(id)).await
    }
}

/// Await a store call unless the caller cancels first
async fn guard<T, F>(cancel: &CancellationToken, call: F) -> SenderResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SenderError::Cancelled),
        result = call => Ok(result?),
    }
}
