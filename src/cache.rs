//! Freshness-bounded cache over a single remote document.
//!
//! Each [`DocumentCache`] owns one document for the process lifetime. Reads
//! inside the TTL never touch the network. Once the TTL has passed, the next
//! read starts a refresh; reads that arrive while it is running join the same
//! in-flight future instead of issuing their own request. A failed refresh
//! falls back to the last good copy when one exists.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::FutureExt as _;
use futures::future::{BoxFuture, Shared};
use serde::de::DeserializeOwned;
use tokio::time::Instant;

use crate::error::{CatalogError, Result};
use crate::remote_store::{FetchOutcome, RemoteStore};

pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// A decoded document plus the bookkeeping needed for conditional refresh.
///
/// Replaced wholesale on refresh; only `fetched_at` is ever touched in place.
#[derive(Debug)]
pub struct RemoteDocument<T> {
    pub data: Arc<T>,
    pub revision: Option<String>,
    pub fetched_at: Instant,
}

type Refresh<T> = Shared<BoxFuture<'static, Result<Arc<T>>>>;

struct Slot<T> {
    document: Option<RemoteDocument<T>>,
    refreshing: Option<Refresh<T>>,
}

pub struct DocumentCache<T> {
    name: &'static str,
    document_id: Option<String>,
    store: Arc<dyn RemoteStore>,
    ttl: Duration,
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> DocumentCache<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// `name` doubles as the configuration variable reported when
    /// `document_id` is missing.
    pub fn new(
        name: &'static str,
        document_id: Option<String>,
        store: Arc<dyn RemoteStore>,
    ) -> Self {
        Self {
            name,
            document_id,
            store,
            ttl: DEFAULT_TTL,
            slot: Arc::new(Mutex::new(Slot {
                document: None,
                refreshing: None,
            })),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub async fn get(&self) -> Result<Arc<T>> {
        let document_id = self
            .document_id
            .as_deref()
            .ok_or_else(|| CatalogError::missing_env(self.name))?;

        let refresh = {
            let mut slot = lock(&self.slot);
            if let Some(document) = &slot.document
                && document.fetched_at.elapsed() < self.ttl
            {
                return Ok(Arc::clone(&document.data));
            }

            match &slot.refreshing {
                Some(refresh) => refresh.clone(),
                None => {
                    let prior_revision = slot
                        .document
                        .as_ref()
                        .and_then(|document| document.revision.clone());
                    let refresh = refresh(
                        self.name,
                        document_id.to_owned(),
                        prior_revision,
                        Arc::clone(&self.store),
                        Arc::clone(&self.slot),
                    )
                    .boxed()
                    .shared();
                    slot.refreshing = Some(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await
    }
}

fn lock<T>(slot: &Mutex<Slot<T>>) -> MutexGuard<'_, Slot<T>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn refresh<T>(
    name: &'static str,
    document_id: String,
    prior_revision: Option<String>,
    store: Arc<dyn RemoteStore>,
    slot: Arc<Mutex<Slot<T>>>,
) -> Result<Arc<T>>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let outcome = store.fetch(&document_id, prior_revision.as_deref()).await;
    let decoded = match outcome {
        Ok(FetchOutcome::Modified { data, revision }) => serde_json::from_value::<T>(data)
            .map(|data| FetchOutcomeDecoded::Modified(Arc::new(data), revision))
            .map_err(|err| {
                CatalogError::RemoteUnavailable(format!("decode {document_id} document: {err}"))
            }),
        Ok(FetchOutcome::NotModified) => Ok(FetchOutcomeDecoded::NotModified),
        Err(err) => Err(err),
    };

    let mut slot = lock(&slot);
    slot.refreshing = None;

    match decoded {
        Ok(FetchOutcomeDecoded::Modified(data, revision)) => {
            tracing::debug!(document = name, revision = ?revision, "remote document refreshed");
            slot.document = Some(RemoteDocument {
                data: Arc::clone(&data),
                revision,
                fetched_at: Instant::now(),
            });
            Ok(data)
        }
        Ok(FetchOutcomeDecoded::NotModified) => match slot.document.as_mut() {
            Some(document) => {
                tracing::debug!(document = name, "remote document not modified");
                document.fetched_at = Instant::now();
                Ok(Arc::clone(&document.data))
            }
            None => Err(CatalogError::RemoteUnavailable(format!(
                "{document_id} reported not modified but nothing is cached"
            ))),
        },
        Err(err @ CatalogError::Config(_)) => Err(err),
        Err(err) => match &slot.document {
            Some(document) => {
                tracing::warn!(document = name, error = %err, "remote fetch failed; serving stale copy");
                Ok(Arc::clone(&document.data))
            }
            None => Err(err),
        },
    }
}

enum FetchOutcomeDecoded<T> {
    Modified(Arc<T>, Option<String>),
    NotModified,
}
