// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-identity selection store.
//!
//! Holds the signed-in user's selection in memory and keeps a versioned
//! copy in durable storage, namespaced by user id.
//!
//! ```text
//! Uninitialized --signed in U--> Loading(U) --> Ready(U)
//! Ready(U) --signed in V / identifier changed--> flush U, Loading(V) --> Ready(V)
//! Ready(U) --signed out--> Uninitialized   (record kept unless deleting account)
//! ```
//!
//! Mutations update memory synchronously and spawn a durable write of the
//! whole record. Writes for one identity run one at a time and carry a
//! sequence number, so a stale snapshot never replaces a newer one.
//! Identity events are applied one at a time; an event that arrives during
//! a load waits for the load to finish.

use dashmap::DashMap;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

use crate::db::{self, keys, StorageDb};
use crate::error::{CoverageError, Result};
use crate::models::{PersistedSelection, PolicySource, Selection, SelectionCounts, SCHEMA_VERSION};
use crate::services::{Catalog, CoverageEngine};
use crate::time_utils::now_rfc3339;

/// Identity lifecycle events from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    SignedIn(String),
    /// `delete_account` also removes the user's durable record.
    SignedOut { delete_account: bool },
    IdentifierChanged { old: String, new: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreStatus {
    Uninitialized,
    Loading(String),
    Ready(String),
}

impl StoreStatus {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            StoreStatus::Uninitialized => None,
            StoreStatus::Loading(id) | StoreStatus::Ready(id) => Some(id),
        }
    }
}

#[derive(Debug)]
struct StoreState {
    status: StoreStatus,
    selection: Selection,
}

/// Last sequence number written for one identity.
type WriteLocks = Arc<DashMap<String, Arc<tokio::sync::Mutex<u64>>>>;

/// Outcome of [`SelectionStore::startup_sweep`].
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SweepReport {
    pub examined: usize,
    pub removed: Vec<String>,
}

/// Why a stored record was discarded on load.
#[derive(Debug)]
enum Discard {
    Version(Option<u64>),
    Malformed(serde_json::Error),
    Identity(CoverageError),
}

/// Only the version tag, read before committing to the full layout.
#[derive(Deserialize)]
struct VersionTag {
    version: Option<u64>,
}

pub struct SelectionStore {
    storage: StorageDb,
    state: Mutex<StoreState>,
    transition: tokio::sync::Mutex<()>,
    write_locks: WriteLocks,
    sequence: AtomicU64,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl SelectionStore {
    pub fn new(storage: StorageDb) -> Self {
        Self {
            storage,
            state: Mutex::new(StoreState {
                status: StoreStatus::Uninitialized,
                selection: Selection::default(),
            }),
            transition: tokio::sync::Mutex::new(()),
            write_locks: Arc::new(DashMap::new()),
            sequence: AtomicU64::new(0),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn storage(&self) -> &StorageDb {
        &self.storage
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Read Surface ────────────────────────────────────────────

    pub fn status(&self) -> StoreStatus {
        self.state().status.clone()
    }

    /// The identity whose selection is loaded, if any.
    pub fn current_user(&self) -> Option<String> {
        match &self.state().status {
            StoreStatus::Ready(id) => Some(id.clone()),
            _ => None,
        }
    }

    /// Copy of the in-memory selection. Empty unless Ready.
    pub fn snapshot(&self) -> Selection {
        self.state().selection.clone()
    }

    pub fn counts(&self) -> SelectionCounts {
        self.state().selection.counts()
    }

    /// A fresh query engine over the current snapshot.
    pub fn engine<'a>(&self, catalog: &'a Catalog) -> CoverageEngine<'a> {
        CoverageEngine::from_selection(catalog, &self.snapshot())
    }

    // ─── Identity Transitions ────────────────────────────────────

    /// Apply an identity event. Events are applied strictly in arrival order.
    pub async fn handle_event(&self, event: IdentityEvent) -> Result<()> {
        let _transition = self.transition.lock().await;
        let current = self.state().status.user_id().map(String::from);

        match event {
            IdentityEvent::SignedIn(user_id) => {
                if current.as_deref() == Some(user_id.as_str()) {
                    tracing::debug!(user_id = %user_id, "Already signed in");
                    return Ok(());
                }
                self.switch_to(current, user_id).await
            }
            IdentityEvent::IdentifierChanged { old, new } => {
                if current.as_deref() != Some(old.as_str()) {
                    let mismatch = CoverageError::IdentityMismatch {
                        expected: current.clone().unwrap_or_default(),
                        actual: old,
                    };
                    tracing::error!(error = %mismatch, "Identifier change for a user that is not loaded");
                }
                if current.as_deref() == Some(new.as_str()) {
                    return Ok(());
                }
                self.switch_to(current, new).await
            }
            IdentityEvent::SignedOut { delete_account } => {
                let Some(user_id) = current else {
                    tracing::debug!("Sign-out with no user loaded");
                    return Ok(());
                };
                self.reset();
                self.flush().await?;
                if delete_account {
                    self.storage.remove(&db::selection_key(&user_id)).await?;
                    self.purge_other_versions(&user_id).await?;
                    self.write_locks.remove(&user_id);
                    tracing::info!(user_id = %user_id, "Deleted selection for account deletion");
                } else {
                    tracing::info!(user_id = %user_id, "Signed out");
                }
                Ok(())
            }
        }
    }

    /// Flush the outgoing identity, then load the incoming one.
    async fn switch_to(&self, outgoing: Option<String>, incoming: String) -> Result<()> {
        if let Some(previous) = outgoing {
            let snapshot = {
                let mut state = self.state();
                state.status = StoreStatus::Loading(incoming.clone());
                state.selection.clone()
            };
            // Durably written before the incoming read starts
            let seq = self.next_sequence();
            let written =
                write_record(&self.storage, &self.write_locks, &previous, snapshot, seq).await;
            let flushed = match written {
                Ok(()) => self.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = flushed {
                tracing::error!(user_id = %previous, error = %e, "Flush before switch failed");
                self.state().status = StoreStatus::Ready(previous);
                return Err(e);
            }
            self.state().selection = Selection::default();
            tracing::info!(from = %previous, to = %incoming, "Switching user");
        } else {
            self.state().status = StoreStatus::Loading(incoming.clone());
        }

        match self.load_for(&incoming).await {
            Ok(selection) => {
                let counts = selection.counts();
                let mut state = self.state();
                state.selection = selection;
                state.status = StoreStatus::Ready(incoming.clone());
                tracing::info!(
                    user_id = %incoming,
                    cards = counts.cards,
                    plans = counts.plans,
                    policies = counts.policies,
                    "Selection loaded"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(user_id = %incoming, error = %e, "Failed to load selection");
                self.reset();
                Err(e)
            }
        }
    }

    fn reset(&self) {
        let mut state = self.state();
        state.status = StoreStatus::Uninitialized;
        state.selection = Selection::default();
    }

    /// Read and validate the durable record for `user_id`.
    ///
    /// Absent, stale and corrupt records all yield an empty selection;
    /// stale and corrupt ones are purged first.
    async fn load_for(&self, user_id: &str) -> Result<Selection> {
        self.purge_other_versions(user_id).await?;

        let key = db::selection_key(user_id);
        let Some(raw) = self.storage.get(&key).await? else {
            return Ok(Selection::default());
        };

        match decode_record(user_id, &raw) {
            Ok(selection) => Ok(selection),
            Err(reason) => {
                match &reason {
                    Discard::Version(found) => tracing::warn!(
                        user_id = %user_id,
                        found = ?found,
                        expected = SCHEMA_VERSION,
                        "Discarding selection with stale schema version"
                    ),
                    Discard::Malformed(e) => tracing::warn!(
                        user_id = %user_id,
                        error = %e,
                        "Discarding unreadable selection record"
                    ),
                    Discard::Identity(e) => tracing::error!(
                        user_id = %user_id,
                        error = %e,
                        "Discarding selection stored under the wrong namespace"
                    ),
                }
                self.storage.remove(&key).await?;
                Ok(Selection::default())
            }
        }
    }

    /// Remove records for `user_id` written under any other schema version.
    async fn purge_other_versions(&self, user_id: &str) -> Result<Vec<String>> {
        let mut removed = Vec::new();
        for key in self.storage.keys().await? {
            let Some((version, owner)) = db::parse_selection_key(&key) else {
                continue;
            };
            if owner != user_id || version == SCHEMA_VERSION {
                continue;
            }
            tracing::warn!(
                user_id = %user_id,
                found = version,
                expected = SCHEMA_VERSION,
                "Discarding selection with stale schema version"
            );
            self.storage.remove(&key).await?;
            removed.push(key);
        }
        Ok(removed)
    }

    // ─── Mutations ───────────────────────────────────────────────

    /// Select or deselect a card. Returns whether it is selected afterwards.
    pub fn toggle_card(&self, card_id: &str) -> Result<bool> {
        self.mutate(|s| s.toggle_card(card_id))
    }

    pub fn set_cards(&self, card_ids: &[String]) -> Result<()> {
        self.mutate(|s| s.set_cards(card_ids))
    }

    /// Returns `false` if the plan was already added.
    pub fn add_plan(&self, plan_id: &str) -> Result<bool> {
        let now = now_rfc3339();
        self.mutate(|s| s.add_plan(plan_id, &now))
    }

    pub fn remove_plan(&self, plan_id: &str) -> Result<bool> {
        self.mutate(|s| s.remove_plan(plan_id))
    }

    /// Add an accepted policy, replacing any policy with the same id.
    pub fn add_policy(&self, policy: PolicySource) -> Result<()> {
        self.mutate(|s| s.add_policy(policy))
    }

    pub fn remove_policy(&self, policy_id: &str) -> Result<bool> {
        self.mutate(|s| s.remove_policy(policy_id))
    }

    pub fn clear_selection(&self) -> Result<()> {
        self.mutate(|s| *s = Selection::default())
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Selection) -> R) -> Result<R> {
        let (result, user_id, snapshot, seq) = {
            let mut state = self.state();
            let user_id = match &state.status {
                StoreStatus::Ready(id) => id.clone(),
                _ => return Err(CoverageError::NotReady),
            };
            let result = f(&mut state.selection);
            // Assigned under the state lock so sequence order is mutation order
            let seq = self.next_sequence();
            (result, user_id, state.selection.clone(), seq)
        };
        self.schedule_write(user_id, snapshot, seq);
        Ok(result)
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Spawn a durable write. Failures are logged, not returned.
    fn schedule_write(&self, user_id: String, selection: Selection, seq: u64) {
        let storage = self.storage.clone();
        let locks = self.write_locks.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = write_record(&storage, &locks, &user_id, selection, seq).await {
                tracing::error!(user_id = %user_id, seq, error = %e, "Selection write failed");
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Wait until every scheduled write has completed.
    pub async fn flush(&self) -> Result<()> {
        loop {
            let handles: Vec<JoinHandle<()>> = {
                let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
                std::mem::take(&mut *pending)
            };
            if handles.is_empty() {
                return Ok(());
            }
            for handle in handles {
                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("selection write task failed: {}", e))?;
            }
        }
    }

    // ─── Maintenance ─────────────────────────────────────────────

    /// Remove legacy, stale-version and unreadable selection records.
    ///
    /// Best effort: individual failures are logged and skipped. Keys outside
    /// the selection namespace are left alone.
    pub async fn startup_sweep(&self) -> Result<SweepReport> {
        let mut report = SweepReport::default();

        for key in self.storage.keys().await? {
            let stale = if keys::LEGACY.contains(&key.as_str()) {
                true
            } else if key.starts_with(keys::SELECTION_PREFIX) {
                match db::parse_selection_key(&key) {
                    Some((version, user_id)) if version == SCHEMA_VERSION => {
                        match self.storage.get(&key).await {
                            Ok(Some(raw)) => decode_record(user_id, &raw).is_err(),
                            Ok(None) => false,
                            Err(e) => {
                                tracing::warn!(key = %key, error = %e, "Sweep could not read record");
                                false
                            }
                        }
                    }
                    _ => true,
                }
            } else {
                continue;
            };

            report.examined += 1;
            if !stale {
                continue;
            }
            match self.storage.remove(&key).await {
                Ok(()) => report.removed.push(key),
                Err(e) => tracing::warn!(key = %key, error = %e, "Sweep could not remove record"),
            }
        }

        tracing::info!(
            examined = report.examined,
            removed = report.removed.len(),
            "Startup sweep complete"
        );
        Ok(report)
    }
}

/// Write the full record for `user_id` unless a newer one already landed.
async fn write_record(
    storage: &StorageDb,
    locks: &WriteLocks,
    user_id: &str,
    selection: Selection,
    seq: u64,
) -> Result<()> {
    let lock = locks
        .entry(user_id.to_string())
        .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(0)))
        .clone();
    let mut last_written = lock.lock().await;
    if seq <= *last_written {
        tracing::debug!(user_id = %user_id, seq, last = *last_written, "Skipping superseded write");
        return Ok(());
    }

    let record = PersistedSelection::new(user_id, selection, &now_rfc3339());
    let body = serde_json::to_string(&record)?;
    storage.set(&db::selection_key(user_id), &body).await?;
    *last_written = seq;
    Ok(())
}

/// Parse a stored record, all or nothing.
fn decode_record(user_id: &str, raw: &str) -> std::result::Result<Selection, Discard> {
    let tag: VersionTag = serde_json::from_str(raw).map_err(Discard::Malformed)?;
    if tag.version != Some(u64::from(SCHEMA_VERSION)) {
        return Err(Discard::Version(tag.version));
    }

    let record: PersistedSelection = serde_json::from_str(raw).map_err(Discard::Malformed)?;
    if record.state.user_id != user_id {
        return Err(Discard::Identity(CoverageError::IdentityMismatch {
            expected: user_id.to_string(),
            actual: record.state.user_id,
        }));
    }
    Ok(record.state.selection)
}
