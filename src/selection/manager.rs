//! Selection state with write-behind persistence.
//!
//! Mutations update the in-memory [`SelectionModel`] synchronously and hand the
//! resulting snapshot to a writer task. The writer applies saves one at a time
//! in the order they were issued, so the stored record always converges on the
//! latest selection. Storage failures never reach the caller: they are logged
//! and published as [`PersistenceHealth`].
use tokio::sync::{mpsc, oneshot, watch};

use super::model::{RestoreReport, SelectionError, SelectionModel};
use super::summary::{SelectionSummary, TriState};
use crate::catalog::{Catalog, Category};
use crate::storage::{SelectionSnapshot, SnapshotStore, StoreError};

// ============================================================================
// Persistence Health
// ============================================================================

/// Durability status observed by the writer task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistenceHealth {
    /// Completed writes (saves and clears).
    pub saves: u64,
    /// Failed store calls, including the initial load.
    pub failures: u64,
    /// Most recent failure; reset by the next successful write.
    pub last_error: Option<String>,
}

impl PersistenceHealth {
    /// Selection still works, but the latest state may not survive a restart.
    pub fn is_degraded(&self) -> bool {
        self.last_error.is_some()
    }

    fn record_failure(&mut self, error: &StoreError) {
        self.failures += 1;
        self.last_error = Some(error.to_string());
    }
}

enum PersistCommand {
    Save(SelectionSnapshot),
    Flush(oneshot::Sender<()>),
}

// ============================================================================
// SelectionStateManager
// ============================================================================

/// Owns the selection model and keeps the store in step with it.
///
/// Must be created inside a tokio runtime; dropping it lets the writer task
/// finish any queued saves and exit.
pub struct SelectionStateManager {
    model: SelectionModel,
    persist_tx: mpsc::UnboundedSender<PersistCommand>,
    health_rx: watch::Receiver<PersistenceHealth>,
    restore_report: Option<RestoreReport>,
}

impl SelectionStateManager {
    /// Build the catalog state and restore the stored selection, if any.
    ///
    /// A stored snapshot fully overwrites the catalog's default flags. A
    /// malformed record or an unreachable store leaves the defaults in place.
    pub async fn initialize<S: SnapshotStore>(catalog: Catalog, store: S) -> Self {
        let mut model = SelectionModel::new(catalog);
        let mut health = PersistenceHealth::default();
        let mut restore_report = None;

        match store.load().await {
            Ok(Some(snapshot)) => {
                let report = model.restore(&snapshot);
                if !report.ignored.is_empty() {
                    tracing::debug!(
                        ignored = report.ignored.len(),
                        "Stored selection names items missing from the catalog"
                    );
                }
                tracing::info!(
                    applied = report.applied,
                    summary = %model.summary(),
                    "Restored stored selection"
                );
                restore_report = Some(report);
            }
            Ok(None) => {
                tracing::debug!("No stored selection, using catalog defaults");
            }
            Err(e @ StoreError::MalformedSnapshot(_)) => {
                tracing::warn!(error = %e, "Ignoring malformed stored selection");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Selection store unavailable, changes will not persist");
                health.record_failure(&e);
            }
        }

        let (persist_tx, persist_rx) = mpsc::unbounded_channel();
        let (health_tx, health_rx) = watch::channel(health);
        tokio::spawn(run_writer(store, persist_rx, health_tx));

        Self {
            model,
            persist_tx,
            health_rx,
            restore_report,
        }
    }

    // ========================================================================
    // Read-only Views
    // ========================================================================

    pub fn model(&self) -> &SelectionModel {
        &self.model
    }

    pub fn categories(&self) -> &[Category] {
        self.model.categories()
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.model.category(name)
    }

    pub fn expanded(&self) -> Option<&Category> {
        self.model.expanded()
    }

    pub fn summary(&self) -> &SelectionSummary {
        self.model.summary()
    }

    pub fn state(&self) -> TriState {
        self.model.state()
    }

    pub fn is_select_all(&self) -> bool {
        self.model.is_select_all()
    }

    pub fn is_indeterminate(&self) -> bool {
        self.model.is_indeterminate()
    }

    pub fn selected_summary(&self) -> String {
        self.model.selected_summary()
    }

    pub fn is_any_selected(&self) -> bool {
        self.model.is_any_selected()
    }

    pub fn is_none_selected(&self) -> bool {
        self.model.is_none_selected()
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        self.model.snapshot()
    }

    /// What the startup load applied, if a snapshot was found.
    pub fn restore_report(&self) -> Option<&RestoreReport> {
        self.restore_report.as_ref()
    }

    pub fn persistence_health(&self) -> PersistenceHealth {
        self.health_rx.borrow().clone()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub fn select_all(&mut self) {
        let changed = self.model.select_all();
        self.persist_if(changed);
    }

    pub fn clear_all(&mut self) {
        let changed = self.model.clear_all();
        self.persist_if(changed);
    }

    /// The aggregate checkbox itself was toggled to `checked`.
    pub fn set_select_all(&mut self, checked: bool) {
        let changed = self.model.set_select_all(checked);
        self.persist_if(changed);
    }

    pub fn toggle_category(&mut self, name: &str) -> Result<(), SelectionError> {
        let changed = self.model.toggle_category(name)?;
        self.persist_if(changed);
        Ok(())
    }

    pub fn set_category(&mut self, name: &str, checked: bool) -> Result<(), SelectionError> {
        let changed = self.model.set_category(name, checked)?;
        self.persist_if(changed);
        Ok(())
    }

    pub fn toggle_item(&mut self, category: &str, item: &str) -> Result<(), SelectionError> {
        let changed = self.model.toggle_item(category, item)?;
        self.persist_if(changed);
        Ok(())
    }

    /// UI-only; never persisted.
    pub fn toggle_expansion(&mut self, name: &str) -> Result<(), SelectionError> {
        self.model.toggle_expansion(name)
    }

    /// Wait until every save issued so far has been applied (or has failed).
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.persist_tx.send(PersistCommand::Flush(done_tx)).is_ok() {
            // A dropped sender means the writer is gone; nothing left to wait for.
            let _ = done_rx.await;
        }
    }

    fn persist_if(&self, changed: bool) {
        if !changed {
            return;
        }
        let snapshot = self.model.snapshot();
        if self.persist_tx.send(PersistCommand::Save(snapshot)).is_err() {
            tracing::warn!("Selection writer stopped, change kept in memory only");
        }
    }
}

/// Drain persistence commands in order until every sender is dropped.
async fn run_writer<S: SnapshotStore>(
    store: S,
    mut rx: mpsc::UnboundedReceiver<PersistCommand>,
    health: watch::Sender<PersistenceHealth>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            PersistCommand::Save(snapshot) => {
                let result = write_snapshot(&store, &snapshot).await;
                health.send_modify(|h| match &result {
                    Ok(()) => {
                        h.saves += 1;
                        h.last_error = None;
                    }
                    Err(e) => h.record_failure(e),
                });
                if let Err(e) = result {
                    tracing::warn!(
                        error = %e,
                        selected = snapshot.len(),
                        "Failed to persist selection, keeping it in memory"
                    );
                }
            }
            PersistCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::trace!("Selection writer stopped");
}

/// "Nothing selected" is stored as no record at all.
async fn write_snapshot<S: SnapshotStore>(
    store: &S,
    snapshot: &SelectionSnapshot,
) -> Result<(), StoreError> {
    if snapshot.is_empty() {
        store.initialize().await?;
        store.clear().await
    } else {
        store.save(snapshot).await
    }
}
