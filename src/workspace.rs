use std::collections::VecDeque;
use std::path::Path;

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::events::{AppEvent, EventBus};
use crate::models::Session;
use crate::store::{build_tree, ensure_data_dir, FolderSet, FolderTree, SessionStore};

/// Cleanup work scheduled to run after a primary store mutation. Kept as
/// an explicit FIFO queue so relative order is a structural guarantee:
/// folder-membership removal always precedes the cloud refresh, which
/// precedes the sidebar refresh event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredOp {
    RemoveFromFolders(String),
    RefreshCloud,
    RefreshSidebar,
}

/// Composition root for the workbench core: the session store, folder
/// edges, and the event bus, plus the deferred-cleanup queue.
#[derive(Default)]
pub struct Workspace {
    pub sessions: SessionStore,
    pub folders: FolderSet,
    pub events: EventBus,
    deferred: VecDeque<DeferredOp>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the workspace at the configured data directory, falling back
    /// to the default location when `storage.data_dir` is unset.
    pub fn open(config: &Config) -> Result<Self> {
        let dir = match &config.storage.data_dir {
            Some(dir) => dir.clone(),
            None => ensure_data_dir()?,
        };
        Self::load(&dir)
    }

    pub fn load(dir: &Path) -> Result<Self> {
        Ok(Self {
            sessions: SessionStore::load(dir)?,
            folders: FolderSet::load(dir)?,
            events: EventBus::new(),
            deferred: VecDeque::new(),
        })
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        self.sessions.save(dir)?;
        self.folders.save(dir)
    }

    /// Close a session. The session-list mutation happens synchronously;
    /// dependent cleanup (membership removal, then the cloud and sidebar
    /// refreshes) is queued and runs on the next `flush_deferred`.
    /// Closing an unknown id queues nothing, so a double-fired delete
    /// emits exactly one refresh.
    pub fn close_session(&mut self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id)?;
        let next = self.sessions.close_session(session_id);

        self.deferred
            .push_back(DeferredOp::RemoveFromFolders(session_id.to_string()));
        self.deferred.push_back(DeferredOp::RefreshCloud);
        self.deferred.push_back(DeferredOp::RefreshSidebar);
        debug!(session_id, "session closed, cleanup queued");
        next
    }

    pub fn pending_cleanup(&self) -> &VecDeque<DeferredOp> {
        &self.deferred
    }

    /// Drain the cleanup queue in order.
    pub fn flush_deferred(&mut self) {
        while let Some(op) = self.deferred.pop_front() {
            match op {
                DeferredOp::RemoveFromFolders(session_id) => {
                    self.folders.delete_session_from_folder(&session_id);
                }
                DeferredOp::RefreshCloud => {
                    self.events.emit(AppEvent::RefreshCloud);
                }
                DeferredOp::RefreshSidebar => {
                    self.events.emit(AppEvent::RefreshSidebar);
                }
            }
        }
    }

    /// Derive the sidebar's folder tree from current state.
    pub fn tree(&self) -> FolderTree {
        build_tree(self.sessions.sessions(), &self.folders)
    }
}
