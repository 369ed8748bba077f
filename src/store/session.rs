use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{new_id, HttpMethod, Session, SessionConfig};

const SESSION_STORE_VERSION: u32 = 1;
const SESSIONS_FILE_NAME: &str = "sessions.json";

/// Owns session lifetime: the ordered session list, the currently active
/// session, and the per-recipe editor configs. All mutations replace or
/// edit the list in one step; callers never hold partial views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStore {
    pub version: u32,
    sessions: Vec<Session>,
    current: Option<String>,
    #[serde(default)]
    configs: HashMap<String, SessionConfig>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self {
            version: SESSION_STORE_VERSION,
            sessions: Vec::new(),
            current: None,
            configs: HashMap::new(),
        }
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn get(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    pub fn current_session(&self) -> Option<&Session> {
        let id = self.current.as_deref()?;
        self.get(id)
    }

    pub fn set_current(&mut self, session_id: &str) -> Result<()> {
        if self.get(session_id).is_none() {
            return Err(Error::missing(format!("session {}", session_id)));
        }
        self.current = Some(session_id.to_string());
        Ok(())
    }

    /// Whole-value replacement of the session list. The current id is
    /// dropped if it no longer resolves.
    pub fn set_sessions(&mut self, sessions: Vec<Session>) {
        self.sessions = sessions;
        if let Some(id) = self.current.clone() {
            if self.get(&id).is_none() {
                self.current = None;
            }
        }
    }

    /// Create a session and make it the active one.
    pub fn add_session(
        &mut self,
        name: String,
        recipe_id: String,
        api_method: HttpMethod,
    ) -> Session {
        let session = Session::new(name, recipe_id, api_method);
        self.insert_session(session.clone(), true);
        session
    }

    /// Append a session, optionally without switching the active session
    /// (background initialization during collection forks).
    pub fn insert_session(&mut self, session: Session, activate: bool) {
        debug!(session_id = %session.id, activate, "insert session");
        if activate {
            self.current = Some(session.id.clone());
        }
        self.sessions.push(session);
    }

    /// Rename in place. Renaming an unknown session is a missing-reference
    /// error at the caller's door, not a silent no-op.
    pub fn update_session_name(&mut self, session_id: &str, name: String) -> Result<()> {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| Error::missing(format!("session {}", session_id)))?;
        session.name = name;
        Ok(())
    }

    /// Copy a session under a fresh id, inserted immediately after the
    /// original. The copy does not become the active session.
    pub fn duplicate_session(&mut self, session_id: &str, name: Option<String>) -> Result<Session> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.id == session_id)
            .ok_or_else(|| Error::missing(format!("session {}", session_id)))?;

        let mut copy = self.sessions[index].clone();
        copy.id = new_id();
        copy.name = name.unwrap_or_else(|| format!("{} copy", copy.name));
        self.sessions.insert(index + 1, copy.clone());
        Ok(copy)
    }

    /// Remove a session and report the next session to activate: the one
    /// that took the closed session's place, else the new last, else none.
    /// Closing an unknown id returns `None` without touching anything, so
    /// a double-fired delete stays safe.
    pub fn close_session(&mut self, session_id: &str) -> Option<Session> {
        let index = self.sessions.iter().position(|s| s.id == session_id)?;
        self.sessions.remove(index);
        debug!(session_id, "closed session");

        let next = self
            .sessions
            .get(index)
            .or_else(|| self.sessions.last())
            .cloned();
        if self.current.as_deref() == Some(session_id) {
            self.current = next.as_ref().map(|s| s.id.clone());
        }
        next
    }

    // -- Per-recipe editor configs --

    pub fn config_for_recipe(&self, recipe_id: &str) -> Option<&SessionConfig> {
        self.configs.get(recipe_id)
    }

    pub fn set_config(&mut self, recipe_id: String, config: SessionConfig) {
        self.configs.insert(recipe_id, config);
    }

    // -- Persistence --

    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(SESSIONS_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)
            .map_err(|e| Error::storage(format!("Failed to read session store: {}", e)))?;
        let store: SessionStore = serde_json::from_str(&contents)
            .map_err(|e| Error::storage(format!("Failed to parse session store: {}", e)))?;
        if store.version != SESSION_STORE_VERSION {
            return Err(Error::storage(format!(
                "Unsupported session store version: {}",
                store.version
            )));
        }
        Ok(store)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .map_err(|e| Error::storage(format!("Failed to create data directory: {}", e)))?;
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::storage(format!("Failed to serialize session store: {}", e)))?;
        fs::write(dir.join(SESSIONS_FILE_NAME), json)
            .map_err(|e| Error::storage(format!("Failed to write session store: {}", e)))
    }
}
