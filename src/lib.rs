//! Galley — the data-model core of an API client.
//!
//! Sessions are lightweight tabs referencing immutable recipes; folders
//! organize sessions into a tree; auth configuration is modeled as a
//! tagged union kept separate from the secret values it points at. Fork
//! markers drive a consume-once flow that turns shared recipes and
//! collections into local sessions, and the workspace ties the stores
//! together with an event bus and a deferred-cleanup queue.

pub mod auth;
pub mod collections;
pub mod config;
pub mod error;
pub mod events;
pub mod fork;
pub mod models;
pub mod remote;
pub mod secrets;
pub mod store;
pub mod workspace;

pub use auth::{AuthConfig, BasicCredentials, KeyedAuth, MultiAuthEditor, MultiAuthEntry};
pub use collections::{CollectionCache, ProjectCollection};
pub use config::{load_config, Config};
pub use error::{Error, Result};
pub use events::{AppEvent, EventBus, Subscription};
pub use fork::{run_fork_flow, ForkMarkers, ForkOutcome};
pub use models::{config_from_recipe, new_id, HttpMethod, Recipe, RecipeConfig, Session, SessionConfig};
pub use remote::{HttpProjectFetcher, ProjectFetcher, ProjectPage};
pub use secrets::{FileSecretStore, MemorySecretStore, SecretStore};
pub use store::{build_tree, Folder, FolderItem, FolderItemRef, FolderNode, FolderSet, FolderTree, SessionStore};
pub use workspace::{DeferredOp, Workspace};
