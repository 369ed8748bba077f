use std::collections::HashSet;

use tracing::{debug, info};

use crate::collections::CollectionCache;
use crate::error::Result;
use crate::models::{config_from_recipe, Recipe, Session};
use crate::remote::ProjectFetcher;
use crate::store::SessionStore;

/// Transient fork markers: one slot per fork kind, consumed exactly once.
/// A recipe marker is `"<recipe_id>::<title>"` (title optional); a
/// collection marker is a bare project name or id.
#[derive(Debug, Clone, Default)]
pub struct ForkMarkers {
    recipe: Option<String>,
    collection: Option<String>,
}

impl ForkMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_recipe(&mut self, recipe_id: &str, title: Option<&str>) {
        let marker = match title {
            Some(title) if !title.is_empty() => format!("{}::{}", recipe_id, title),
            _ => recipe_id.to_string(),
        };
        self.recipe = Some(marker);
    }

    pub fn set_collection(&mut self, project: &str) {
        if !project.is_empty() {
            self.collection = Some(project.to_string());
        }
    }

    /// Consume the recipe marker. Empty markers count as absent.
    pub fn take_recipe(&mut self) -> Option<String> {
        self.recipe.take().filter(|m| !m.is_empty())
    }

    pub fn take_collection(&mut self) -> Option<String> {
        self.collection.take().filter(|m| !m.is_empty())
    }

    pub fn has_recipe(&self) -> bool {
        self.recipe.as_deref().is_some_and(|m| !m.is_empty())
    }

    pub fn has_collection(&self) -> bool {
        self.collection.as_deref().is_some_and(|m| !m.is_empty())
    }
}

/// Split a recipe marker into `(recipe_id, optional title)`.
fn parse_recipe_marker(marker: &str) -> (&str, Option<&str>) {
    match marker.split_once("::") {
        Some((id, title)) if !title.is_empty() => (id, Some(title)),
        Some((id, _)) => (id, None),
        None => (marker, None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForkOutcome {
    /// No marker was pending.
    Idle,
    /// Single-recipe fork. `session_id` is `None` when the recipe could
    /// not be resolved locally or remotely (empty result, not an error).
    Recipe { session_id: Option<String> },
    /// Collection fork: one session per resolved recipe, in list order.
    Collection { session_ids: Vec<String> },
}

/// Run one fork-flow pass over the pending markers.
///
/// A collection marker wins over a recipe marker when both are present;
/// the losing marker stays pending for a later pass. The consumed marker
/// is cleared before any resolution work, so the fork runs at most once
/// even if resolution fails. Collection recipes initialize strictly in
/// list order; only the last one becomes the current session. Duplicate
/// recipe ids within one pass collapse to a single session, but repeated
/// passes always create fresh sessions.
pub async fn run_fork_flow(
    sessions: &mut SessionStore,
    cache: &CollectionCache,
    fetcher: &dyn ProjectFetcher,
    markers: &mut ForkMarkers,
) -> Result<ForkOutcome> {
    if let Some(project) = markers.take_collection() {
        info!(project = %project, "forking collection");
        return fork_collection(sessions, cache, fetcher, &project).await;
    }
    if let Some(marker) = markers.take_recipe() {
        info!(marker = %marker, "forking recipe");
        return fork_recipe(sessions, cache, fetcher, &marker).await;
    }
    Ok(ForkOutcome::Idle)
}

async fn fork_recipe(
    sessions: &mut SessionStore,
    cache: &CollectionCache,
    fetcher: &dyn ProjectFetcher,
    marker: &str,
) -> Result<ForkOutcome> {
    let (recipe_id, title) = parse_recipe_marker(marker);

    let recipe = match cache.recipe(recipe_id).cloned() {
        Some(recipe) => Some(recipe),
        None => fetcher.fetch_recipe(recipe_id).await?,
    };
    let Some(recipe) = recipe else {
        debug!(recipe_id, "fork target not found locally or remotely");
        return Ok(ForkOutcome::Recipe { session_id: None });
    };

    let session = initialize_session(sessions, &recipe, title.map(String::from), false);
    Ok(ForkOutcome::Recipe {
        session_id: Some(session.id),
    })
}

async fn fork_collection(
    sessions: &mut SessionStore,
    cache: &CollectionCache,
    fetcher: &dyn ProjectFetcher,
    project: &str,
) -> Result<ForkOutcome> {
    let recipes: Vec<Recipe> = match cache.project_info(project) {
        Some(local) => local.recipes.clone(),
        None => fetcher
            .fetch_project_page(project)
            .await?
            .recipes
            .unwrap_or_default(),
    };

    // Idempotent per recipe id within this pass only.
    let mut seen: HashSet<String> = HashSet::new();
    let recipes: Vec<Recipe> = recipes
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();

    let mut session_ids = Vec::with_capacity(recipes.len());
    let count = recipes.len();
    for (i, recipe) in recipes.iter().enumerate() {
        let background = i != count - 1;
        let session = initialize_session(sessions, recipe, None, background);
        session_ids.push(session.id);
    }
    Ok(ForkOutcome::Collection { session_ids })
}

/// Create a session for a recipe: derive and store its editor config,
/// then insert the session, activating it unless `background`.
pub fn initialize_session(
    sessions: &mut SessionStore,
    recipe: &Recipe,
    title: Option<String>,
    background: bool,
) -> Session {
    let derived = config_from_recipe(recipe);
    sessions.set_config(derived.recipe_id.clone(), derived.config);

    let name = title.unwrap_or_else(|| recipe.title.clone());
    let session = Session::new(name, recipe.id.clone(), recipe.method);
    sessions.insert_session(session.clone(), !background);
    session
}
