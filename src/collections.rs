use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Recipe;

const COLLECTIONS_VERSION: u32 = 1;
const COLLECTIONS_FILE_NAME: &str = "collections.json";

/// A locally cached collection: a named project with its recipe list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCollection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
}

/// Local-first lookup for collections and their recipes. Consulted before
/// any remote fetch during fork flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionCache {
    pub version: u32,
    projects: Vec<ProjectCollection>,
}

impl Default for CollectionCache {
    fn default() -> Self {
        Self {
            version: COLLECTIONS_VERSION,
            projects: Vec::new(),
        }
    }
}

impl CollectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projects(&self) -> &[ProjectCollection] {
        &self.projects
    }

    pub fn add_project(&mut self, project: ProjectCollection) {
        self.projects.push(project);
    }

    /// Look up a project by exact id or case-insensitive name. Unknown
    /// identifiers are simply absent, never an error.
    pub fn project_info(&self, name_or_id: &str) -> Option<&ProjectCollection> {
        self.projects
            .iter()
            .find(|p| p.id == name_or_id || p.name.eq_ignore_ascii_case(name_or_id))
    }

    pub fn recipe(&self, recipe_id: &str) -> Option<&Recipe> {
        self.projects
            .iter()
            .flat_map(|p| p.recipes.iter())
            .find(|r| r.id == recipe_id)
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(COLLECTIONS_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)
            .map_err(|e| Error::storage(format!("Failed to read collection cache: {}", e)))?;
        let cache: CollectionCache = serde_json::from_str(&contents)
            .map_err(|e| Error::storage(format!("Failed to parse collection cache: {}", e)))?;
        if cache.version != COLLECTIONS_VERSION {
            return Err(Error::storage(format!(
                "Unsupported collection cache version: {}",
                cache.version
            )));
        }
        Ok(cache)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .map_err(|e| Error::storage(format!("Failed to create data directory: {}", e)))?;
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::storage(format!("Failed to serialize collection cache: {}", e)))?;
        fs::write(dir.join(COLLECTIONS_FILE_NAME), json)
            .map_err(|e| Error::storage(format!("Failed to write collection cache: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HttpMethod;

    fn cache_with_project() -> CollectionCache {
        let mut cache = CollectionCache::new();
        cache.add_project(ProjectCollection {
            id: "proj-1".to_string(),
            name: "Weather API".to_string(),
            recipes: vec![Recipe {
                id: "r1".to_string(),
                title: "Current".to_string(),
                summary: String::new(),
                method: HttpMethod::Get,
                path: "https://api.example.com/current".to_string(),
                auth: None,
                auth_options: vec![],
                request_body: None,
                query_params: None,
                url_params: None,
            }],
        });
        cache
    }

    #[test]
    fn test_project_lookup_by_id_and_name() {
        let cache = cache_with_project();
        assert!(cache.project_info("proj-1").is_some());
        assert!(cache.project_info("weather api").is_some());
        assert!(cache.project_info("unknown").is_none());
    }

    #[test]
    fn test_recipe_lookup() {
        let cache = cache_with_project();
        assert_eq!(cache.recipe("r1").unwrap().title, "Current");
        assert!(cache.recipe("r2").is_none());
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_with_project();
        cache.save(dir.path()).unwrap();

        let loaded = CollectionCache::load(dir.path()).unwrap();
        assert_eq!(loaded.projects().len(), 1);
        assert_eq!(loaded.recipe("r1").unwrap().title, "Current");
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CollectionCache::load(dir.path()).unwrap().projects().is_empty());
    }
}
