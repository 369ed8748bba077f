use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::Recipe;

/// One page of a remote project: its recipe list, when the project
/// resolves. A missing project yields `recipes: None`, not an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPage {
    #[serde(default)]
    pub recipes: Option<Vec<Recipe>>,
}

/// Remote fallback used by fork flows when the local collection cache
/// has no answer.
#[async_trait]
pub trait ProjectFetcher: Send + Sync {
    async fn fetch_project_page(&self, project: &str) -> Result<ProjectPage>;
    async fn fetch_recipe(&self, recipe_id: &str) -> Result<Option<Recipe>>;
}

// ---------------------------------------------------------------------------
// HTTP backend.
// ---------------------------------------------------------------------------

pub struct HttpProjectFetcher {
    client: Client,
    base_url: String,
}

impl HttpProjectFetcher {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let mut builder = Client::builder();
        if timeout_secs > 0 {
            builder = builder.timeout(std::time::Duration::from_secs(timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| Error::Remote(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProjectFetcher for HttpProjectFetcher {
    async fn fetch_project_page(&self, project: &str) -> Result<ProjectPage> {
        let url = format!("{}/projects/{}", self.base_url, project);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(format_request_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(ProjectPage::default());
        }
        if !response.status().is_success() {
            return Err(Error::Remote(format!(
                "Project fetch failed: {}",
                response.status()
            )));
        }
        response
            .json::<ProjectPage>()
            .await
            .map_err(|e| Error::Remote(format!("Failed to decode project page: {}", e)))
    }

    async fn fetch_recipe(&self, recipe_id: &str) -> Result<Option<Recipe>> {
        let url = format!("{}/recipes/{}", self.base_url, recipe_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(format_request_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::Remote(format!(
                "Recipe fetch failed: {}",
                response.status()
            )));
        }
        let recipe = response
            .json::<Recipe>()
            .await
            .map_err(|e| Error::Remote(format!("Failed to decode recipe: {}", e)))?;
        Ok(Some(recipe))
    }
}

fn format_request_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        return Error::Remote("Request timed out".to_string());
    }
    if err.is_connect() {
        if let Some(url) = err.url() {
            if let Some(host) = url.host_str() {
                return Error::Remote(format!("Connection failed: {}", host));
            }
        }
        return Error::Remote("Connection failed".to_string());
    }
    if err.is_builder() {
        return Error::Remote(format!("Invalid URL: {}", err));
    }
    Error::Remote(format!("Request failed: {}", err))
}
