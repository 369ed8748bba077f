use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

/// One editable/runnable request instance. Sessions reference a recipe by
/// id and never mutate the recipe itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub recipe_id: String,
    pub api_method: HttpMethod,
}

impl Session {
    pub fn new(name: String, recipe_id: String, api_method: HttpMethod) -> Self {
        Self {
            id: new_id(),
            name,
            recipe_id,
            api_method,
        }
    }
}

/// A parameter name a recipe declares for one of its auth kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeAuthOption {
    #[serde(rename = "type")]
    pub auth_type: String,
    pub name: String,
}

/// Immutable request template authored outside the workbench.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub method: HttpMethod,
    pub path: String,
    /// Declared auth kind, e.g. "bearer" or "query". Free-form: unknown
    /// values map to no auth config rather than an error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auth_options: Vec<RecipeAuthOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_params: Option<Value>,
}

/// Editor-ready configuration derived from a recipe. Secret values never
/// live here; they stay in the secret store keyed by recipe id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
    pub url: String,
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_params_schema: Option<Value>,
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

/// A session config paired with the recipe it was derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeConfig {
    pub recipe_id: String,
    pub config: SessionConfig,
}

/// Map a recipe's declared fields into an editor-ready config skeleton.
/// Never fails: an absent or unrecognized auth declaration yields a config
/// with no auth.
pub fn config_from_recipe(recipe: &Recipe) -> RecipeConfig {
    let auth = recipe
        .auth
        .as_deref()
        .and_then(|kind| AuthConfig::from_declared(kind, &recipe.auth_options));

    RecipeConfig {
        recipe_id: recipe.id.clone(),
        config: SessionConfig {
            auth,
            url: recipe.path.clone(),
            method: recipe.method,
            body_schema: recipe.request_body.clone(),
            query_schema: recipe.query_params.clone(),
            url_params_schema: recipe.url_params.clone(),
            title: recipe.title.clone(),
            summary: recipe.summary.clone(),
        },
    }
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
