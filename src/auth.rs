use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::RecipeAuthOption;
use crate::secrets::SecretStore;

// ---------------------------------------------------------------------------
// Auth config — how a request authenticates, decoupled from secret values.
// ---------------------------------------------------------------------------

/// Keyed auth entry: an API key carried in a header or a query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum KeyedAuth {
    Header { name: String },
    Query { name: String },
}

impl KeyedAuth {
    pub fn name(&self) -> &str {
        match self {
            KeyedAuth::Header { name } | KeyedAuth::Query { name } => name,
        }
    }

    pub fn set_name(&mut self, new_name: String) {
        match self {
            KeyedAuth::Header { name } | KeyedAuth::Query { name } => *name = new_name,
        }
    }
}

/// How a request authenticates. Secret values live in the secret store
/// keyed by recipe id, never in this config. Unrecognized `type` tags are
/// rejected at deserialization rather than falling through silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum AuthConfig {
    None,
    Bearer,
    Query { name: String },
    Header { name: String },
    Basic,
    Multiple(Vec<KeyedAuth>),
}

impl AuthConfig {
    /// Build the default config skeleton for a recipe's declared auth kind.
    /// Unknown kinds yield `None` (the recipe simply gets no auth config).
    pub fn from_declared(kind: &str, options: &[RecipeAuthOption]) -> Option<AuthConfig> {
        let declared_name = |kind: &str| {
            options
                .iter()
                .find(|o| o.auth_type.eq_ignore_ascii_case(kind))
                .map(|o| o.name.clone())
        };

        match kind.to_ascii_lowercase().as_str() {
            "bearer" => Some(AuthConfig::Bearer),
            "basic" => Some(AuthConfig::Basic),
            "query" => Some(AuthConfig::Query {
                name: declared_name("query").unwrap_or_else(|| "api_key".to_string()),
            }),
            "header" => Some(AuthConfig::Header {
                name: declared_name("header").unwrap_or_else(|| "Authorization".to_string()),
            }),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Basic auth credentials.
//
// Stored as base64("username:password") in the secret store. This is a
// reversible encoding for transport convenience — obfuscation only, NOT
// encryption. Do not present it to users as a security boundary.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Encode as base64("username:password").
    pub fn encode(&self) -> String {
        BASE64.encode(format!("{}:{}", self.username, self.password))
    }

    /// Decode a stored secret back into credentials. The password may
    /// itself contain ':'; only the first separator splits.
    pub fn decode(secret: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(secret)
            .map_err(|e| Error::Validation(format!("invalid basic auth secret: {}", e)))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| Error::Validation(format!("invalid basic auth secret: {}", e)))?;
        let (username, password) = text
            .split_once(':')
            .ok_or_else(|| Error::Validation("basic auth secret missing ':'".to_string()))?;
        Ok(Self::new(username, password))
    }
}

// ---------------------------------------------------------------------------
// Multiple-auth editor.
//
// The persisted shape is a `Multiple` config plus a JSON-encoded string
// array under the recipe's secret key. Editing works over a single
// sequence of {config, secret} pairs so the two halves cannot drift apart
// on insert/remove; `save` writes both in one combined operation.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MultiAuthEntry {
    pub config: KeyedAuth,
    pub secret: String,
}

#[derive(Debug, Clone, Default)]
pub struct MultiAuthEditor {
    entries: Vec<MultiAuthEntry>,
}

impl MultiAuthEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair a `Multiple` config with its stored secrets. Missing secrets
    /// pad as empty strings; stale extras beyond the config length drop.
    pub fn load(
        configs: &[KeyedAuth],
        store: &dyn SecretStore,
        recipe_id: &str,
    ) -> Result<Self> {
        let secrets = store.get_secret_array(recipe_id)?;
        let entries = configs
            .iter()
            .enumerate()
            .map(|(i, config)| MultiAuthEntry {
                config: config.clone(),
                secret: secrets.get(i).cloned().unwrap_or_default(),
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[MultiAuthEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, config: KeyedAuth) {
        self.entries.push(MultiAuthEntry {
            config,
            secret: String::new(),
        });
    }

    /// Remove entry `i`. Config and secret leave together.
    pub fn remove(&mut self, i: usize) -> Option<MultiAuthEntry> {
        if i < self.entries.len() {
            Some(self.entries.remove(i))
        } else {
            None
        }
    }

    pub fn set_config(&mut self, i: usize, config: KeyedAuth) -> Result<()> {
        let entry = self
            .entries
            .get_mut(i)
            .ok_or_else(|| Error::missing(format!("auth entry {}", i)))?;
        entry.config = config;
        Ok(())
    }

    pub fn set_secret(&mut self, i: usize, secret: String) -> Result<()> {
        let entry = self
            .entries
            .get_mut(i)
            .ok_or_else(|| Error::missing(format!("auth entry {}", i)))?;
        entry.secret = secret;
        Ok(())
    }

    pub fn configs(&self) -> Vec<KeyedAuth> {
        self.entries.iter().map(|e| e.config.clone()).collect()
    }

    pub fn secrets(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.secret.clone()).collect()
    }

    /// Combined save: persists the secret array and returns the matching
    /// `Multiple` config to install on the session in the same step.
    pub fn save(&self, store: &mut dyn SecretStore, recipe_id: &str) -> Result<AuthConfig> {
        store.save_secret_array(recipe_id, &self.secrets())?;
        Ok(AuthConfig::Multiple(self.configs()))
    }

    /// Clear every entry and the stored secret for this recipe.
    pub fn delete_all(&mut self, store: &mut dyn SecretStore, recipe_id: &str) -> Result<()> {
        self.entries.clear();
        store.delete_secret(recipe_id)
    }
}
