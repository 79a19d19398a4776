// API client module: contains a small blocking HTTP client that talks to
// the food backend (json REST API, typically json-server on port 3001).
// It is intentionally small and synchronous; every command fetches fresh
// data, nothing is cached between commands.

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Simple API client that holds a reqwest blocking client and the base
/// URL of the food backend.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// One food from the catalog served by `GET /food`.
///
/// The backend stores the preference field under a misspelled name, so
/// the wire name is pinned with a serde rename while the Rust field
/// stays spelled correctly.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FoodItem {
    pub name: String,
    pub calories: f64,
    #[serde(rename = "dietary_preferances")]
    pub dietary_preferences: Vec<String>,
}

/// One logged serving. Calories are stored exact (base calories times
/// serving size); rounding happens only when displaying.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServingEntry {
    pub food: String,
    #[serde(rename = "servingSize")]
    pub serving_size: f64,
    pub calories: f64,
}

/// One element of a user's log: a single-entry map from the millisecond
/// timestamp the entry was created at to the entry itself. This mirrors
/// the shape the backend stores.
pub type LogEntry = BTreeMap<String, ServingEntry>;

/// A user record as served by `GET /users/:id`.
///
/// Only the `log` field is modeled; everything else the backend keeps on
/// the record is captured in `extra` so a fetch/append/replace cycle
/// round-trips fields this tool knows nothing about. The persist call is
/// a full-record replace, not a partial update.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserRecord {
    #[serde(default)]
    pub log: Vec<LogEntry>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserRecord {
    /// Append one serving entry keyed by the current millisecond
    /// timestamp.
    pub fn append_entry(&mut self, entry: ServingEntry) {
        self.append_entry_at(Utc::now().timestamp_millis(), entry);
    }

    /// Append `entry` keyed by `millis`, bumping the key forward until
    /// it is unique within the log. Two entries created in the same
    /// millisecond must not collide on key.
    pub fn append_entry_at(&mut self, mut millis: i64, entry: ServingEntry) {
        while self.contains_key(&millis.to_string()) {
            millis += 1;
        }
        let mut keyed = LogEntry::new();
        keyed.insert(millis.to_string(), entry);
        self.log.push(keyed);
    }

    fn contains_key(&self, key: &str) -> bool {
        self.log.iter().any(|e| e.contains_key(key))
    }
}

impl ApiClient {
    /// Create an ApiClient configured from the environment variable
    /// `FOOD_API_URL` or fallback to `http://localhost:3001`.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("FOOD_API_URL").unwrap_or_else(|_| "http://localhost:3001".into());
        Self::new(base_url)
    }

    /// Create an ApiClient for an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.into(),
        })
    }

    /// Fetch the full food catalog from `GET /food`.
    pub fn fetch_foods(&self) -> Result<Vec<FoodItem>> {
        let url = format!("{}/food", &self.base_url);
        debug!("GET {}", url);
        let res = self
            .client
            .get(&url)
            .send()
            .context("Failed to fetch the food catalog")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            warn!("food catalog request rejected: {}", status);
            anyhow::bail!("Fetching foods failed: {} - {}", status, txt);
        }
        res.json().context("Parsing food catalog json")
    }

    /// Fetch a user record from `GET /users/:id`.
    pub fn fetch_user(&self, id: &str) -> Result<UserRecord> {
        let url = format!("{}/users/{}", &self.base_url, id);
        debug!("GET {}", url);
        let res = self
            .client
            .get(&url)
            .send()
            .context("Failed to fetch the user record")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            warn!("user record request rejected: {}", status);
            anyhow::bail!("Fetching user {} failed: {} - {}", id, status, txt);
        }
        res.json().context("Parsing user record json")
    }

    /// Replace a user record wholesale via `PUT /users/:id` with a full
    /// JSON body.
    pub fn save_user(&self, id: &str, user: &UserRecord) -> Result<()> {
        let url = format!("{}/users/{}", &self.base_url, id);
        debug!("PUT {}", url);
        let res = self
            .client
            .put(&url)
            .json(user)
            .send()
            .context("Failed to persist the user record")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            warn!("user record update rejected: {}", status);
            anyhow::bail!("Saving user {} failed: {} - {}", id, status, txt);
        }
        Ok(())
    }
}
