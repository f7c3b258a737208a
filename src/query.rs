use crate::plugin::Message;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::{collections::BTreeSet, fs, path::Path, time::Duration};

pub const GET_CONFLICTING_PLUGINS: &str = "getConflictingPlugins";
const USER_AGENT: &str = "pluginlens";

/// Transport that answers named queries with a JSON string. `Ok(None)` means
/// the backend had nothing to say.
#[async_trait]
pub trait ConflictQuery: Send + Sync {
    async fn query(&self, operation: &str, payload: &str) -> Result<Option<String>>;
}

/// Fresh metadata for one plugin, as reported alongside a conflict check.
///
/// Fields missing from the response decode to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConflictEntry {
    pub conflicts: bool,
    pub crc: Option<u32>,
    pub is_empty: bool,
    pub messages: Vec<Message>,
    pub tags: BTreeSet<String>,
    pub is_dirty: bool,
}

/// Response entries in the order the backend sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictQueryResult {
    pub entries: Vec<(String, ConflictEntry)>,
}

impl ConflictQueryResult {
    /// Decodes a raw response. An absent or empty response, and any falsy
    /// JSON value (`null`, `false`, `0`, `""`), carries no conflict data.
    pub fn parse(raw: Option<&str>) -> Result<Option<Self>, serde_json::Error> {
        let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
            return Ok(None);
        };
        let value: Value = serde_json::from_str(raw)?;
        if is_falsy(&value) {
            return Ok(None);
        }
        let map: Map<String, Value> = serde_json::from_value(value)?;
        let mut entries = Vec::with_capacity(map.len());
        for (name, value) in map {
            let entry: ConflictEntry = serde_json::from_value(value)?;
            entries.push((name, entry));
        }
        Ok(Some(Self { entries }))
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

/// Posts `{"operation", "payload"}` to a loader backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpConflictQuery {
    endpoint: String,
    timeout: Duration,
}

impl HttpConflictQuery {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ConflictQuery for HttpConflictQuery {
    async fn query(&self, operation: &str, payload: &str) -> Result<Option<String>> {
        let endpoint = self.endpoint.clone();
        let timeout = self.timeout;
        let operation = operation.to_string();
        let payload = payload.to_string();
        tokio::task::spawn_blocking(move || post_query(&endpoint, timeout, &operation, &payload))
            .await
            .context("join query task")?
    }
}

fn post_query(
    endpoint: &str,
    timeout: Duration,
    operation: &str,
    payload: &str,
) -> Result<Option<String>> {
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(5))
        .timeout_read(timeout)
        .timeout_write(timeout)
        .build();
    let response = agent
        .post(endpoint)
        .set("User-Agent", USER_AGENT)
        .send_json(serde_json::json!({
            "operation": operation,
            "payload": payload,
        }))
        .with_context(|| format!("query {operation}"))?;
    if response.status() == 204 {
        return Ok(None);
    }
    let body = response
        .into_string()
        .with_context(|| format!("read {operation} response"))?;
    Ok(Some(body).filter(|body| !body.is_empty()))
}

/// Canned responses keyed by plugin name, loaded from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct FixtureQuery {
    responses: Map<String, Value>,
}

impl FixtureQuery {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read conflict fixture {}", path.display()))?;
        let responses: Map<String, Value> =
            serde_json::from_str(&raw).context("parse conflict fixture")?;
        Ok(Self { responses })
    }
}

#[async_trait]
impl ConflictQuery for FixtureQuery {
    async fn query(&self, operation: &str, payload: &str) -> Result<Option<String>> {
        if operation != GET_CONFLICTING_PLUGINS {
            anyhow::bail!("unsupported query: {operation}");
        }
        Ok(self
            .responses
            .get(payload)
            .filter(|value| !value.is_null())
            .map(Value::to_string))
    }
}
