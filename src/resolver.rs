// 📮 Address Resolver - postal code → locality / street / district
//
// The directory is an external collaborator behind `PostalDirectory`.
// `AddressResolver` collapses every failure (unknown code, HTTP status,
// transport error, bad body) into `None`. The cause is only logged.

use crate::record::Address;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

// ============================================================================
// DIRECTORY REPLY
// ============================================================================

/// Structured reply from the postal directory.
///
/// Accepts the ViaCEP field names and the neutral ones. Missing keys
/// become empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostalReply {
    #[serde(rename = "localidade", alias = "locality", default)]
    pub locality: String,

    #[serde(rename = "logradouro", alias = "street", default)]
    pub street: String,

    #[serde(rename = "bairro", alias = "district", default)]
    pub district: String,

    /// Set by the directory when the code is well-formed but unknown
    #[serde(rename = "erro", default, deserialize_with = "lenient_flag")]
    pub unknown: bool,
}

impl From<PostalReply> for Address {
    fn from(reply: PostalReply) -> Self {
        Address {
            locality: reply.locality,
            street: reply.street,
            district: reply.district,
        }
    }
}

/// ViaCEP has sent the marker both as `true` and as `"true"`.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

// ============================================================================
// DIRECTORY SEAM
// ============================================================================

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("postal directory returned HTTP {0}")]
    Status(u16),

    #[error("postal directory unreachable: {0}")]
    Transport(String),

    #[error("postal directory reply could not be parsed: {0}")]
    Parse(String),

    #[error("postal code {0} is unknown to the directory")]
    Unknown(String),
}

/// External postal-code directory
pub trait PostalDirectory: Send + Sync {
    fn fetch(&self, postal_code: &str) -> Result<PostalReply, LookupError>;

    /// Short name for logs
    fn name(&self) -> &str {
        "postal-directory"
    }
}

// ============================================================================
// HTTP DIRECTORY
// ============================================================================

/// Default ViaCEP endpoint (`{base}/{code}/json/`)
pub const DEFAULT_LOOKUP_URL: &str = "https://viacep.com.br/ws";

/// Connect limit ureq applies on its own; kept explicit here
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP client for a ViaCEP-style directory
pub struct HttpPostalDirectory {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpPostalDirectory {
    /// `timeout` bounds the whole request. With `None` only connecting is
    /// bounded (`CONNECT_TIMEOUT`); reading the reply may block indefinitely.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new().timeout_connect(CONNECT_TIMEOUT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        HttpPostalDirectory {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent: builder.build(),
        }
    }

    pub fn endpoint(&self, postal_code: &str) -> String {
        format!("{}/{}/json/", self.base_url, postal_code)
    }
}

impl PostalDirectory for HttpPostalDirectory {
    fn fetch(&self, postal_code: &str) -> Result<PostalReply, LookupError> {
        let url = self.endpoint(postal_code);
        debug!(%url, "querying postal directory");

        let response = self
            .agent
            .get(&url)
            .set("Accept", "application/json")
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(status, _) => LookupError::Status(status),
                ureq::Error::Transport(transport) => LookupError::Transport(transport.to_string()),
            })?;

        let reply: PostalReply = serde_json::from_reader(response.into_reader())
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        if reply.unknown {
            return Err(LookupError::Unknown(postal_code.to_string()));
        }
        Ok(reply)
    }

    fn name(&self) -> &str {
        "viacep"
    }
}

// ============================================================================
// STATIC DIRECTORY
// ============================================================================

/// In-memory directory for tests and offline runs
#[derive(Debug, Clone, Default)]
pub struct StaticPostalDirectory {
    entries: HashMap<String, Address>,
}

impl StaticPostalDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, postal_code: impl Into<String>, address: Address) -> Self {
        self.entries.insert(postal_code.into(), address);
        self
    }

    pub fn insert(&mut self, postal_code: impl Into<String>, address: Address) {
        self.entries.insert(postal_code.into(), address);
    }

    /// Load a `{ "01001000": { "locality": .., "street": .., "district": .. } }` file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path).context("Failed to read postal fixtures")?;
        let entries: HashMap<String, Address> =
            serde_json::from_str(&raw).context("Failed to parse postal fixtures")?;
        Ok(StaticPostalDirectory { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PostalDirectory for StaticPostalDirectory {
    fn fetch(&self, postal_code: &str) -> Result<PostalReply, LookupError> {
        self.entries
            .get(postal_code)
            .map(|a| PostalReply {
                locality: a.locality.clone(),
                street: a.street.clone(),
                district: a.district.clone(),
                unknown: false,
            })
            .ok_or_else(|| LookupError::Unknown(postal_code.to_string()))
    }

    fn name(&self) -> &str {
        "static"
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Adapter the workflow talks to
pub struct AddressResolver {
    directory: Box<dyn PostalDirectory>,
}

impl AddressResolver {
    pub fn new(directory: Box<dyn PostalDirectory>) -> Self {
        AddressResolver { directory }
    }

    /// Resolve a postal code that already passed `validate_postal_code`.
    /// No retry, no cache.
    pub fn resolve(&self, postal_code: &str) -> Option<Address> {
        match self.directory.fetch(postal_code) {
            Ok(reply) => Some(reply.into()),
            Err(e) => {
                warn!(
                    directory = self.directory.name(),
                    postal_code,
                    error = %e,
                    "address lookup failed"
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for AddressResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressResolver")
            .field("directory", &self.directory.name())
            .finish()
    }
}
