//! Consumer manifest parsing.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value;
use url::Url;

use crate::error::ManifestError;

/// The manifest filename looked up when no path is given.
pub const MANIFEST_FILENAME: &str = "package.json";

/// The `(name, version)` pair of a manifest owner.
///
/// Used only as a namespace key: two identities never share cache entries or
/// an index, even when they declare the same schema name and URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerIdentity {
    name: String,
    version: String,
}

impl ConsumerIdentity {
    /// Create an identity, rejecting values that cannot form a cache path.
    ///
    /// Scoped names such as `@scope/pkg` are accepted and nest one directory
    /// per segment.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self, ManifestError> {
        let name = name.into();
        let version = version.into();

        if name.is_empty() || !name.split('/').all(is_safe_segment) {
            return Err(ManifestError::InvalidIdentity {
                field: "name",
                value: name,
            });
        }
        if !is_safe_segment(&version) {
            return Err(ManifestError::InvalidIdentity {
                field: "version",
                value: version,
            });
        }

        Ok(Self { name, version })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The namespace directory for this identity under `cache_root`.
    pub fn namespace_dir(&self, cache_root: &Path) -> PathBuf {
        let mut dir = cache_root.to_path_buf();
        for segment in self.name.split('/') {
            dir.push(segment);
        }
        dir.push(&self.version);
        dir
    }
}

impl fmt::Display for ConsumerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// The projection of a consumer manifest relevant to schema synchronization.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    name: Option<String>,
    version: Option<String>,
    /// `None` when `schemas` is absent or not an object.
    schemas: Option<IndexMap<String, Url>>,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse manifest JSON.
    ///
    /// A missing or non-object `schemas` property is not an error; the
    /// resulting manifest simply declares nothing. A present `schemas` object
    /// is validated eagerly so a bad entry fails before any network access.
    pub fn parse(json: &str) -> Result<Self, ManifestError> {
        let Value::Object(root) = serde_json::from_str::<Value>(json)? else {
            return Err(ManifestError::NotAnObject);
        };

        let string_field = |key: &str| root.get(key).and_then(Value::as_str).map(String::from);

        let schemas = match root.get("schemas") {
            Some(Value::Object(entries)) => {
                let mut schemas = IndexMap::with_capacity(entries.len());
                for (name, url) in entries {
                    schemas.insert(name.clone(), parse_schema_entry(name, url)?);
                }
                Some(schemas)
            }
            _ => None,
        };

        Ok(Self {
            name: string_field("name"),
            version: string_field("version"),
            schemas,
        })
    }

    /// Declared schemas in manifest order, or `None` if nothing is declared.
    pub fn schemas(&self) -> Option<&IndexMap<String, Url>> {
        self.schemas.as_ref()
    }

    /// The owner identity used to namespace the cache.
    pub fn identity(&self) -> Result<ConsumerIdentity, ManifestError> {
        let name = self
            .name
            .clone()
            .ok_or(ManifestError::MissingIdentity { field: "name" })?;
        let version = self
            .version
            .clone()
            .ok_or(ManifestError::MissingIdentity { field: "version" })?;
        ConsumerIdentity::new(name, version)
    }

    /// Reject any declared `http://` URL.
    pub fn check_https(&self) -> Result<(), ManifestError> {
        for (name, url) in self.schemas.iter().flatten() {
            if url.scheme() != "https" {
                return Err(ManifestError::HttpsRequired {
                    name: name.clone(),
                    url: url.clone(),
                });
            }
        }
        Ok(())
    }
}

fn parse_schema_entry(name: &str, value: &Value) -> Result<Url, ManifestError> {
    if !is_safe_segment(name) {
        return Err(ManifestError::InvalidSchemaName(name.to_string()));
    }

    let invalid = |reason: String| ManifestError::InvalidSchemaUrl {
        name: name.to_string(),
        reason,
    };

    let raw = value
        .as_str()
        .ok_or_else(|| invalid("expected a URL string".to_string()))?;
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme `{other}`"))),
    }
}

/// Names and versions become directory and file names.
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}
