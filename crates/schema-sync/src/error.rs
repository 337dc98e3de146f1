//! Error types.

use std::io;
use std::path::PathBuf;

use url::Url;

use crate::manifest::ConsumerIdentity;

/// Errors raised while reading or validating a consumer manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest file could not be read
    #[error("Failed to read manifest {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    /// The manifest is not valid JSON
    #[error("Manifest is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The manifest root is not a JSON object
    #[error("Manifest root must be a JSON object")]
    NotAnObject,

    /// Schemas are declared but the owner identity is incomplete
    #[error("Manifest declares schemas but has no `{field}` string")]
    MissingIdentity { field: &'static str },

    /// The owner name or version cannot be used as a namespace key
    #[error("Invalid consumer {field} `{value}`")]
    InvalidIdentity { field: &'static str, value: String },

    /// A schema name cannot be used as a cache key
    #[error("Invalid schema name `{0}`")]
    InvalidSchemaName(String),

    /// A schema URL is missing, relative, or uses an unsupported scheme
    #[error("Invalid URL for schema `{name}`: {reason}")]
    InvalidSchemaUrl { name: String, reason: String },

    /// Plain HTTP URL while HTTPS is required
    #[error("HTTPS required for schema `{name}`: {url}")]
    HttpsRequired { name: String, url: Url },
}

/// Errors from a single conditional fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection-level failure (DNS, TCP, TLS, timeout)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Any status other than success or 304
    #[error("HTTP {status}")]
    Http { status: u16 },

    /// Response body is not JSON
    #[error("Failed to parse JSON: {0}")]
    Parse(serde_json::Error),

    /// Success response without `ETag` or `Last-Modified`
    #[error("Response provides neither ETag nor Last-Modified header, caching not possible")]
    ValidatorMissing,

    /// Response body exceeds the configured limit
    #[error("Payload size exceeds limit: {size} > {limit}")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// 304 in answer to a request that carried no validators
    #[error("Server answered 304 Not Modified to an unconditional request")]
    UnexpectedNotModified,
}

/// Errors from the on-disk cache store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The namespace directory cannot be created or accessed
    #[error("Cache namespace {path} is unavailable: {source}")]
    StorageUnavailable { path: PathBuf, source: io::Error },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tempfile persist error
    #[error("Failed to persist temp file: {0}")]
    TempfilePersist(#[from] tempfile::PersistError),

    /// An existing entry cannot be parsed
    #[error("Cache entry `{name}` is corrupt: {reason}")]
    Corrupt { name: String, reason: String },
}

/// Errors from index publication.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// A declared name has no successfully written entry
    #[error("No cache entry for declared schema `{0}`")]
    MissingEntry(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-schema failure inside a sync run.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that abort a sync run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    /// A declared schema could not be fetched or stored
    #[error("Failed to process schema '{name}' from {url}: {cause}")]
    Schema {
        name: String,
        url: Url,
        cause: SchemaError,
    },

    #[error("Failed to publish index: {0}")]
    Publish(#[from] PublishError),

    /// The HTTP client could not be built
    #[error("Failed to create HTTP client: {0}")]
    Client(FetchError),
}

/// Errors from the runtime accessor.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No manifest found walking up from the start directory
    #[error("No manifest found above {0}")]
    ManifestNotFound(PathBuf),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The consumer has never been synchronized
    #[error("No published index for {identity} at {path}")]
    NotSynchronized {
        identity: ConsumerIdentity,
        path: PathBuf,
    },

    /// The index exists but cannot be read
    #[error("Failed to read index {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    /// The index exists but is not a name-to-payload object
    #[error("Index {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}
