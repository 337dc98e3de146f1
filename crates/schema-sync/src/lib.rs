//! Manifest-driven remote schema cache.
//!
//! A consumer package declares the JSON schemas it depends on in its own
//! manifest:
//!
//! ```json
//! {
//!   "name": "my-app",
//!   "version": "1.2.0",
//!   "schemas": {
//!     "core": "https://schemas.example.com/core.json"
//!   }
//! }
//! ```
//!
//! [`Synchronizer::sync`] fetches every declared schema with conditional
//! requests, stores one entry per schema in a namespace keyed by the
//! consumer's `(name, version)`, removes entries that are no longer declared,
//! and publishes an `index.json` mapping each declared name to its payload.
//! [`SchemaRegistry`] loads that index back at runtime.
//!
//! # Cache Layout
//!
//! ```text
//! $SCHEMA_SYNC_CACHE_DIR/          # or the platform cache dir + "schemas"
//!   my-app/
//!     1.2.0/
//!       .lock                      # held for the duration of a sync run
//!       index.json                 # { "core": { ...payload... } }
//!       entries/
//!         core.json                # validators + payload
//! ```
//!
//! # Example
//!
//! ```no_run
//! use schema_sync::{Manifest, SyncOptions, Synchronizer};
//!
//! let manifest = Manifest::load("package.json".as_ref()).unwrap();
//! let synchronizer = Synchronizer::from_options(&SyncOptions::default()).unwrap();
//! let report = synchronizer.sync(&manifest).unwrap();
//! println!("{} schemas downloaded", report.downloaded());
//! ```

mod accessor;
mod config;
mod error;
mod fetch;
mod index;
mod lock;
mod manifest;
mod meta;
mod reconcile;
mod store;

pub use accessor::{IdentityResolver, ManifestLookup, SchemaRegistry};
pub use config::{CACHE_DIR_ENV, SyncOptions, default_cache_dir};
pub use error::{
    FetchError, LoadError, ManifestError, PublishError, SchemaError, StoreError, SyncError,
};
pub use fetch::{FetchOutcome, Fetcher, HttpFetcher, SCHEMA_MEDIA_TYPE, bundle_url};
pub use index::{INDEX_FILENAME, Index, build_index, publish};
pub use lock::NamespaceLock;
pub use manifest::{ConsumerIdentity, MANIFEST_FILENAME, Manifest};
pub use meta::{CacheEntry, Validator};
pub use reconcile::{EntryAction, Reconciler, SyncReport, Synchronizer};
pub use store::{CacheStore, FsStore};
