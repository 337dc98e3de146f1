//! Reconciliation of declared schemas against the cache.

use std::path::PathBuf;

use indexmap::IndexMap;
use tracing::{info, warn};
use url::Url;

use crate::config::SyncOptions;
use crate::error::{FetchError, SchemaError, StoreError, SyncError};
use crate::fetch::{FetchOutcome, Fetcher, HttpFetcher, bundle_url};
use crate::index;
use crate::lock::NamespaceLock;
use crate::manifest::{ConsumerIdentity, Manifest};
use crate::meta::CacheEntry;
use crate::store::{CacheStore, FsStore};

/// What happened to one cache entry during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    /// Fetched and written.
    Downloaded,
    /// Server answered 304; entry kept as-is.
    UpToDate,
    /// No longer declared; deleted.
    Removed,
    /// No longer declared; deletion failed and was tolerated.
    RemovalFailed,
}

/// Summary of a sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// `None` when the manifest declares no schemas and nothing was done.
    pub identity: Option<ConsumerIdentity>,
    /// Per-name actions, removals first, then declared names in manifest order.
    pub actions: Vec<(String, EntryAction)>,
    /// Path of the regenerated index.
    pub index_path: Option<PathBuf>,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.identity.is_none()
    }

    pub fn count(&self, action: EntryAction) -> usize {
        self.actions.iter().filter(|(_, a)| *a == action).count()
    }

    pub fn downloaded(&self) -> usize {
        self.count(EntryAction::Downloaded)
    }

    pub fn up_to_date(&self) -> usize {
        self.count(EntryAction::UpToDate)
    }

    pub fn removed(&self) -> usize {
        self.count(EntryAction::Removed)
    }

    pub fn action(&self, name: &str) -> Option<EntryAction> {
        self.actions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, action)| *action)
    }
}

/// Drives removals and conditional refreshes for one namespace.
///
/// Entries are committed one at a time: a failure stops the pass but leaves
/// every entry written before it in place.
pub struct Reconciler<'a, F: ?Sized, S: ?Sized> {
    fetcher: &'a F,
    store: &'a S,
}

impl<'a, F, S> Reconciler<'a, F, S>
where
    F: Fetcher + ?Sized,
    S: CacheStore + ?Sized,
{
    pub fn new(fetcher: &'a F, store: &'a S) -> Self {
        Self { fetcher, store }
    }

    /// Remove undeclared entries, then refresh every declared one.
    pub fn run(
        &self,
        declared: &IndexMap<String, Url>,
    ) -> Result<Vec<(String, EntryAction)>, SyncError> {
        let existing = self.store.list()?;
        let mut actions = Vec::with_capacity(declared.len());

        for name in existing.iter().filter(|name| !declared.contains_key(*name)) {
            match self.store.remove(name) {
                Ok(()) => {
                    info!(schema = %name, "removed (no longer declared)");
                    actions.push((name.clone(), EntryAction::Removed));
                }
                Err(e) => {
                    warn!(schema = %name, error = %e, "failed to remove stale cache entry");
                    actions.push((name.clone(), EntryAction::RemovalFailed));
                }
            }
        }

        for (name, url) in declared {
            let action = self
                .refresh(name, url)
                .map_err(|cause| SyncError::Schema {
                    name: name.clone(),
                    url: url.clone(),
                    cause,
                })?;
            actions.push((name.clone(), action));
        }

        Ok(actions)
    }

    fn refresh(&self, name: &str, url: &Url) -> Result<EntryAction, SchemaError> {
        let prior = match self.store.read(name) {
            Ok(prior) => prior,
            Err(StoreError::Corrupt { reason, .. }) => {
                warn!(schema = name, %reason, "discarding corrupt cache entry");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let request_url = bundle_url(url);
        let mut outcome = self
            .fetcher
            .fetch(&request_url, prior.as_ref().map(|entry| &entry.validator))?;

        if outcome == FetchOutcome::NotModified {
            if prior.is_some() {
                info!(schema = name, "up to date");
                return Ok(EntryAction::UpToDate);
            }
            warn!(schema = name, "not modified without a cached entry, refetching");
            outcome = self.fetcher.fetch(&request_url, None)?;
        }

        match outcome {
            FetchOutcome::NotModified => Err(FetchError::UnexpectedNotModified.into()),
            FetchOutcome::Fresh { validator, payload } => {
                let entry = CacheEntry::new(url.to_string(), validator, payload);
                self.store.write(name, &entry)?;
                info!(schema = name, %url, "downloaded");
                Ok(EntryAction::Downloaded)
            }
        }
    }
}

/// Synchronizes manifests into namespaces under one cache root.
pub struct Synchronizer<F> {
    fetcher: F,
    cache_root: PathBuf,
    require_https: bool,
}

impl Synchronizer<HttpFetcher> {
    /// A synchronizer using the HTTP fetcher configured by `opts`.
    pub fn from_options(opts: &SyncOptions) -> Result<Self, SyncError> {
        let fetcher = HttpFetcher::new(opts).map_err(SyncError::Client)?;
        Ok(Self::new(fetcher, opts.cache_root()).require_https(opts.require_https))
    }
}

impl<F: Fetcher> Synchronizer<F> {
    pub fn new(fetcher: F, cache_root: PathBuf) -> Self {
        Self {
            fetcher,
            cache_root,
            require_https: false,
        }
    }

    pub fn require_https(mut self, require_https: bool) -> Self {
        self.require_https = require_https;
        self
    }

    /// Bring the manifest owner's namespace in line with its declared schemas
    /// and republish the index.
    ///
    /// The index is only rewritten when every declared schema was processed;
    /// a failed run leaves the previous index untouched.
    pub fn sync(&self, manifest: &Manifest) -> Result<SyncReport, SyncError> {
        let Some(declared) = manifest.schemas() else {
            info!("no schemas declared, nothing to do");
            return Ok(SyncReport::default());
        };
        if self.require_https {
            manifest.check_https()?;
        }

        let identity = manifest.identity()?;
        let store = FsStore::open(&self.cache_root, &identity)?;
        let _lock = NamespaceLock::acquire(store.dir())?;
        info!(consumer = %identity, dir = %store.dir().display(), "synchronizing schemas");

        let actions = Reconciler::new(&self.fetcher, &store).run(declared)?;
        let index_path = index::publish(&store, declared.keys().map(String::as_str))?;

        Ok(SyncReport {
            identity: Some(identity),
            actions,
            index_path: Some(index_path),
        })
    }
}
