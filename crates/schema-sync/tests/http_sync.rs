//! End-to-end synchronization against a local HTTP server.

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use pretty_assertions::assert_eq;
use schema_sync::{
    ConsumerIdentity, EntryAction, FetchError, FsStore, HttpFetcher, INDEX_FILENAME, Index,
    Manifest, SchemaError, SchemaRegistry, SyncError, SyncOptions, Synchronizer,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tiny_http::{Header, Request, Response, Server};

#[derive(Debug, Clone, Default)]
struct Route {
    status: u16,
    etag: Option<String>,
    last_modified: Option<String>,
    body: String,
}

impl Route {
    fn json(etag: &str, body: Value) -> Self {
        Self {
            status: 200,
            etag: Some(etag.to_string()),
            last_modified: None,
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Recorded {
    url: String,
    accept: Option<String>,
    if_none_match: Option<String>,
    if_modified_since: Option<String>,
}

type Routes = Arc<Mutex<HashMap<String, Route>>>;

/// Serves routes by path and answers 304 when a request's validator matches.
struct SchemaServer {
    server: Arc<Server>,
    routes: Routes,
    requests: Arc<Mutex<Vec<Recorded>>>,
    handle: Option<JoinHandle<()>>,
}

impl SchemaServer {
    fn start() -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let routes: Routes = Arc::default();
        let requests: Arc<Mutex<Vec<Recorded>>> = Arc::default();

        let handle = {
            let server = Arc::clone(&server);
            let routes = Arc::clone(&routes);
            let requests = Arc::clone(&requests);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    handle(request, &routes, &requests);
                }
            })
        };

        Self {
            server,
            routes,
            requests,
            handle: Some(handle),
        }
    }

    fn url(&self, path: &str) -> String {
        let addr = self.server.server_addr().to_ip().unwrap();
        format!("http://{addr}{path}")
    }

    fn route(&self, path: &str, route: Route) {
        self.routes.lock().unwrap().insert(path.to_string(), route);
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for SchemaServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn header(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str().to_string())
}

fn handle(request: Request, routes: &Routes, requests: &Mutex<Vec<Recorded>>) {
    let recorded = Recorded {
        url: request.url().to_string(),
        accept: header(&request, "Accept"),
        if_none_match: header(&request, "If-None-Match"),
        if_modified_since: header(&request, "If-Modified-Since"),
    };
    requests.lock().unwrap().push(recorded.clone());

    let path = recorded.url.split('?').next().unwrap_or_default();
    let Some(route) = routes.lock().unwrap().get(path).cloned() else {
        let _ = request.respond(Response::from_string("not found").with_status_code(404));
        return;
    };

    let etag_matches = route.etag.is_some() && recorded.if_none_match == route.etag;
    let date_matches = route.etag.is_none()
        && route.last_modified.is_some()
        && recorded.if_modified_since == route.last_modified;
    let status = if route.status == 200 && (etag_matches || date_matches) {
        304
    } else {
        route.status
    };

    let body = if status == 304 { String::new() } else { route.body };
    let mut response = Response::from_string(body).with_status_code(status);
    if let Some(etag) = &route.etag {
        response.add_header(Header::from_bytes(&b"ETag"[..], etag.as_bytes()).unwrap());
    }
    if let Some(last_modified) = &route.last_modified {
        response.add_header(
            Header::from_bytes(&b"Last-Modified"[..], last_modified.as_bytes()).unwrap(),
        );
    }
    let _ = request.respond(response);
}

fn manifest(schemas: Value) -> Manifest {
    Manifest::parse(
        &json!({ "name": "consumer", "version": "1.0.0", "schemas": schemas }).to_string(),
    )
    .unwrap()
}

fn options(temp: &TempDir) -> SyncOptions {
    SyncOptions {
        cache_dir: Some(temp.path().to_path_buf()),
        ..Default::default()
    }
}

fn namespace(temp: &TempDir) -> FsStore {
    FsStore::for_identity(
        temp.path(),
        &ConsumerIdentity::new("consumer", "1.0.0").unwrap(),
    )
}

fn load_index(temp: &TempDir) -> Index {
    Index::load(&namespace(temp).dir().join(INDEX_FILENAME)).unwrap()
}

#[test]
fn test_first_sync_then_conditional_resync() {
    let server = SchemaServer::start();
    server.route("/core.json", Route::json("\"c1\"", json!({"title": "core"})));
    let temp = TempDir::new().unwrap();
    let sync = Synchronizer::from_options(&options(&temp)).unwrap();
    let manifest = manifest(json!({"core": server.url("/core.json")}));

    let first = sync.sync(&manifest).unwrap();
    let second = sync.sync(&manifest).unwrap();

    assert_eq!(first.action("core"), Some(EntryAction::Downloaded));
    assert_eq!(second.action("core"), Some(EntryAction::UpToDate));

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url, "/core.json?bundle=1");
    assert_eq!(requests[0].accept.as_deref(), Some("application/schema+json"));
    assert_eq!(requests[0].if_none_match, None);
    assert_eq!(requests[1].if_none_match.as_deref(), Some("\"c1\""));

    assert_eq!(load_index(&temp).get("core"), Some(&json!({"title": "core"})));
}

#[test]
fn test_changed_schema_is_redownloaded() {
    let server = SchemaServer::start();
    server.route("/core.json", Route::json("\"c1\"", json!({"v": 1})));
    let temp = TempDir::new().unwrap();
    let sync = Synchronizer::from_options(&options(&temp)).unwrap();
    let manifest = manifest(json!({"core": server.url("/core.json")}));

    sync.sync(&manifest).unwrap();
    server.route("/core.json", Route::json("\"c2\"", json!({"v": 2})));
    let report = sync.sync(&manifest).unwrap();

    assert_eq!(report.action("core"), Some(EntryAction::Downloaded));
    assert_eq!(load_index(&temp).get("core"), Some(&json!({"v": 2})));
}

#[test]
fn test_last_modified_only() {
    let server = SchemaServer::start();
    server.route(
        "/dated.json",
        Route {
            status: 200,
            etag: None,
            last_modified: Some("Mon, 01 Jan 2024 00:00:00 GMT".to_string()),
            body: json!({"dated": true}).to_string(),
        },
    );
    let temp = TempDir::new().unwrap();
    let sync = Synchronizer::from_options(&options(&temp)).unwrap();
    let manifest = manifest(json!({"dated": server.url("/dated.json")}));

    sync.sync(&manifest).unwrap();
    let report = sync.sync(&manifest).unwrap();

    assert_eq!(report.action("dated"), Some(EntryAction::UpToDate));
    let requests = server.requests();
    assert_eq!(requests[1].if_none_match, None);
    assert_eq!(
        requests[1].if_modified_since.as_deref(),
        Some("Mon, 01 Jan 2024 00:00:00 GMT")
    );
}

#[test]
fn test_missing_validators_fail_the_run() {
    let server = SchemaServer::start();
    server.route(
        "/plain.json",
        Route {
            status: 200,
            body: json!({}).to_string(),
            ..Default::default()
        },
    );
    let temp = TempDir::new().unwrap();
    let sync = Synchronizer::from_options(&options(&temp)).unwrap();

    let err = sync
        .sync(&manifest(json!({"plain": server.url("/plain.json")})))
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Schema {
            cause: SchemaError::Fetch(FetchError::ValidatorMissing),
            ..
        }
    ));
    assert!(!namespace(&temp).entry_path("plain").exists());
    assert!(!namespace(&temp).dir().join(INDEX_FILENAME).exists());
}

#[test]
fn test_server_error_names_the_schema() {
    let server = SchemaServer::start();
    server.route("/ok.json", Route::json("\"ok\"", json!({"ok": true})));
    server.route(
        "/broken.json",
        Route {
            status: 500,
            body: "boom".to_string(),
            ..Default::default()
        },
    );
    let temp = TempDir::new().unwrap();
    let sync = Synchronizer::from_options(&options(&temp)).unwrap();
    let broken_url = server.url("/broken.json");

    let err = sync
        .sync(&manifest(json!({
            "ok": server.url("/ok.json"),
            "broken": &broken_url,
        })))
        .unwrap_err();

    match &err {
        SyncError::Schema {
            name,
            url,
            cause: SchemaError::Fetch(FetchError::Http { status }),
        } => {
            assert_eq!(name, "broken");
            assert_eq!(url.as_str(), broken_url);
            assert_eq!(*status, 500);
        }
        other => panic!("Expected HTTP failure for broken, got {other:?}"),
    }
    assert!(err.to_string().starts_with("Failed to process schema 'broken' from "));
    // The schema processed before the failure stays cached
    assert!(namespace(&temp).entry_path("ok").exists());
}

#[test]
fn test_invalid_json_body() {
    let server = SchemaServer::start();
    server.route(
        "/bad.json",
        Route {
            status: 200,
            etag: Some("\"b\"".to_string()),
            last_modified: None,
            body: "<html>".to_string(),
        },
    );
    let temp = TempDir::new().unwrap();
    let sync = Synchronizer::from_options(&options(&temp)).unwrap();

    let err = sync
        .sync(&manifest(json!({"bad": server.url("/bad.json")})))
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Schema {
            cause: SchemaError::Fetch(FetchError::Parse(_)),
            ..
        }
    ));
}

#[test]
fn test_payload_limit() {
    let server = SchemaServer::start();
    server.route(
        "/big.json",
        Route::json("\"big\"", json!({"description": "x".repeat(256)})),
    );
    let temp = TempDir::new().unwrap();
    let opts = SyncOptions {
        max_payload_size: 64,
        ..options(&temp)
    };
    let sync = Synchronizer::new(HttpFetcher::new(&opts).unwrap(), opts.cache_root());

    let err = sync
        .sync(&manifest(json!({"big": server.url("/big.json")})))
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Schema {
            cause: SchemaError::Fetch(FetchError::PayloadTooLarge { limit: 64, .. }),
            ..
        }
    ));
}

#[test]
fn test_registry_reads_synchronized_index() {
    let server = SchemaServer::start();
    server.route("/a.json", Route::json("\"a\"", json!({"title": "A"})));
    server.route("/b.json", Route::json("\"b\"", json!({"title": "B"})));
    let temp = TempDir::new().unwrap();
    let sync = Synchronizer::from_options(&options(&temp)).unwrap();

    sync.sync(&manifest(json!({
        "b": server.url("/b.json"),
        "a": server.url("/a.json"),
    })))
    .unwrap();

    let registry = SchemaRegistry::new(temp.path());
    let index = registry
        .schemas(&ConsumerIdentity::new("consumer", "1.0.0").unwrap())
        .unwrap();
    assert_eq!(index.names().collect::<Vec<_>>(), vec!["b", "a"]);
    assert_eq!(index.get("a"), Some(&json!({"title": "A"})));

    let raw: Value = serde_json::from_str(
        &fs::read_to_string(namespace(&temp).dir().join(INDEX_FILENAME)).unwrap(),
    )
    .unwrap();
    assert_eq!(raw, json!({"b": {"title": "B"}, "a": {"title": "A"}}));
}
