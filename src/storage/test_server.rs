//! In-process stand-in for the Cloud Files API, served with warp.
//!
//! It implements just enough of Swift for the connector: v1.0 auth, container
//! HEAD/PUT/GET (JSON listings with prefix, delimiter, marker and limit) and
//! object PUT/DELETE. Keys are taken from the raw request path, so tests use
//! keys that need no percent-encoding.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use warp::http::{Method, Response, StatusCode};
use warp::hyper::body::Bytes;
use warp::path::Tail;
use warp::Filter;

use crate::configuration::types::ConnectionOptions;
use crate::storage::types::{build_listing, ListingQuery, ObjectInfo, LISTING_LIMIT};

pub const USERNAME: &str = "backup-user";
pub const API_KEY: &str = "backup-key";
pub const TOKEN: &str = "fake-token";
const ACCOUNT: &str = "AUTH_test";

type Containers = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

#[derive(Default)]
struct FakeState {
    containers: Containers,
    requests: Vec<String>,
    failure: Option<(Method, u16)>,
}

pub struct FakeCloudFiles {
    addr: SocketAddr,
    state: Arc<Mutex<FakeState>>,
}

impl FakeCloudFiles {
    /// Binds an ephemeral port and serves on the current tokio runtime.
    pub fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState::default()));

        let auth = warp::path!("auth" / "v1.0")
            .and(warp::get())
            .and(warp::header::optional::<String>("x-auth-user"))
            .and(warp::header::optional::<String>("x-auth-key"))
            .and(warp::header::<String>("host"))
            .map(|user: Option<String>, key: Option<String>, host: String| {
                if user.as_deref() == Some(USERNAME) && key.as_deref() == Some(API_KEY) {
                    Response::builder()
                        .status(StatusCode::NO_CONTENT)
                        .header("X-Storage-Url", format!("http://{}/v1/{}", host, ACCOUNT))
                        .header("X-Auth-Token", TOKEN)
                        .body(String::new())
                        .unwrap()
                } else {
                    Response::builder()
                        .status(StatusCode::UNAUTHORIZED)
                        .body(String::new())
                        .unwrap()
                }
            });

        let shared = state.clone();
        let storage = warp::path("v1")
            .and(warp::path(ACCOUNT))
            .and(warp::header::exact("x-auth-token", TOKEN))
            .and(warp::method())
            .and(warp::path::tail())
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::body::bytes())
            .map(move |method: Method, tail: Tail, query: HashMap<String, String>, body: Bytes| {
                let mut state = shared.lock().unwrap();
                handle(&mut state, method, tail.as_str(), &query, body)
            });

        let (addr, server) = warp::serve(auth.or(storage)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        Self { addr, state }
    }

    pub fn auth_url(&self) -> String {
        format!("http://{}/auth/v1.0", self.addr)
    }

    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            auth_url: self.auth_url(),
            ..Default::default()
        }
    }

    pub fn create_container(&self, container: &str) {
        self.state
            .lock()
            .unwrap()
            .containers
            .entry(container.to_string())
            .or_default();
    }

    pub fn insert(&self, container: &str, key: &str, data: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .containers
            .entry(container.to_string())
            .or_default()
            .insert(key.to_string(), data.to_vec());
    }

    pub fn keys(&self, container: &str) -> Option<Vec<String>> {
        self.state
            .lock()
            .unwrap()
            .containers
            .get(container)
            .map(|objects| objects.keys().cloned().collect())
    }

    pub fn object(&self, container: &str, key: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .containers
            .get(container)
            .and_then(|objects| objects.get(key).cloned())
    }

    /// Every request seen by the storage routes, as `"<METHOD> <path>"`.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Makes every later request with `method` fail with `status`.
    pub fn fail(&self, method: Method, status: u16) {
        self.state.lock().unwrap().failure = Some((method, status));
    }
}

fn reply(status: StatusCode, body: String) -> Response<String> {
    Response::builder().status(status).body(body).unwrap()
}

fn handle(
    state: &mut FakeState,
    method: Method,
    path: &str,
    query: &HashMap<String, String>,
    body: Bytes,
) -> Response<String> {
    state.requests.push(format!("{} {}", method, path));

    if let Some((failing, status)) = &state.failure {
        if *failing == method {
            return reply(StatusCode::from_u16(*status).unwrap(), String::new());
        }
    }

    let (container, key) = match path.split_once('/') {
        Some((container, key)) if !key.is_empty() => (container.to_string(), Some(key.to_string())),
        Some((container, _)) => (container.to_string(), None),
        None => (path.to_string(), None),
    };

    match (method, key) {
        (Method::HEAD, None) => match state.containers.contains_key(&container) {
            true => reply(StatusCode::NO_CONTENT, String::new()),
            false => reply(StatusCode::NOT_FOUND, String::new()),
        },
        (Method::PUT, None) => match state.containers.contains_key(&container) {
            true => reply(StatusCode::ACCEPTED, String::new()),
            false => {
                state.containers.insert(container, BTreeMap::new());
                reply(StatusCode::CREATED, String::new())
            }
        },
        (Method::GET, None) => {
            let objects = match state.containers.get(&container) {
                Some(objects) => objects,
                None => return reply(StatusCode::NOT_FOUND, String::new()),
            };
            let infos: Vec<ObjectInfo> = objects
                .iter()
                .map(|(name, data)| ObjectInfo {
                    name: name.clone(),
                    bytes: data.len() as u64,
                    hash: None,
                    last_modified: None,
                    content_type: Some("application/octet-stream".to_string()),
                })
                .collect();
            let listing_query = ListingQuery {
                prefix: query.get("prefix").cloned(),
                delimiter: query.get("delimiter").and_then(|d| d.chars().next()),
                marker: query.get("marker").cloned(),
            };
            let limit = query
                .get("limit")
                .and_then(|l| l.parse().ok())
                .unwrap_or(LISTING_LIMIT);

            let page = build_listing(&infos, &listing_query, limit);
            if page.is_empty() {
                reply(StatusCode::NO_CONTENT, String::new())
            } else {
                reply(StatusCode::OK, serde_json::to_string(&page).unwrap())
            }
        }
        (Method::PUT, Some(key)) => match state.containers.get_mut(&container) {
            Some(objects) => {
                objects.insert(key, body.to_vec());
                reply(StatusCode::CREATED, String::new())
            }
            None => reply(StatusCode::NOT_FOUND, String::new()),
        },
        (Method::DELETE, Some(key)) => {
            match state.containers.get_mut(&container).and_then(|objects| objects.remove(&key)) {
                Some(_) => reply(StatusCode::NO_CONTENT, String::new()),
                None => reply(StatusCode::NOT_FOUND, String::new()),
            }
        }
        _ => reply(StatusCode::METHOD_NOT_ALLOWED, String::new()),
    }
}
