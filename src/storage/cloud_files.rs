//! Rackspace Cloud Files backend.
//!
//! Cloud Files speaks the OpenStack Swift API with v1.0 authentication: a
//! `GET` on the auth endpoint trades the username and API key for a storage
//! URL and a token, and every later request carries that token.

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, error, info, warn};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG};
use reqwest::{Body, Client, Response, StatusCode, Url};
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use crate::configuration::types::{ConnectionOptions, Credentials};
use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::ObjectContainer;
use crate::storage::types::{ListingEntry, ListingQuery, ObjectInfo, LISTING_LIMIT};

const AUTH_USER_HEADER: &str = "X-Auth-User";
const AUTH_KEY_HEADER: &str = "X-Auth-Key";
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const STORAGE_URL_HEADER: &str = "X-Storage-Url";

/// An authenticated connection to the storage service.
pub struct CloudFilesConnection {
    client: Client,
    storage_url: Url,
    token: String,
    timeout: Duration,
}

impl CloudFilesConnection {
    /// Authenticates against `options.auth_url`.
    ///
    /// Returns `StorageError::AuthenticationFailed` when the service rejects the
    /// credentials. With ServiceNet enabled the returned storage host is
    /// replaced by its `snet-` counterpart.
    ///
    /// `options.timeout` bounds connecting and every request except object
    /// uploads, which only fail once no body data moved for that long.
    pub async fn authenticate(
        credentials: &Credentials,
        options: &ConnectionOptions,
    ) -> Result<Self, StorageError> {
        let client = Client::builder().connect_timeout(options.timeout).build()?;

        info!("Authenticating as {} against {}", credentials.username, options.auth_url);
        let response = client
            .get(&options.auth_url)
            .header(AUTH_USER_HEADER, &credentials.username)
            .header(AUTH_KEY_HEADER, &credentials.api_key)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| {
                error!("Authentication request to {} failed: {}", options.auth_url, e);
                StorageError::from(e)
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("Credentials for {} were rejected", credentials.username);
            return Err(StorageError::AuthenticationFailed);
        }
        if !status.is_success() {
            return Err(unexpected_status("authentication", status));
        }

        let storage_url = header_value(&response, STORAGE_URL_HEADER)?;
        let token = header_value(&response, AUTH_TOKEN_HEADER)?;
        let mut storage_url = Url::parse(&storage_url)
            .map_err(|e| StorageError::InvalidResponse(format!("bad storage URL {}: {}", storage_url, e)))?;
        if options.servicenet {
            storage_url = servicenet_url(&storage_url)?;
        }

        debug!("Storage URL is {}", storage_url);
        Ok(Self {
            client,
            storage_url,
            token,
            timeout: options.timeout,
        })
    }

    pub fn storage_url(&self) -> &Url {
        &self.storage_url
    }

    /// Looks a container up, returning `None` when it does not exist.
    pub async fn get_container(&self, name: &str) -> Result<Option<CloudFilesContainer>, StorageError> {
        let container = self.container_handle(name)?;
        let response = self
            .client
            .head(container.url.clone())
            .header(AUTH_TOKEN_HEADER, &self.token)
            .timeout(self.timeout)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(container)),
            status => Err(unexpected_status("HEAD container", status)),
        }
    }

    pub async fn create_container(&self, name: &str) -> Result<CloudFilesContainer, StorageError> {
        let container = self.container_handle(name)?;
        let response = self
            .client
            .put(container.url.clone())
            .header(AUTH_TOKEN_HEADER, &self.token)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(unexpected_status("PUT container", response.status()));
        }
        info!("Created container {}", name);
        Ok(container)
    }

    /// Returns the container `name`, creating it first if it is missing.
    pub async fn get_or_create_container(&self, name: &str) -> Result<CloudFilesContainer, StorageError> {
        match self.get_container(name).await? {
            Some(container) => Ok(container),
            None => {
                info!("Container {} does not exist, creating it", name);
                self.create_container(name).await
            }
        }
    }

    fn container_handle(&self, name: &str) -> Result<CloudFilesContainer, StorageError> {
        let mut url = self.storage_url.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidResponse(format!("storage URL {} cannot hold paths", self.storage_url)))?
            .pop_if_empty()
            .push(name);

        Ok(CloudFilesContainer {
            client: self.client.clone(),
            url,
            token: self.token.clone(),
            name: name.to_string(),
            timeout: self.timeout,
        })
    }
}

/// A container reached through an authenticated connection.
pub struct CloudFilesContainer {
    client: Client,
    url: Url,
    token: String,
    name: String,
    timeout: Duration,
}

impl CloudFilesContainer {
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn object_url(&self, key: &str) -> Result<Url, StorageError> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidResponse(format!("container URL {} cannot hold paths", self.url)))?
            .extend(key.split('/'));
        Ok(url)
    }

    /// Fetches one listing page.
    async fn listing_page(&self, query: &ListingQuery) -> Result<Vec<ListingEntry>, StorageError> {
        let mut params: Vec<(&str, String)> = vec![
            ("format", "json".to_string()),
            ("limit", LISTING_LIMIT.to_string()),
        ];
        if let Some(prefix) = &query.prefix {
            params.push(("prefix", prefix.clone()));
        }
        if let Some(delimiter) = query.delimiter {
            params.push(("delimiter", delimiter.to_string()));
        }
        if let Some(marker) = &query.marker {
            params.push(("marker", marker.clone()));
        }

        let response = self
            .client
            .get(self.url.clone())
            .query(&params)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .timeout(self.timeout)
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(Vec::new()),
            status if status.is_success() => response
                .json::<Vec<ListingEntry>>()
                .await
                .map_err(|e| StorageError::InvalidResponse(format!("container listing: {}", e))),
            status => Err(unexpected_status("GET container", status)),
        }
    }

    /// Walks every listing page for `query`.
    async fn listing(&self, mut query: ListingQuery) -> Result<Vec<ListingEntry>, StorageError> {
        let mut entries = Vec::new();
        loop {
            let page = self.listing_page(&query).await?;
            let page_len = page.len();
            query.marker = page.last().map(|entry| entry.marker().to_string());
            entries.extend(page);
            if page_len < LISTING_LIMIT {
                break;
            }
        }
        debug!("Listed {} entrie(s) in container {}", entries.len(), self.name);
        Ok(entries)
    }

    /// Streams `length` bytes from `reader` into the object `key`.
    ///
    /// The body is sent as it is read, so memory use does not grow with the
    /// object size. The upload has no overall deadline; it fails when neither
    /// body data nor a response arrived within the connection timeout.
    pub async fn upload_reader<R>(&self, key: &str, reader: R, length: u64) -> Result<ObjectInfo, StorageError>
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        let content_type = mime_guess::from_path(key).first_or_octet_stream().to_string();
        let activity = Arc::new(Activity::new());
        let progress = activity.clone();
        let stream = ReaderStream::new(reader).inspect(move |_| progress.touch());

        let request = self
            .client
            .put(self.object_url(key)?)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .header(CONTENT_TYPE, content_type.as_str())
            .header(CONTENT_LENGTH, length)
            .body(Body::wrap_stream(stream))
            .send();
        let response = send_while_active(request, &activity, self.timeout).await?;

        if !response.status().is_success() {
            return Err(unexpected_status("PUT object", response.status()));
        }
        let hash = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string());

        Ok(ObjectInfo {
            name: key.to_string(),
            bytes: length,
            hash,
            last_modified: None,
            content_type: Some(content_type),
        })
    }
}

#[async_trait]
impl ObjectContainer for CloudFilesContainer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_prefixes(&self, delimiter: char) -> Result<Vec<String>, StorageError> {
        let entries = self
            .listing(ListingQuery {
                delimiter: Some(delimiter),
                ..Default::default()
            })
            .await?;
        Ok(entries.iter().map(|entry| entry.marker().to_string()).collect())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let entries = self
            .listing(ListingQuery {
                prefix: Some(prefix.to_string()),
                ..Default::default()
            })
            .await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| match entry {
                ListingEntry::Object(info) => Some(info),
                ListingEntry::Subdir { .. } => None,
            })
            .collect())
    }

    async fn upload_object(&self, key: &str, source: &Path) -> Result<ObjectInfo, StorageError> {
        let file = tokio::fs::File::open(source).await.map_err(|e| {
            error!("Failed to open {}: {}", source.display(), e);
            StorageError::IoError(e)
        })?;
        let length = file.metadata().await?.len();

        let info = self.upload_reader(key, file, length).await?;
        info!("Uploaded {} ({} byte(s)) to {}/{}", source.display(), info.bytes, self.name, key);
        Ok(info)
    }

    async fn delete_object(&self, object: &ObjectInfo) -> Result<(), StorageError> {
        let response = self
            .client
            .delete(self.object_url(&object.name)?)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(unexpected_status("DELETE object", response.status()));
        }
        debug!("Deleted {}/{}", self.name, object.name);
        Ok(())
    }
}

/// Time of the last body chunk handed to the HTTP client.
struct Activity {
    origin: Instant,
    last_ms: AtomicU64,
}

impl Activity {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_ms: AtomicU64::new(0),
        }
    }

    fn touch(&self) {
        self.last_ms
            .store(self.origin.elapsed().as_millis() as u64, Ordering::Relaxed);
    }

    fn idle(&self) -> Duration {
        self.origin
            .elapsed()
            .saturating_sub(Duration::from_millis(self.last_ms.load(Ordering::Relaxed)))
    }
}

/// Drives `send` until it completes or `activity` stays idle for `limit`.
async fn send_while_active<F>(send: F, activity: &Activity, limit: Duration) -> Result<Response, StorageError>
where
    F: Future<Output = Result<Response, reqwest::Error>>,
{
    tokio::pin!(send);
    loop {
        let idle = activity.idle();
        if idle >= limit {
            error!("Upload made no progress for {:?}, giving up", idle);
            return Err(StorageError::ConnectionFailed(format!(
                "upload stalled for {:?}",
                idle
            )));
        }
        tokio::select! {
            result = &mut send => return result.map_err(StorageError::from),
            _ = tokio::time::sleep(limit - idle) => {}
        }
    }
}

/// Rewrites a storage URL to its ServiceNet host (`snet-<host>`).
pub fn servicenet_url(url: &Url) -> Result<Url, StorageError> {
    let host = url
        .host_str()
        .ok_or_else(|| StorageError::InvalidResponse(format!("storage URL {} has no host", url)))?;
    let mut snet = url.clone();
    snet.set_host(Some(&format!("snet-{}", host)))
        .map_err(|e| StorageError::InvalidResponse(format!("cannot build ServiceNet URL: {}", e)))?;
    Ok(snet)
}

fn header_value(response: &Response, name: &str) -> Result<String, StorageError> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| {
            error!("Authentication response is missing {}", name);
            StorageError::InvalidResponse(format!("missing {} header", name))
        })
}

fn unexpected_status(operation: &str, status: StatusCode) -> StorageError {
    error!("{} failed with status {}", operation, status);
    StorageError::UnexpectedStatus {
        operation: operation.to_string(),
        status: status.as_u16(),
    }
}
