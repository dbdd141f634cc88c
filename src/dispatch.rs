//! Entry point for intercepted requests: path parsing, resolution, markup rewriting and
//! response packaging.

use crate::config::GateConfig;
use crate::core::{BlobStore, Result, utils};
use crate::namespace::{Namespace, NamespaceConfig};
use crate::resolver::{CandidateResolver, ResolvedContent, VirtualRequest};
use crate::rewrite::RewriteContext;
use crate::{GateError, VIRTUAL_PREFIX, media};

const NO_CACHE: &str = "no-cache";

/// The only statuses the gateway produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    InternalError,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::InternalError => 500,
        }
    }

    fn from_error(err: &GateError) -> Self {
        match err.status() {
            400 => Status::BadRequest,
            404 => Status::NotFound,
            _ => Status::InternalError,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: Status,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Response {
    fn ok(media_type: &str, cache_control: String, body: Vec<u8>) -> Self {
        Self {
            status: Status::Ok,
            headers: vec![
                ("Content-Type", media_type.to_string()),
                ("Cache-Control", cache_control),
            ],
            body,
        }
    }

    fn error(err: &GateError) -> Self {
        Self {
            status: Status::from_error(err),
            headers: vec![("Content-Type", "text/plain; charset=utf-8".to_string())],
            body: err.to_string().into_bytes(),
        }
    }

    /// First header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Outcome of [`Gateway::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Not a virtual path; the caller fetches it from its normal origin.
    PassThrough,
    Respond(Response),
}

impl Dispatch {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Dispatch::PassThrough => None,
            Dispatch::Respond(response) => Some(response),
        }
    }
}

/// Splits a request path into a [`VirtualRequest`].
///
/// Returns `None` for paths outside `/virtual`, which pass through untouched. Query strings
/// and fragments are ignored.
pub fn parse_request_path(request_path: &str) -> Option<Result<VirtualRequest>> {
    let path = request_path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let rest = path.strip_prefix('/')?.strip_prefix(VIRTUAL_PREFIX)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }

    let mut segments = utils::segments(rest);
    let Some(namespace) = segments.next() else {
        return Some(Err(GateError::InvalidPath(path.to_string())));
    };
    let relative_path = segments.collect::<Vec<_>>().join("/");
    Some(VirtualRequest::new(namespace, &relative_path))
}

/// Serves `/virtual/{namespace}/{path}` requests from a [`BlobStore`].
///
/// ### Example
///
/// ```
/// use vfs_gate::{Dispatch, GateConfig, Gateway, MapStore};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let mut store = MapStore::new();
/// store.put("mem://builds", "ns1", "index.html", r#"<script src="Build/app.js"></script>"#);
///
/// let gateway = Gateway::new(GateConfig::default().with_storage_url("mem://builds"), store);
/// let Dispatch::Respond(response) = gateway.dispatch("/virtual/ns1/").await else {
///     unreachable!()
/// };
/// assert_eq!(response.status.code(), 200);
/// assert_eq!(response.body_text(), r#"<script src="/virtual/ns1/Build/app.js"></script>"#);
/// # });
/// ```
pub struct Gateway<S> {
    config: GateConfig,
    namespace: Namespace,
    resolver: CandidateResolver,
    store: S,
}

impl<S: BlobStore> Gateway<S> {
    /// The namespace starts configured when `config.storage_url` is set.
    pub fn new(config: GateConfig, store: S) -> Self {
        let namespace = match config.storage_url.as_deref() {
            Some(url) => Namespace::with_config(NamespaceConfig::from_base(url)),
            None => Namespace::new(),
        };
        Self::with_namespace(config, namespace, store)
    }

    /// Shares an existing [`Namespace`] handle, e.g. one fed by a control channel.
    pub fn with_namespace(config: GateConfig, namespace: Namespace, store: S) -> Self {
        Self {
            resolver: CandidateResolver::new(config.layout.clone()),
            config,
            namespace,
            store,
        }
    }

    /// Handle for control messages.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handles one request path. Never fails: every error becomes a 400/404/500 response.
    pub async fn dispatch(&self, request_path: &str) -> Dispatch {
        let request = match parse_request_path(request_path) {
            None => return Dispatch::PassThrough,
            Some(Ok(request)) => request,
            Some(Err(err)) => {
                tracing::warn!(path = request_path, "invalid virtual path");
                return Dispatch::Respond(Response::error(&err));
            }
        };

        let config = self.namespace.snapshot();
        let response = match self.resolver.resolve(&request, &config, &self.store).await {
            Ok(content) => self.package(&request, content),
            Err(err) => {
                log_failure(&request, &err);
                Response::error(&err)
            }
        };
        Dispatch::Respond(response)
    }

    fn package(&self, request: &VirtualRequest, content: ResolvedContent) -> Response {
        tracing::debug!(source = %content.source_path, media_type = %content.media_type, "serving");
        if media::is_markup(&content.media_type) {
            let text = String::from_utf8_lossy(&content.bytes);
            let rewritten = RewriteContext::new(request.namespace()).rewrite(&text);
            return Response::ok(media::HTML, NO_CACHE.to_string(), rewritten.into_bytes());
        }
        Response::ok(
            &content.media_type,
            format!("public, max-age={}", self.config.asset_max_age),
            content.bytes,
        )
    }
}

fn log_failure(request: &VirtualRequest, err: &GateError) {
    match err {
        GateError::ConfigMissing(_) => {
            tracing::error!(request = %request, "backing store not configured")
        }
        GateError::NotFound { .. } => tracing::warn!(request = %request, "file not found"),
        other => tracing::error!(request = %request, error = %other, "virtual request failed"),
    }
}
