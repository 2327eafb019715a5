//! Loading the annotation payload.
//!
//! The player is independent of any particular HTTP client; it loads the
//! payload through a [Fetch] implementation. [HttpFetcher] is the default,
//! covering http(s) and local files.

use std::future::Future;
use std::path::PathBuf;

use annotate::AnnotationPayload;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder, StatusCode};
use url::Url;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FetchError {
	#[error("invalid source: {0}")]
	InvalidSource(String),

	#[error("invalid origin: {0:?}")]
	InvalidOrigin(String),

	#[error("unsupported scheme: {0}")]
	UnsupportedScheme(String),

	#[error("unexpected status: {0}")]
	Status(StatusCode),

	#[error("request failed: {0}")]
	Request(#[from] reqwest::Error),

	#[error("failed to read {path:?}: {source}")]
	Io { path: PathBuf, source: std::io::Error },

	#[error("malformed payload: {0}")]
	Decode(#[from] annotate::Error),
}

/// Loads an annotation payload.
pub trait Fetch: Send + Sync + 'static {
	fn fetch(&self, url: &Url) -> impl Future<Output = Result<AnnotationPayload, FetchError>> + Send;
}

/// Parse a payload source into a URL.
///
/// Anything starting with a URL scheme we support is parsed as a URL.
/// Otherwise it's treated as a file path, relative to the current directory.
pub fn parse_source(source: &str) -> Result<Url, FetchError> {
	if ["http://", "https://", "file://"].iter().any(|scheme| source.starts_with(scheme)) {
		return Url::parse(source).map_err(|err| FetchError::InvalidSource(format!("{source}: {err}")));
	}

	let path = PathBuf::from(source);
	let absolute = if path.is_absolute() {
		path
	} else {
		let cwd = std::env::current_dir().map_err(|source| FetchError::Io {
			path: PathBuf::from("."),
			source,
		})?;
		cwd.join(path)
	};

	Url::from_file_path(&absolute).map_err(|_| FetchError::InvalidSource(source.to_string()))
}

/// Fetches payloads over HTTP, or from disk for `file://` URLs.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
	client: Client,
	token: Option<String>,
}

impl HttpFetcher {
	/// Create a fetcher that identifies itself as `origin` on cross-origin requests.
	pub fn new(origin: &str, token: Option<String>) -> Result<Self, FetchError> {
		Self::from_builder(Self::builder(origin)?, token)
	}

	fn builder(origin: &str) -> Result<ClientBuilder, FetchError> {
		let mut headers = HeaderMap::new();
		let origin = HeaderValue::from_str(origin).map_err(|_| FetchError::InvalidOrigin(origin.to_string()))?;
		headers.insert(header::ORIGIN, origin);

		Ok(Client::builder()
			.user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
			.default_headers(headers))
	}

	fn from_builder(builder: ClientBuilder, token: Option<String>) -> Result<Self, FetchError> {
		Ok(Self {
			client: builder.build()?,
			token,
		})
	}

	async fn fetch_http(&self, url: &Url) -> Result<AnnotationPayload, FetchError> {
		let mut request = self.client.get(url.clone());
		if let Some(token) = &self.token {
			request = request.bearer_auth(token);
		}

		let response = request.send().await?;
		let status = response.status();
		if !status.is_success() {
			return Err(FetchError::Status(status));
		}

		let body = response.bytes().await?;
		Ok(AnnotationPayload::from_slice(&body)?)
	}

	async fn fetch_file(&self, url: &Url) -> Result<AnnotationPayload, FetchError> {
		let path = url
			.to_file_path()
			.map_err(|_| FetchError::InvalidSource(url.to_string()))?;

		let body = tokio::fs::read(&path)
			.await
			.map_err(|source| FetchError::Io { path, source })?;

		Ok(AnnotationPayload::from_slice(&body)?)
	}
}

impl Fetch for HttpFetcher {
	async fn fetch(&self, url: &Url) -> Result<AnnotationPayload, FetchError> {
		tracing::debug!(%url, "fetching annotations");

		match url.scheme() {
			"http" | "https" => self.fetch_http(url).await,
			"file" => self.fetch_file(url).await,
			scheme => Err(FetchError::UnsupportedScheme(scheme.to_string())),
		}
	}
}
