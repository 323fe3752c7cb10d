//! Resource reference to fetchable URL mapping
//!
//! Stored screenshot, log and config references are either absolute remote
//! URLs (object storage) or paths served by the backend itself. Remote ones go
//! through the backend proxy: `/resources/proxy` answers with long-lived cache
//! headers, `/resources/proxy/download` with `no-store`.

use url::form_urlencoded;
use url::Url;

use crate::errors::ConsoleError;

const VIEW_PROXY_PATH: &str = "/resources/proxy";
const DOWNLOAD_PROXY_PATH: &str = "/resources/proxy/download";

/// Resolves stored resource references against the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUrls {
    api_base_url: String,
    local_origin: String,
}

impl ResourceUrls {
    /// Build a resolver whose local origin is the API base URL's origin
    pub fn new(api_base_url: &str) -> Result<Self, ConsoleError> {
        let origin = origin_of(api_base_url)?;
        Ok(Self::with_local_origin(api_base_url, &origin))
    }

    /// Build a resolver with an explicit origin for local paths
    pub fn with_local_origin(api_base_url: &str, local_origin: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            local_origin: local_origin.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn local_origin(&self) -> &str {
        &self.local_origin
    }

    /// Cache-friendly URL for displaying a resource
    pub fn view_url(&self, reference: Option<&str>) -> String {
        self.resolve(reference, VIEW_PROXY_PATH, None)
    }

    /// Always-fresh URL for downloading a resource
    pub fn download_url(&self, reference: Option<&str>) -> String {
        self.resolve(reference, DOWNLOAD_PROXY_PATH, None)
    }

    /// Download URL that also names the attachment for remote references
    pub fn download_url_named(&self, reference: Option<&str>, filename: &str) -> String {
        self.resolve(reference, DOWNLOAD_PROXY_PATH, Some(filename))
    }

    fn resolve(&self, reference: Option<&str>, proxy_path: &str, filename: Option<&str>) -> String {
        let reference = match reference {
            Some(r) if !r.is_empty() => r,
            _ => return String::new(),
        };

        if is_remote(reference) {
            let mut query = form_urlencoded::Serializer::new(String::new());
            query.append_pair("url", reference);
            if let Some(filename) = filename {
                query.append_pair("filename", filename);
            }
            return format!("{}{}?{}", self.api_base_url, proxy_path, query.finish());
        }

        if reference.starts_with('/') {
            return format!("{}{}", self.local_origin, reference);
        }

        reference.to_string()
    }
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// `scheme://host[:port]` of a URL
pub fn origin_of(raw: &str) -> Result<String, ConsoleError> {
    let url = Url::parse(raw).map_err(|e| ConsoleError::Config(format!("Invalid URL {raw}: {e}")))?;
    match url.origin() {
        origin @ url::Origin::Tuple(..) => Ok(origin.ascii_serialization()),
        url::Origin::Opaque(_) => Err(ConsoleError::Config(format!(
            "URL has no usable origin: {raw}"
        ))),
    }
}
