//! Service endpoint configuration and URL resolution

/// Origin used when no browser location is available (native builds, tests)
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Base URL of the key generation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// HTTP(S) origin, e.g. "http://192.168.1.100:8000" (no trailing slash)
    pub http_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_address(DEFAULT_SERVICE_URL)
    }
}

impl ServiceConfig {
    /// Create config from a service address (host:port or full URL)
    pub fn from_address(addr: &str) -> Self {
        let addr = addr.trim().trim_end_matches('/');
        let http_url = if addr.starts_with("https://") || addr.starts_with("http://") {
            addr.to_string()
        } else {
            // Plain address like "192.168.1.100:8000"
            format!("http://{}", addr)
        };

        Self { http_url }
    }

    /// Create config from a page's query string, falling back to its own origin
    ///
    /// `?api=<address>` wins over `origin`; an empty origin (e.g. `file://`
    /// pages) falls back to [`DEFAULT_SERVICE_URL`].
    pub fn from_page(search: &str, origin: &str) -> Self {
        if let Some(api) = parse_query_param(search, "api") {
            tracing::info!("Using key service from URL parameter: {}", api);
            return Self::from_address(&api);
        }

        if origin.is_empty() || origin == "null" {
            Self::default()
        } else {
            Self::from_address(origin)
        }
    }

    /// Resolve a service-relative path against the origin
    ///
    /// Absolute `http(s)://` URLs are returned unchanged.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.http_url, path.trim_start_matches('/'))
    }

    pub fn generate_url(&self) -> String {
        self.resolve("generate")
    }

    pub fn download_url(&self, key_id: &str) -> String {
        self.resolve(&format!("download/{}", key_id))
    }
}

/// Parse a query parameter from a search string ("?a=1&b=2")
pub fn parse_query_param(search: &str, param: &str) -> Option<String> {
    let search = search.trim_start_matches('?');
    for pair in search.split('&') {
        let mut parts = pair.splitn(2, '=');
        if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
            if key == param && !value.is_empty() {
                return Some(
                    value
                        .replace("%3A", ":")
                        .replace("%3a", ":")
                        .replace("%2F", "/")
                        .replace("%2f", "/"),
                );
            }
        }
    }
    None
}

/// Tracing verbosity selected with `?log=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn from_search(search: &str) -> Self {
        match parse_query_param(search, "log")
            .map(|l| l.to_lowercase())
            .as_deref()
        {
            Some("error") => LogLevel::Error,
            Some("info") => LogLevel::Info,
            Some("debug") => LogLevel::Debug,
            Some("trace") => LogLevel::Trace,
            _ => LogLevel::Warn,
        }
    }

    pub fn to_tracing(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
