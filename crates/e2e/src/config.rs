//! Site configuration assembled from the environment

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;

use crate::error::{E2eError, E2eResult};
use crate::session::{Browser, SessionConfig};

pub const BASE_URI_VAR: &str = "TEST_BASE_URI";
pub const WEBDRIVER_URL_VAR: &str = "WEBDRIVER_URL";
pub const ROOT_DIR_VAR: &str = "BASSLINE_ROOT";
pub const DATA_DIR_VAR: &str = "DATA_DIR";
pub const PHP_VAR: &str = "PHP";

/// Everything needed to bring up the application and a browser against it
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Base URI the application is served on, without trailing slash
    pub base_uri: String,

    /// Checkout of the application under test
    pub root_dir: PathBuf,

    /// Directory wiped before every run and handed to the app as `DATA_DIR`
    pub data_dir: PathBuf,

    /// PHP interpreter used for init, nonce issuance and the dev server
    pub php: PathBuf,

    /// Optional file receiving the server's stderr
    pub server_log: Option<PathBuf>,

    /// Timeout for the server to start answering requests
    pub startup_timeout: Duration,

    pub session: SessionConfig,
}

impl SiteConfig {
    /// Build a configuration with defaults for everything but the base URI
    pub fn new(base_uri: impl Into<String>) -> E2eResult<Self> {
        let base_uri = normalize_base_uri(&base_uri.into())?;
        let root_dir = PathBuf::from(".");

        Ok(Self {
            base_uri,
            data_dir: default_data_dir(&root_dir),
            root_dir,
            php: PathBuf::from("php"),
            server_log: None,
            startup_timeout: Duration::from_secs(30),
            session: SessionConfig::default(),
        })
    }

    /// Read the configuration through `lookup`, which maps a variable name
    /// to its value
    pub fn from_lookup<F>(lookup: F) -> E2eResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_uri = lookup(BASE_URI_VAR)
            .filter(|v| !v.is_empty())
            .ok_or(E2eError::MissingEnv(BASE_URI_VAR))?;

        let mut config = Self::new(base_uri)?;

        if let Some(root) = lookup(ROOT_DIR_VAR) {
            config.root_dir = PathBuf::from(root);
            config.data_dir = default_data_dir(&config.root_dir);
        }
        if let Some(data_dir) = lookup(DATA_DIR_VAR) {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(php) = lookup(PHP_VAR) {
            config.php = PathBuf::from(php);
        }
        if let Some(url) = lookup(WEBDRIVER_URL_VAR) {
            config.session.webdriver_url = url;
        }

        Ok(config)
    }

    /// `host:port` the application server must bind
    pub fn netloc(&self) -> E2eResult<String> {
        netloc(&self.base_uri)
    }

    /// Site configuration script handed to the PHP entry points
    pub fn site_config_path(&self) -> PathBuf {
        self.root_dir.join("test").join("config.php")
    }

    pub fn browser(mut self, browser: Browser) -> Self {
        self.session.browser = browser;
        self
    }
}

/// `<root>/test/data/uitest`
pub fn default_data_dir(root: &Path) -> PathBuf {
    root.join("test").join("data").join("uitest")
}

fn parse_base_uri(uri: &str) -> E2eResult<Url> {
    let parsed = Url::parse(uri).map_err(|e| E2eError::InvalidBaseUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(E2eError::InvalidBaseUri {
            uri: uri.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    if parsed.host_str().is_none() {
        return Err(E2eError::InvalidBaseUri {
            uri: uri.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(parsed)
}

fn normalize_base_uri(uri: &str) -> E2eResult<String> {
    parse_base_uri(uri)?;
    Ok(uri.trim_end_matches('/').to_string())
}

/// Network location (`host:port`) of a base URI
pub fn netloc(uri: &str) -> E2eResult<String> {
    let parsed = parse_base_uri(uri)?;
    // host presence checked by parse_base_uri
    let host = parsed.host_str().unwrap_or_default();
    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| E2eError::InvalidBaseUri {
            uri: uri.to_string(),
            reason: "no port".to_string(),
        })?;

    Ok(format!("{host}:{port}"))
}
