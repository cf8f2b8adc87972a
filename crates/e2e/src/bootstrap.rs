//! Preconditions for a usable site: reset state, init the database and
//! issue backdoor login nonces

use std::path::Path;

use reqwest::Url;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::SiteConfig;
use crate::error::{E2eError, E2eResult};

/// Remove everything under `data_dir`, creating it if needed
pub fn reset_data_dir(data_dir: &Path) -> E2eResult<()> {
    info!("Resetting data directory {}", data_dir.display());
    std::fs::create_dir_all(data_dir)?;

    for entry in std::fs::read_dir(data_dir)? {
        let path = entry?.path();
        if path.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
    }

    Ok(())
}

fn php_command(config: &SiteConfig, script: &str) -> Command {
    let mut cmd = Command::new(&config.php);
    cmd.arg(config.root_dir.join("bin").join(script))
        .arg(config.site_config_path())
        .env("DATA_DIR", &config.data_dir)
        .kill_on_drop(true);
    cmd
}

/// Create the application's database in the freshly reset data directory
pub async fn init_database(config: &SiteConfig) -> E2eResult<()> {
    info!("Initializing database");

    let output = php_command(config, "init.php").output().await?;
    if !output.status.success() {
        return Err(E2eError::DatabaseInit(format!(
            "init.php exited with {}: {}{}",
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    Ok(())
}

/// Reset state and initialize the database
pub async fn prepare(config: &SiteConfig) -> E2eResult<()> {
    reset_data_dir(&config.data_dir)?;
    init_database(config).await
}

/// Ask the application for a one-time login token for `username`
pub async fn issue_nonce(config: &SiteConfig, username: &str) -> E2eResult<String> {
    debug!("Issuing nonce for {}", username);

    let output = php_command(config, "issue_nonce.php")
        .arg(username)
        .output()
        .await?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        return Err(E2eError::Nonce {
            username: username.to_string(),
            reason: stdout.trim().to_string(),
        });
    }

    parse_nonce(&stdout).ok_or_else(|| E2eError::Nonce {
        username: username.to_string(),
        reason: "no token in output".to_string(),
    })
}

/// The token is the last non-empty line the issuer prints
pub fn parse_nonce(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(String::from)
}

/// URI that exchanges `nonce` for an authenticated session
pub fn nonce_login_uri(base_uri: &str, nonce: &str) -> E2eResult<String> {
    let attempt = format!("{base_uri}/login/attempt");
    let url = Url::parse_with_params(
        &attempt,
        &[("auth", "nonce"), ("nonce", nonce), ("redirect_uri", "/")],
    )
    .map_err(|e| E2eError::InvalidBaseUri {
        uri: base_uri.to_string(),
        reason: e.to_string(),
    })?;

    Ok(url.into())
}
