//! Server management - spawning and health checking the application server

use std::ffi::OsString;
use std::fs::File;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::SiteConfig;
use crate::error::{E2eError, E2eResult};

/// Time a server gets to exit after SIGTERM before it is killed
const GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Handle to a running server process
pub struct ServerHandle {
    child: Child,
    base_url: String,
}

impl ServerHandle {
    /// Spawn the server process and wait for it to answer on `base_url`
    pub async fn spawn(config: ServerConfig) -> E2eResult<Self> {
        info!("Spawning {} for {}", config.program.display(), config.base_url);

        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args).envs(config.env.iter().cloned());

        let stderr = match &config.log_path {
            Some(path) => Stdio::from(File::create(path)?),
            None => Stdio::null(),
        };
        cmd.stdout(Stdio::null()).stderr(stderr);

        let child = cmd.spawn().map_err(|e| {
            E2eError::ServerStartup(format!(
                "Failed to spawn {}: {}",
                config.program.display(),
                e
            ))
        })?;

        let mut handle = ServerHandle {
            child,
            base_url: config.base_url.clone(),
        };

        // Wait for server to be healthy
        handle
            .wait_for_healthy(&config.health_path, config.startup_timeout)
            .await?;

        info!("Server is healthy at {}", handle.base_url);
        Ok(handle)
    }

    /// Wait for the server to respond to requests
    async fn wait_for_healthy(&mut self, path: &str, timeout_duration: Duration) -> E2eResult<()> {
        let health_url = format!("{}{}", self.base_url, path);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            if let Some(status) = self.child.try_wait()? {
                return Err(E2eError::ServerStartup(format!(
                    "server exited during startup with {status}"
                )));
            }

            match client.get(&health_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("Health check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for server to start...");
                    }
                    // Connection refused is expected while server is starting
                    if !e.is_connect() {
                        warn!("Health check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(E2eError::ServerHealthCheck(attempts))
    }

    /// Stop the server from async code without blocking the runtime
    pub async fn shutdown(&mut self) -> E2eResult<()> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }

        if self.terminate() {
            let start = std::time::Instant::now();
            while start.elapsed() < GRACE_PERIOD && self.child.try_wait()?.is_none() {
                sleep(Duration::from_millis(50)).await;
            }
        }

        self.reap()
    }

    /// Stop the server, blocking the calling thread for up to the grace period
    pub fn stop(&mut self) -> E2eResult<()> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }

        if self.terminate() {
            std::thread::sleep(GRACE_PERIOD);
        }

        self.reap()
    }

    /// Ask the server to exit. Returns whether the signal was delivered.
    fn terminate(&self) -> bool {
        info!("Stopping server (pid: {})", self.child.id());
        send_sigterm(self.child.id())
    }

    /// Force kill if still running, then collect the exit status
    fn reap(&mut self) -> E2eResult<()> {
        if self.child.try_wait()?.is_none() {
            let _ = self.child.kill();
        }
        self.child.wait()?;
        Ok(())
    }
}

#[cfg(unix)]
fn send_sigterm(pid: u32) -> bool {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
}

#[cfg(not(unix))]
fn send_sigterm(_pid: u32) -> bool {
    false
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Configuration for spawning a server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Executable to run
    pub program: PathBuf,

    pub args: Vec<OsString>,

    /// Extra environment for the process
    pub env: Vec<(OsString, OsString)>,

    /// Base URL the process serves, without trailing slash
    pub base_url: String,

    /// Path probed during startup
    pub health_path: String,

    /// Timeout for server startup
    pub startup_timeout: Duration,

    /// File receiving the server's stderr (request log for `php -S`)
    pub log_path: Option<PathBuf>,
}

impl ServerConfig {
    /// The PHP built-in web server bound to the site's network location,
    /// routing every request through `test/server.php`
    pub fn php_dev_server(site: &SiteConfig) -> E2eResult<Self> {
        let router = site.root_dir.join("test").join("server.php");

        Ok(Self {
            program: site.php.clone(),
            args: vec!["-S".into(), site.netloc()?.into(), router.into()],
            env: vec![("DATA_DIR".into(), site.data_dir.clone().into())],
            base_url: site.base_uri.clone(),
            health_path: "/login/".to_string(),
            startup_timeout: site.startup_timeout,
            log_path: site.server_log.clone(),
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("php"),
            args: Vec::new(),
            env: Vec::new(),
            base_url: "http://127.0.0.1:8080".to_string(),
            health_path: "/".to_string(),
            startup_timeout: Duration::from_secs(30),
            log_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Find a free port to use
    fn find_free_port() -> u16 {
        use std::net::TcpListener;

        TcpListener::bind("127.0.0.1:0")
            .expect("Failed to bind to find free port")
            .local_addr()
            .expect("Failed to get local addr")
            .port()
    }

    #[test]
    fn test_php_dev_server_command() {
        let mut site = SiteConfig::new("http://localhost:8123").unwrap();
        site.root_dir = PathBuf::from("/srv/bassline");
        site.data_dir = PathBuf::from("/tmp/uitest");

        let config = ServerConfig::php_dev_server(&site).unwrap();

        assert_eq!(config.program, PathBuf::from("php"));
        assert_eq!(
            config.args,
            vec![
                OsString::from("-S"),
                OsString::from("localhost:8123"),
                OsString::from("/srv/bassline/test/server.php"),
            ]
        );
        assert_eq!(
            config.env,
            vec![(OsString::from("DATA_DIR"), OsString::from("/tmp/uitest"))]
        );
        assert_eq!(config.base_url, "http://localhost:8123");
    }

    #[test]
    fn test_missing_program_fails_startup() {
        let config = ServerConfig {
            program: PathBuf::from("/nonexistent/definitely-not-php"),
            ..Default::default()
        };

        let rt = tokio::runtime::Runtime::new().unwrap();
        let err = rt.block_on(ServerHandle::spawn(config)).err().unwrap();
        assert!(matches!(err, E2eError::ServerStartup(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_silent_process_fails_health_check() {
        let port = find_free_port();
        let config = ServerConfig {
            program: PathBuf::from("sleep"),
            args: vec!["30".into()],
            base_url: format!("http://127.0.0.1:{port}"),
            startup_timeout: Duration::from_millis(400),
            ..Default::default()
        };

        let err = ServerHandle::spawn(config).await.err().unwrap();
        assert!(matches!(err, E2eError::ServerHealthCheck(n) if n >= 1));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exiting_process_reports_startup_failure() {
        let port = find_free_port();
        let config = ServerConfig {
            program: PathBuf::from("false"),
            base_url: format!("http://127.0.0.1:{port}"),
            startup_timeout: Duration::from_secs(5),
            ..Default::default()
        };

        let err = ServerHandle::spawn(config).await.err().unwrap();
        assert!(matches!(err, E2eError::ServerStartup(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shutdown_terminates_running_process() {
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        let mut handle = ServerHandle {
            child,
            base_url: "http://127.0.0.1:1".to_string(),
        };

        let start = std::time::Instant::now();
        handle.shutdown().await.unwrap();

        assert!(handle.child.try_wait().unwrap().is_some());
        assert!(start.elapsed() < Duration::from_secs(5));

        // already reaped; a second stop is a no-op
        handle.stop().unwrap();
    }
}
