//! Shared helpers for the browser tests

use std::time::Duration;

use axum::Router;

use bassline_e2e::session::SessionConfig;
use bassline_e2e::Session;

/// WebDriver address for browser tests, `None` when none is configured
pub fn webdriver_url() -> Option<String> {
    let url = std::env::var("WEBDRIVER_URL").ok();
    if url.is_none() {
        eprintln!("Skipping: WEBDRIVER_URL not set");
    }
    url
}

/// Serve `app` on an ephemeral port, returning the base URL
pub async fn spawn_fixture_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fixture server");
    let addr = listener.local_addr().expect("fixture server address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fixture server");
    });

    format!("http://{addr}")
}

pub async fn open_session(webdriver_url: String) -> Session {
    let config = SessionConfig {
        webdriver_url,
        element_timeout: Duration::from_secs(2),
        save_timeout: Duration::from_millis(1500),
        ..Default::default()
    };
    Session::connect(&config).await.expect("webdriver session")
}
