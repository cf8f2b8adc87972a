use std::time::{Duration, Instant};

use axum::response::Html;
use axum::routing::get;
use axum::Router;

use bassline_e2e::pages::{GroupEditPage, LoginPage, UserSelectPage};
use bassline_e2e::session::AUTOSAVE_SELECTOR;

mod common;

const IDLE_PAGE: &str = r#"<!doctype html>
<html><body>
<h1>Select a user</h1>
<form class="autosave"><input type="text"></form>
</body></html>"#;

const BUSY_PAGE: &str = r#"<!doctype html>
<html><body>
<h1>Edit group</h1>
<form class="autosave" data-is-busy></form>
</body></html>"#;

const CLEARING_PAGE: &str = r#"<!doctype html>
<html><body>
<h1>Edit group</h1>
<form class="autosave" data-is-busy></form>
<script>
setTimeout(() => { delete document.querySelector('.autosave').dataset.isBusy; }, 300);
</script>
</body></html>"#;

const PLAIN_PAGE: &str = r#"<!doctype html>
<html><body><h1>Log in</h1></body></html>"#;

fn fixture_pages() -> Router {
    Router::new()
        .route("/idle", get(|| async { Html(IDLE_PAGE) }))
        .route("/busy", get(|| async { Html(BUSY_PAGE) }))
        .route("/clearing", get(|| async { Html(CLEARING_PAGE) }))
        .route("/plain", get(|| async { Html(PLAIN_PAGE) }))
}

/// Autosave readiness against a real browser
///
/// Serves small fixture pages and checks that waits return as soon as the
/// busy marker is gone, and fail with a timeout when it never clears.
///
/// Marked ignored because it requires a running WebDriver server.
#[tokio::test]
#[ignore]
async fn autosave_readiness_in_browser() {
    let Some(webdriver_url) = common::webdriver_url() else {
        return;
    };

    let base = common::spawn_fixture_server(fixture_pages()).await;
    let session = common::open_session(webdriver_url).await;

    // Idle form: ready on the first poll
    session.goto(&format!("{base}/idle")).await.unwrap();
    let start = Instant::now();
    session.wait_save().await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(1000));

    // No autosave form at all reads as ready
    session.goto(&format!("{base}/plain")).await.unwrap();
    assert!(session.find_all(AUTOSAVE_SELECTOR).await.unwrap().is_empty());
    session.wait_save().await.unwrap();

    // Marker removed by the page after ~300ms
    session.goto(&format!("{base}/clearing")).await.unwrap();
    let start = Instant::now();
    session.wait_save().await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(200));

    // Marker never removed
    session.goto(&format!("{base}/busy")).await.unwrap();
    let err = session.wait_save().await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {err}");

    session.close().await.unwrap();
}

/// Page identity resolution against a real browser
///
/// Marked ignored because it requires a running WebDriver server.
#[tokio::test]
#[ignore]
async fn pages_resolve_from_heading() {
    let Some(webdriver_url) = common::webdriver_url() else {
        return;
    };

    let base = common::spawn_fixture_server(fixture_pages()).await;
    let session = common::open_session(webdriver_url).await;

    session.goto(&format!("{base}/idle")).await.unwrap();
    assert!(UserSelectPage::from_session(&session).await.unwrap().is_some());
    assert!(LoginPage::from_session(&session).await.unwrap().is_none());

    session.goto(&format!("{base}/plain")).await.unwrap();
    assert!(LoginPage::from_session(&session).await.unwrap().is_some());
    assert!(UserSelectPage::from_session(&session).await.unwrap().is_none());

    // Edit pages wait out the pending save before answering
    session.goto(&format!("{base}/clearing")).await.unwrap();
    assert!(GroupEditPage::from_session(&session).await.unwrap().is_some());

    session.goto(&format!("{base}/busy")).await.unwrap();
    let err = GroupEditPage::from_session(&session).await.err().unwrap();
    assert!(err.is_timeout());

    session.close().await.unwrap();
}
