use std::collections::BTreeMap;

use axum::response::Html;
use axum::routing::get;
use axum::Router;

use bassline_e2e::pages::{ColorPaletteEditPage, GroupEditPage, ThemeColor, ThemeEditPage};
use bassline_e2e::E2eError;

mod common;

const THEME_EDIT_PAGE: &str = r#"<!doctype html>
<html><body>
<h1>Edit theme</h1>
<input class="theme-name" value="Night">
<button class="theme-color-edit" data-fg_color="ink" data-fg_lightness="0.2"
    data-bg_color="paper" data-bg_lightness="0.9">body</button>
<button class="theme-color-edit" data-fg_color="paper" data-fg_lightness="0.8"
    data-bg_color="ink" data-bg_lightness="0.1">link</button>
<select class="app-select"><option>Hello</option></select>
<select class="mapping-select" data-mapping-name="greeting">
  <option>body</option>
  <option selected>link</option>
</select>
<label><input type="radio" name="theme-status" value="inactive" checked style="display:none"> Inactive</label>
<label><input type="radio" name="theme-status" value="dark" style="display:none"> Dark</label>
<input type="radio" name="theme-status" value="light"> Light
</body></html>"#;

const PALETTE_EDIT_PAGE: &str = r##"<!doctype html>
<html><body>
<h1>Edit color palette</h1>
<input class="palette-name" value="Base">
<div class="color-indicator" data-name="red" data-hex="#ff0000">red</div>
<div class="color-indicator" data-name="blue" data-hex="#0000ff">blue</div>
</body></html>"##;

const GROUP_EDIT_PAGE: &str = r#"<!doctype html>
<html><body>
<h1>Edit group</h1>
<input type="text" value="staff">
<label>shell.edit_security<input type="checkbox" checked></label>
<label>hello.edit_greeting<input type="checkbox"></label>
</body></html>"#;

fn fixture_pages() -> Router {
    Router::new()
        .route("/theme", get(|| async { Html(THEME_EDIT_PAGE) }))
        .route("/palette", get(|| async { Html(PALETTE_EDIT_PAGE) }))
        .route("/group", get(|| async { Html(GROUP_EDIT_PAGE) }))
}

/// Theme editor parsing and status radios against a real browser
///
/// Marked ignored because it requires a running WebDriver server.
#[tokio::test]
#[ignore]
async fn theme_edit_page_reads_and_sets_state() {
    let Some(webdriver_url) = common::webdriver_url() else {
        return;
    };

    let base = common::spawn_fixture_server(fixture_pages()).await;
    let session = common::open_session(webdriver_url).await;
    session.goto(&format!("{base}/theme")).await.unwrap();

    let page = ThemeEditPage::from_session(&session).await.unwrap().unwrap();
    assert_eq!(page.theme_name().await.unwrap(), "Night");

    let colors = page.theme_colors().await.unwrap();
    assert_eq!(
        colors.get("body"),
        Some(&ThemeColor {
            fg_name: "ink".to_string(),
            fg_lightness: 0.2,
            bg_name: "paper".to_string(),
            bg_lightness: 0.9,
        })
    );
    assert_eq!(colors.len(), 2);

    let mappings = page.mappings().await.unwrap();
    assert_eq!(
        mappings,
        BTreeMap::from([(
            "Hello".to_string(),
            BTreeMap::from([("greeting".to_string(), "link".to_string())])
        )])
    );

    page.map_color("Hello", "greeting", "body").await.unwrap();
    assert_eq!(page.mappings().await.unwrap()["Hello"]["greeting"], "body");

    // Hidden radio inside a label: the label is clicked
    assert_eq!(page.active_status().await.unwrap(), "inactive");
    page.set_active_status("dark").await.unwrap();
    assert_eq!(page.active_status().await.unwrap(), "dark");

    // Radio without a label: clicked directly
    page.set_active_status("light").await.unwrap();
    assert_eq!(page.active_status().await.unwrap(), "light");

    let err = page.set_active_status("bright").await.unwrap_err();
    assert!(matches!(err, E2eError::NotFound(ref msg) if msg.contains("bright")));

    let err = page.delete_theme_color("footer").await.unwrap_err();
    assert!(matches!(err, E2eError::NotFound(ref msg) if msg.contains("footer")));

    session.close().await.unwrap();
}

/// Palette editor parsing against a real browser
///
/// Marked ignored because it requires a running WebDriver server.
#[tokio::test]
#[ignore]
async fn palette_edit_page_reads_colors() {
    let Some(webdriver_url) = common::webdriver_url() else {
        return;
    };

    let base = common::spawn_fixture_server(fixture_pages()).await;
    let session = common::open_session(webdriver_url).await;
    session.goto(&format!("{base}/palette")).await.unwrap();

    let page = ColorPaletteEditPage::from_session(&session).await.unwrap().unwrap();
    assert_eq!(page.palette_name().await.unwrap(), "Base");
    assert_eq!(
        page.colors().await.unwrap(),
        BTreeMap::from([
            ("blue".to_string(), "#0000ff".to_string()),
            ("red".to_string(), "#ff0000".to_string()),
        ])
    );

    let err = page.delete_color("green").await.unwrap_err();
    assert!(matches!(err, E2eError::NotFound(ref msg) if msg.contains("green")));

    session.close().await.unwrap();
}

/// Group editor capability checkboxes against a real browser
///
/// Marked ignored because it requires a running WebDriver server.
#[tokio::test]
#[ignore]
async fn group_edit_page_capabilities() {
    let Some(webdriver_url) = common::webdriver_url() else {
        return;
    };

    let base = common::spawn_fixture_server(fixture_pages()).await;
    let session = common::open_session(webdriver_url).await;
    session.goto(&format!("{base}/group")).await.unwrap();

    let page = GroupEditPage::from_session(&session).await.unwrap().unwrap();
    assert_eq!(page.groupname().await.unwrap(), "staff");
    assert_eq!(
        page.capabilities().await.unwrap(),
        BTreeMap::from([
            ("hello.edit_greeting".to_string(), false),
            ("shell.edit_security".to_string(), true),
        ])
    );

    page.set_capability("hello.edit_greeting", true).await.unwrap();
    page.set_capability("shell.edit_security", true).await.unwrap();
    assert!(page.has_capability("hello.edit_greeting").await.unwrap());
    assert!(page.has_capability("shell.edit_security").await.unwrap());

    let err = page.has_capability("shell.edit_themes").await.unwrap_err();
    assert!(matches!(err, E2eError::NotFound(_)));

    session.close().await.unwrap();
}
