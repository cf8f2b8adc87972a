//! End-to-end scenarios against the admin UI
//!
//! Every scenario starts logged out. Edits are always followed by a save
//! wait and a reload so the assertions read what the server persisted.

use std::collections::BTreeMap;
use std::fmt::Debug;

use futures::future::LocalBoxFuture;
use tracing::info;

use crate::error::{E2eError, E2eResult};
use crate::pages::{ColorPaletteEditPage, GroupEditPage, LoginPage, ThemeColor, ThemeEditPage};
use crate::runner::Scenario;
use crate::site::{Site, ADMIN_USER, TEST_GROUP, TEST_USER};

const EDIT_SECURITY: &str = "shell.edit_security";
const EDIT_THEMES: &str = "shell.edit_themes";
const EDIT_GREETING: &str = "hello.edit_greeting";

/// Every scenario, in run order
pub fn all() -> Vec<Scenario<Site>> {
    vec![
        Scenario::new("login", "username_matches_user", login_username_matches_user),
        Scenario::new("login", "logout_eliminates_user", login_logout_eliminates_user),
        Scenario::new("login", "login_link_opens_login_page", login_link_opens_login_page),
        Scenario::new("admin", "admin_sees_security_sections", admin_sees_security_sections),
        Scenario::new("admin", "unprivileged_sees_no_sections", admin_unprivileged_sees_no_sections),
        Scenario::new("users", "non_admin_denied", users_non_admin_denied),
        Scenario::new("users", "admin_creates_user", users_admin_creates_user),
        Scenario::new("groups", "edit_me", groups_edit_me),
        Scenario::new("groups", "capabilities_round_trip", groups_capabilities_round_trip),
        Scenario::new("auth", "settings_persist", auth_settings_persist),
        Scenario::new("color_palette", "edits_persist", color_palette_edits_persist),
        Scenario::new("color_palette", "missing_color_is_reported", color_palette_missing_color_is_reported),
        Scenario::new("color_palette", "delete_color_by_select", color_palette_delete_color_by_select),
        Scenario::new("theme", "edits_persist", theme_edits_persist),
        Scenario::new("theme", "colors_and_mappings_persist", theme_colors_and_mappings_persist),
    ]
}

fn ensure(cond: bool, msg: impl Into<String>) -> E2eResult<()> {
    if cond {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(msg.into()))
    }
}

fn ensure_eq<T: PartialEq + Debug>(what: &str, actual: T, expected: T) -> E2eResult<()> {
    ensure(
        actual == expected,
        format!("{what}: expected {expected:?}, got {actual:?}"),
    )
}

/// Turn an absent page resolution into an assertion failure
fn require<T>(page: Option<T>, what: &str) -> E2eResult<T> {
    page.ok_or_else(|| E2eError::AssertionFailed(format!("expected to be on the {what} page")))
}

fn login_username_matches_user(site: &Site) -> LocalBoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        site.log_in_as_user(ADMIN_USER).await?;
        ensure_eq("username", site.current_username().await?, Some(ADMIN_USER.to_string()))
    })
}

fn login_logout_eliminates_user(site: &Site) -> LocalBoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        site.log_in_as_user(ADMIN_USER).await?;
        site.log_out().await?;
        ensure_eq("username", site.current_username().await?, None)
    })
}

fn login_link_opens_login_page(site: &Site) -> LocalBoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        site.goto_hello_page().await?;
        site.click_login_link().await?;
        require(LoginPage::from_session(site.session()).await?, "login")?;
        Ok(())
    })
}

fn admin_sees_security_sections(site: &Site) -> LocalBoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        site.log_in_with_nonce(ADMIN_USER).await?;
        let page = require(site.goto_admin_page().await?, "admin")?;

        ensure(page.has_users_section().await?, "admin should see Users")?;
        ensure(page.has_groups_section().await?, "admin should see Groups")?;
        ensure(page.has_auth_section().await?, "admin should see Authentication")
    })
}

fn admin_unprivileged_sees_no_sections(site: &Site) -> LocalBoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        site.log_in_with_nonce(TEST_USER).await?;

        // the page renders for any user, only the cards are withheld
        let page = require(site.goto_admin_page().await?, "admin")?;
        ensure(!page.has_users_section().await?, "test user should not see Users")?;
        ensure(!page.has_groups_section().await?, "test user should not see Groups")?;
        ensure(!page.has_auth_section().await?, "test user should not see Authentication")?;
        ensure(!page.has_theme_section().await?, "test user should not see Theme")?;
        ensure(
            !page.has_color_palette_section().await?,
            "test user should not see Color Palette",
        )
    })
}

fn users_non_admin_denied(site: &Site) -> LocalBoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        site.log_in_with_nonce(TEST_USER).await?;
        let page = site.goto_user_select_page().await?;
        ensure(page.is_none(), "test user should be denied the user page")
    })
}

fn users_admin_creates_user(site: &Site) -> LocalBoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        site.log_in_with_nonce(ADMIN_USER).await?;
        site.create_user("created_by_admin", TEST_GROUP).await?;

        let page = require(site.goto_user_select_page().await?, "user select")?;
        ensure(
            page.has_username("created_by_admin").await?,
            "new user should be listed",
        )
    })
}

fn groups_edit_me(site: &Site) -> LocalBoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        site.log_in_with_nonce(ADMIN_USER).await?;
        site.create_group("edit_me").await?;

        let page = require(GroupEditPage::from_session(site.session()).await?, "group edit")?;
        for cap in [EDIT_SECURITY, EDIT_THEMES, EDIT_GREETING] {
            ensure(!page.has_capability(cap).await?, format!("{cap} should default to false"))?;
        }

        page.toggle_capability(EDIT_SECURITY).await?;
        page.toggle_capability(EDIT_THEMES).await?;
        page.wait_save().await?;

        site.reload().await?;
        let page = require(GroupEditPage::from_session(site.session()).await?, "group edit")?;
        ensure(page.has_capability(EDIT_SECURITY).await?, "edit_security should persist")?;
        ensure(page.has_capability(EDIT_THEMES).await?, "edit_themes should persist")?;
        ensure(!page.has_capability(EDIT_GREETING).await?, "edit_greeting should stay false")?;

        page.set_groupname("edited").await?;
        page.wait_save().await?;

        site.reload().await?;
        let page = require(GroupEditPage::from_session(site.session()).await?, "group edit")?;
        ensure_eq("groupname", page.groupname().await?.as_str(), "edited")?;

        let select = require(site.goto_group_select_page().await?, "group select")?;
        ensure(select.has_groupname("edited").await?, "renamed group should be listed")?;
        ensure(!select.has_groupname("edit_me").await?, "old group name should be gone")
    })
}

fn groups_capabilities_round_trip(site: &Site) -> LocalBoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        site.log_in_with_nonce(ADMIN_USER).await?;
        site.create_group("caps_round_trip").await?;

        let page = require(GroupEditPage::from_session(site.session()).await?, "group edit")?;
        let mut expected = page.capabilities().await?;
        for cap in [EDIT_SECURITY, EDIT_THEMES, EDIT_GREETING] {
            ensure_eq(cap, expected.get(cap).copied(), Some(false))?;
        }

        page.set_capability(EDIT_GREETING, true).await?;
        page.set_capability(EDIT_SECURITY, false).await?;
        page.wait_save().await?;
        expected.insert(EDIT_GREETING.to_string(), true);

        site.reload().await?;
        let page = require(GroupEditPage::from_session(site.session()).await?, "group edit")?;
        ensure_eq("capabilities", page.capabilities().await?, expected)
    })
}

fn auth_settings_persist(site: &Site) -> LocalBoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        site.log_in_with_nonce(ADMIN_USER).await?;

        let page = require(site.goto_auth_config_page().await?, "auth config")?;
        let noauth = page.noauth_is_enabled().await?;

        page.enable_sign_in_with_google(true).await?;
        page.set_google_client_id("uitest-client-id").await?;
        page.toggle_noauth().await?;
        page.wait_save().await?;

        site.reload().await?;
        let page = require(site.goto_auth_config_page().await?, "auth config")?;
        ensure(page.siwg_is_enabled().await?, "sign in with google should be enabled")?;
        ensure_eq("client id", page.google_client_id().await?.as_str(), "uitest-client-id")?;
        ensure_eq("noauth enabled", page.noauth_is_enabled().await?, !noauth)?;

        // later scenarios log in through the noauth form
        info!("Restoring authentication settings");
        page.enable_noauth(noauth).await?;
        page.enable_sign_in_with_google(false).await?;
        page.wait_save().await
    })
}

fn same_hex(a: &str, b: &str) -> bool {
    a.trim_start_matches('#').eq_ignore_ascii_case(b.trim_start_matches('#'))
}

fn color_palette_edits_persist(site: &Site) -> LocalBoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        site.log_in_with_nonce(ADMIN_USER).await?;

        let select = require(site.goto_color_palette_select_page().await?, "palette select")?;
        let page = require(select.create_palette("uitest palette").await?, "palette edit")?;

        page.add_color("uitest red", "#ff0000").await?;
        page.wait_save().await?;
        page.set_palette_name("renamed palette").await?;
        page.wait_save().await?;

        site.reload().await?;
        let page = require(ColorPaletteEditPage::from_session(site.session()).await?, "palette edit")?;
        ensure_eq("palette name", page.palette_name().await?.as_str(), "renamed palette")?;

        let colors = page.colors().await?;
        let red = colors
            .get("uitest red")
            .ok_or_else(|| E2eError::AssertionFailed(format!("added color missing: {colors:?}")))?;
        ensure(same_hex(red, "#ff0000"), format!("unexpected hex {red}"))?;

        page.set_color("uitest red", "uitest blue", "#0000ff").await?;
        page.wait_save().await?;

        site.reload().await?;
        let page = require(ColorPaletteEditPage::from_session(site.session()).await?, "palette edit")?;
        let colors = page.colors().await?;
        ensure(!colors.contains_key("uitest red"), "old color name should be gone")?;
        ensure(
            colors.get("uitest blue").is_some_and(|hex| same_hex(hex, "#0000ff")),
            format!("renamed color missing: {colors:?}"),
        )?;

        let select = require(site.goto_color_palette_select_page().await?, "palette select")?;
        ensure(select.has_palette("renamed palette").await?, "renamed palette should be listed")
    })
}

fn color_palette_missing_color_is_reported(site: &Site) -> LocalBoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        site.log_in_with_nonce(ADMIN_USER).await?;

        let select = require(site.goto_color_palette_select_page().await?, "palette select")?;
        let page = require(select.create_palette("missing colors").await?, "palette edit")?;

        match page.set_color("no such color", "x", "#000000").await {
            Err(E2eError::NotFound(msg)) => ensure(
                msg.contains("no such color"),
                format!("error should name the color: {msg}"),
            ),
            Err(e) => Err(e),
            Ok(()) => Err(E2eError::AssertionFailed(
                "editing a missing color should fail".to_string(),
            )),
        }
    })
}

fn color_palette_delete_color_by_select(site: &Site) -> LocalBoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        site.log_in_with_nonce(ADMIN_USER).await?;
        create_palette(site, "uitest pruned", &[("keep", "#00ff00"), ("drop", "#ff00ff")]).await?;

        let select = require(site.goto_color_palette_select_page().await?, "palette select")?;
        select.edit_palette("uitest pruned").await?;
        let page = require(ColorPaletteEditPage::from_session(site.session()).await?, "palette edit")?;
        ensure_eq("palette name", page.palette_name().await?.as_str(), "uitest pruned")?;

        page.delete_color("drop").await?;
        page.wait_save().await?;

        site.reload().await?;
        let page = require(ColorPaletteEditPage::from_session(site.session()).await?, "palette edit")?;
        let colors = page.colors().await?;
        ensure(!colors.contains_key("drop"), format!("deleted color still listed: {colors:?}"))?;
        ensure(colors.contains_key("keep"), format!("kept color missing: {colors:?}"))
    })
}

/// Create a palette holding `colors` and leave the browser on its editor
async fn create_palette(site: &Site, name: &str, colors: &[(&str, &str)]) -> E2eResult<()> {
    let select = require(site.goto_color_palette_select_page().await?, "palette select")?;
    let page = require(select.create_palette(name).await?, "palette edit")?;
    for (color, hex) in colors {
        page.add_color(color, hex).await?;
        page.wait_save().await?;
    }
    Ok(())
}

fn theme_edits_persist(site: &Site) -> LocalBoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        site.log_in_with_nonce(ADMIN_USER).await?;

        let select = require(site.goto_theme_select_page().await?, "theme select")?;
        let page = require(select.create_theme().await?, "theme edit")?;
        let status = page.active_status().await?;
        let target = if status == "dark" { "light" } else { "dark" };

        page.set_theme_name("uitest theme").await?;
        page.set_active_status(target).await?;
        page.wait_save().await?;

        site.reload().await?;
        let page = require(ThemeEditPage::from_session(site.session()).await?, "theme edit")?;
        ensure_eq("theme name", page.theme_name().await?.as_str(), "uitest theme")?;
        ensure_eq("theme status", page.active_status().await?.as_str(), target)?;

        // leave the site's active theme as it was
        page.set_active_status(&status).await?;
        page.wait_save().await?;

        let select = require(site.goto_theme_select_page().await?, "theme select")?;
        ensure(select.has_theme("uitest theme").await?, "renamed theme should be listed")
    })
}

const THEME_PALETTE: &str = "uitest theme palette";
const INK: &str = "uitest ink";
const PAPER: &str = "uitest paper";

fn same_color(actual: &ThemeColor, expected: &ThemeColor) -> bool {
    actual.fg_name == expected.fg_name
        && actual.bg_name == expected.bg_name
        && (actual.fg_lightness - expected.fg_lightness).abs() < 0.01
        && (actual.bg_lightness - expected.bg_lightness).abs() < 0.01
}

/// Theme color whose label ends with `name` (labels may carry a swatch prefix)
fn theme_color<'c>(colors: &'c BTreeMap<String, ThemeColor>, name: &str) -> Option<&'c ThemeColor> {
    colors
        .iter()
        .find(|(label, _)| label.ends_with(name))
        .map(|(_, color)| color)
}

async fn reload_theme_page(site: &Site) -> E2eResult<ThemeEditPage<'_>> {
    site.reload().await?;
    let page = require(ThemeEditPage::from_session(site.session()).await?, "theme edit")?;
    page.wait_save().await?;
    Ok(page)
}

fn theme_colors_and_mappings_persist(site: &Site) -> LocalBoxFuture<'_, E2eResult<()>> {
    Box::pin(async move {
        site.log_in_with_nonce(ADMIN_USER).await?;
        create_palette(site, THEME_PALETTE, &[(INK, "#101010"), (PAPER, "#f0f0f0")]).await?;

        let select = require(site.goto_theme_select_page().await?, "theme select")?;
        let page = require(select.create_theme().await?, "theme edit")?;
        page.set_theme_name("uitest colors").await?;
        page.wait_save().await?;
        page.change_palette(THEME_PALETTE).await?;

        let page = require(ThemeEditPage::from_session(site.session()).await?, "theme edit")?;
        page.wait_save().await?;

        let body = ThemeColor {
            fg_name: INK.to_string(),
            fg_lightness: 0.2,
            bg_name: PAPER.to_string(),
            bg_lightness: 0.9,
        };
        page.add_theme_color("body", &body).await?;
        page.wait_save().await?;
        page.add_theme_color("scratch", &body).await?;
        page.wait_save().await?;

        let page = reload_theme_page(site).await?;
        let colors = page.theme_colors().await?;
        ensure(
            theme_color(&colors, "body").is_some_and(|c| same_color(c, &body)),
            format!("added theme color missing: {colors:?}"),
        )?;
        ensure(theme_color(&colors, "scratch").is_some(), "second theme color missing")?;

        let inverted = ThemeColor {
            fg_name: PAPER.to_string(),
            fg_lightness: 0.8,
            bg_name: INK.to_string(),
            bg_lightness: 0.1,
        };
        page.set_theme_color("body", "body text", &inverted).await?;
        page.wait_save().await?;
        page.delete_theme_color("scratch").await?;
        page.wait_save().await?;

        let page = reload_theme_page(site).await?;
        let colors = page.theme_colors().await?;
        ensure(theme_color(&colors, "scratch").is_none(), "deleted theme color still listed")?;
        ensure(
            theme_color(&colors, "body text").is_some_and(|c| same_color(c, &inverted)),
            format!("edited theme color missing: {colors:?}"),
        )?;

        let mappings = page.mappings().await?;
        let (app, mapping) = mappings
            .iter()
            .find_map(|(app, maps)| maps.keys().next().map(|m| (app.clone(), m.clone())))
            .ok_or_else(|| E2eError::AssertionFailed("no app exposes a color mapping".to_string()))?;
        page.map_color(&app, &mapping, "body text").await?;
        page.wait_save().await?;

        let page = reload_theme_page(site).await?;
        let mapped = page.mappings().await?;
        ensure(
            mapped
                .get(&app)
                .and_then(|maps| maps.get(&mapping))
                .is_some_and(|color| color.ends_with("body text")),
            format!("{app}/{mapping} should map to body text: {mapped:?}"),
        )?;

        let select = require(site.goto_theme_select_page().await?, "theme select")?;
        select.edit_theme("uitest colors").await?;
        let page = require(ThemeEditPage::from_session(site.session()).await?, "theme edit")?;
        ensure_eq("theme name", page.theme_name().await?.as_str(), "uitest colors")
    })
}
