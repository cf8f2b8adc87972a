//! Theme list and theme editor

use std::collections::BTreeMap;

use fantoccini::elements::Element;
use fantoccini::Locator;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::pages::{css_string, has_heading};
use crate::session::{option_texts, replace_text, select_by_text, selected_option_text, Session};

const STATUS_RADIOS: &str = r#"input[name="theme-status"]"#;

/// Theme list plus create button
pub struct ThemeSelectPage<'a> {
    session: &'a Session,
}

impl<'a> ThemeSelectPage<'a> {
    pub const HEADING: &'static str = "Select theme";

    pub async fn from_session(session: &'a Session) -> E2eResult<Option<Self>> {
        Ok(has_heading(session, Self::HEADING)
            .await?
            .then(|| Self { session }))
    }

    async fn theme_select(&self) -> E2eResult<Element> {
        self.session.wait_for("select").await
    }

    pub async fn has_theme(&self, name: &str) -> E2eResult<bool> {
        let options = option_texts(&self.theme_select().await?).await?;
        Ok(options.iter().any(|opt| opt == name))
    }

    pub async fn edit_theme(&self, name: &str) -> E2eResult<()> {
        select_by_text(&self.theme_select().await?, name).await?;
        self.session
            .find(r#"input[value="Edit"]"#)
            .await?
            .click()
            .await?;
        Ok(())
    }

    pub async fn create_theme(&self) -> E2eResult<Option<ThemeEditPage<'a>>> {
        self.session
            .find(r#"input[value="Create"]"#)
            .await?
            .click()
            .await?;
        ThemeEditPage::from_session(self.session).await
    }
}

/// Foreground/background pair a theme color is made of
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeColor {
    pub fg_name: String,
    pub fg_lightness: f64,
    pub bg_name: String,
    pub bg_lightness: f64,
}

impl ThemeColor {
    /// Build from the `data-*` attributes of a `.theme-color-edit` button
    pub fn from_attrs(
        fg_name: Option<String>,
        fg_lightness: Option<String>,
        bg_name: Option<String>,
        bg_lightness: Option<String>,
    ) -> E2eResult<Self> {
        Ok(Self {
            fg_name: fg_name.unwrap_or_default(),
            fg_lightness: parse_lightness("data-fg_lightness", fg_lightness)?,
            bg_name: bg_name.unwrap_or_default(),
            bg_lightness: parse_lightness("data-bg_lightness", bg_lightness)?,
        })
    }
}

fn parse_lightness(name: &str, value: Option<String>) -> E2eResult<f64> {
    let value = value.unwrap_or_default();
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| E2eError::InvalidAttribute {
            name: name.to_string(),
            value,
        })
}

/// Autosaved theme editor
pub struct ThemeEditPage<'a> {
    session: &'a Session,
}

impl<'a> ThemeEditPage<'a> {
    pub const HEADING: &'static str = "Edit theme";

    pub async fn from_session(session: &'a Session) -> E2eResult<Option<Self>> {
        Ok(has_heading(session, Self::HEADING)
            .await?
            .then(|| Self { session }))
    }

    async fn theme_name_input(&self) -> E2eResult<Element> {
        self.session.wait_for(".theme-name").await
    }

    pub async fn theme_name(&self) -> E2eResult<String> {
        Ok(self
            .theme_name_input()
            .await?
            .prop("value")
            .await?
            .unwrap_or_default())
    }

    pub async fn set_theme_name(&self, name: &str) -> E2eResult<()> {
        replace_text(&self.theme_name_input().await?, name).await
    }

    pub async fn change_palette(&self, palette_name: &str) -> E2eResult<()> {
        self.session.wait_for(".change-palette").await?.click().await?;
        let select = self.session.wait_for(".palette-select").await?;
        select_by_text(&select, palette_name).await?;
        self.session
            .find(r#"input[value="Change Palette"]"#)
            .await?
            .click()
            .await?;
        Ok(())
    }

    /// Theme color label to its fg/bg definition
    pub async fn theme_colors(&self) -> E2eResult<BTreeMap<String, ThemeColor>> {
        let mut colors = BTreeMap::new();
        for elem in self.session.find_all(".theme-color-edit").await? {
            let color = ThemeColor::from_attrs(
                elem.attr("data-fg_color").await?,
                elem.attr("data-fg_lightness").await?,
                elem.attr("data-bg_color").await?,
                elem.attr("data-bg_lightness").await?,
            )?;
            colors.insert(elem.text().await?, color);
        }
        Ok(colors)
    }

    async fn select_theme_color(&self, name: &str) -> E2eResult<()> {
        let elem = self
            .session
            .find_by_text(".theme-color-edit", |text| text.ends_with(name))
            .await?
            .ok_or_else(|| E2eError::NotFound(format!("no color with name {name}")))?;
        elem.click().await?;
        Ok(())
    }

    async fn set_current_theme_color_name(&self, name: &str) -> E2eResult<()> {
        let input = self.session.wait_for(".current-theme-color-name").await?;
        replace_text(&input, name).await
    }

    async fn set_current_theme_color_lightness(&self, fg: f64, bg: f64) -> E2eResult<()> {
        self.session
            .call_window_fn("_setThemeColorLightness", vec![json!(fg), json!(bg)])
            .await
    }

    /// Pick a palette color in the `fg` or `bg` editor
    async fn set_palette_color(&self, editor: &str, palette_color: &str) -> E2eResult<()> {
        let css = format!(".{editor}-editor button");
        let btn = self
            .session
            .find_by_text(&css, |text| text.ends_with(palette_color))
            .await?
            .ok_or_else(|| {
                E2eError::NotFound(format!("no palette color with name {palette_color}"))
            })?;
        btn.click().await?;
        Ok(())
    }

    async fn edit_current_theme_color(&self, name: &str, color: &ThemeColor) -> E2eResult<()> {
        self.set_current_theme_color_name(name).await?;
        self.set_current_theme_color_lightness(color.fg_lightness, color.bg_lightness)
            .await?;
        self.set_palette_color("fg", &color.fg_name).await?;
        self.set_palette_color("bg", &color.bg_name).await
    }

    pub async fn set_theme_color(&self, current_name: &str, name: &str, color: &ThemeColor) -> E2eResult<()> {
        self.select_theme_color(current_name).await?;
        self.edit_current_theme_color(name, color).await
    }

    pub async fn add_theme_color(&self, name: &str, color: &ThemeColor) -> E2eResult<()> {
        self.session.wait_for(".add-color").await?.click().await?;
        self.edit_current_theme_color(name, color).await
    }

    pub async fn delete_theme_color(&self, name: &str) -> E2eResult<()> {
        self.select_theme_color(name).await?;
        self.session.wait_for(".del-color").await?.click().await?;
        Ok(())
    }

    async fn app_select(&self) -> E2eResult<Element> {
        self.session.wait_for(".app-select").await
    }

    /// For every app, mapping name to the theme color it is mapped to
    pub async fn mappings(&self) -> E2eResult<BTreeMap<String, BTreeMap<String, String>>> {
        let apps = self.app_select().await?;
        let mut mappings = BTreeMap::new();

        for app in option_texts(&apps).await? {
            select_by_text(&apps, &app).await?;

            let mut app_mappings = BTreeMap::new();
            for select in self.session.find_all(".mapping-select").await? {
                let mapping = select.attr("data-mapping-name").await?.unwrap_or_default();
                let value = selected_option_text(&select).await?.unwrap_or_default();
                app_mappings.insert(mapping, value);
            }

            debug!("{} has {} mappings", app, app_mappings.len());
            mappings.insert(app, app_mappings);
        }

        Ok(mappings)
    }

    pub async fn map_color(&self, app: &str, mapping: &str, theme_color: &str) -> E2eResult<()> {
        select_by_text(&self.app_select().await?, app).await?;

        let css = format!("select[data-mapping-name={}]", css_string(mapping));
        let select = self.session.wait_for(&css).await?;
        select_by_text(&select, theme_color).await
    }

    /// Value of the checked `theme-status` radio button
    pub async fn active_status(&self) -> E2eResult<String> {
        for radio in self.session.find_all(STATUS_RADIOS).await? {
            if self.session.element_property_flag(&radio, "checked").await? {
                return Ok(radio.attr("value").await?.unwrap_or_default());
            }
        }
        Err(E2eError::NotFound("no checked theme-status found".to_string()))
    }

    pub async fn set_active_status(&self, status: &str) -> E2eResult<()> {
        for radio in self.session.find_all(STATUS_RADIOS).await? {
            if radio.attr("value").await?.as_deref() == Some(status) {
                // the radio input is visually hidden; click its label instead
                match radio.find(Locator::XPath("./ancestor::label")).await {
                    Ok(label) => label.click().await?,
                    Err(e) if e.is_no_such_element() => radio.click().await?,
                    Err(e) => return Err(e.into()),
                }
                return Ok(());
            }
        }
        Err(E2eError::NotFound(format!(
            "status '{status}' radio button not found"
        )))
    }

    pub async fn wait_save(&self) -> E2eResult<()> {
        self.session.wait_save().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_theme_color_from_attrs() {
        let color = ThemeColor::from_attrs(some("black"), some("0.1"), some("white"), some(" 0.95 ")).unwrap();
        assert_eq!(
            color,
            ThemeColor {
                fg_name: "black".to_string(),
                fg_lightness: 0.1,
                bg_name: "white".to_string(),
                bg_lightness: 0.95,
            }
        );
    }

    #[test]
    fn test_bad_lightness_is_rejected() {
        let err = ThemeColor::from_attrs(some("black"), some("dark"), some("white"), some("1")).unwrap_err();
        match err {
            E2eError::InvalidAttribute { name, value } => {
                assert_eq!(name, "data-fg_lightness");
                assert_eq!(value, "dark");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_lightness_is_rejected() {
        let err = ThemeColor::from_attrs(some("black"), some("0.5"), some("white"), None).unwrap_err();
        assert!(matches!(err, E2eError::InvalidAttribute { .. }));
    }
}
