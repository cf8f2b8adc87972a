//! Color palette list and editor

use std::collections::BTreeMap;

use fantoccini::elements::Element;
use serde_json::json;

use crate::error::{E2eError, E2eResult};
use crate::pages::has_heading;
use crate::session::{option_texts, replace_text, select_by_text, Session};

/// List of palettes plus the create form
pub struct ColorPaletteSelectPage<'a> {
    session: &'a Session,
}

impl<'a> ColorPaletteSelectPage<'a> {
    pub const HEADING: &'static str = "Select color palette";

    pub async fn from_session(session: &'a Session) -> E2eResult<Option<Self>> {
        session.wait_save().await?;
        Ok(has_heading(session, Self::HEADING)
            .await?
            .then(|| Self { session }))
    }

    async fn palette_select(&self) -> E2eResult<Element> {
        self.session.wait_for("select").await
    }

    pub async fn has_palette(&self, name: &str) -> E2eResult<bool> {
        let options = option_texts(&self.palette_select().await?).await?;
        Ok(options.iter().any(|opt| opt == name))
    }

    pub async fn edit_palette(&self, name: &str) -> E2eResult<()> {
        select_by_text(&self.palette_select().await?, name).await?;
        self.session
            .wait_for(r#"input[value="Edit"]"#)
            .await?
            .click()
            .await?;
        Ok(())
    }

    pub async fn enter_palette_name(&self, name: &str) -> E2eResult<()> {
        let input = self.session.wait_for(r#"input[type="text"]"#).await?;
        replace_text(&input, name).await
    }

    /// Create a palette and resolve the edit page the server lands on
    pub async fn create_palette(&self, name: &str) -> E2eResult<Option<ColorPaletteEditPage<'a>>> {
        self.enter_palette_name(name).await?;
        self.session
            .wait_for(r#"input[value="Create"]"#)
            .await?
            .click()
            .await?;
        ColorPaletteEditPage::from_session(self.session).await
    }
}

/// Autosaved palette editor
pub struct ColorPaletteEditPage<'a> {
    session: &'a Session,
}

impl<'a> ColorPaletteEditPage<'a> {
    pub const HEADING: &'static str = "Edit color palette";

    pub async fn from_session(session: &'a Session) -> E2eResult<Option<Self>> {
        session.wait_save().await?;
        Ok(has_heading(session, Self::HEADING)
            .await?
            .then(|| Self { session }))
    }

    async fn palette_name_input(&self) -> E2eResult<Element> {
        self.session.wait_for(".palette-name").await
    }

    pub async fn palette_name(&self) -> E2eResult<String> {
        Ok(self
            .palette_name_input()
            .await?
            .prop("value")
            .await?
            .unwrap_or_default())
    }

    pub async fn set_palette_name(&self, name: &str) -> E2eResult<()> {
        replace_text(&self.palette_name_input().await?, name).await
    }

    /// Color name to hex value, e.g. `"red" => "#ff0000"`
    pub async fn colors(&self) -> E2eResult<BTreeMap<String, String>> {
        let mut colors = BTreeMap::new();
        for elem in self.session.find_all(".color-indicator").await? {
            let name = elem.attr("data-name").await?.unwrap_or_default();
            let hex = elem.attr("data-hex").await?.unwrap_or_default();
            colors.insert(name, hex);
        }
        Ok(colors)
    }

    async fn color_elem(&self, name: &str) -> E2eResult<Option<Element>> {
        for elem in self.session.find_all(".color-indicator").await? {
            if elem.attr("data-name").await?.as_deref() == Some(name) {
                return Ok(Some(elem));
            }
        }
        Ok(None)
    }

    async fn select_color(&self, name: &str) -> E2eResult<()> {
        let elem = self
            .color_elem(name)
            .await?
            .ok_or_else(|| E2eError::NotFound(format!("no color with name {name}")))?;
        elem.click().await?;
        Ok(())
    }

    async fn set_current_color_name(&self, name: &str) -> E2eResult<()> {
        let input = self.session.wait_for(".current-color-name").await?;
        replace_text(&input, name).await
    }

    async fn set_current_color_hex(&self, hex: &str) -> E2eResult<()> {
        self.session
            .call_window_fn("_setPaletteColorHex", vec![json!(hex)])
            .await
    }

    /// Rename and recolor the existing color `current_name`
    pub async fn set_color(&self, current_name: &str, name: &str, hex: &str) -> E2eResult<()> {
        self.select_color(current_name).await?;
        self.set_current_color_name(name).await?;
        self.set_current_color_hex(hex).await
    }

    pub async fn add_color(&self, name: &str, hex: &str) -> E2eResult<()> {
        self.session.wait_for(".add-color").await?.click().await?;
        self.set_current_color_name(name).await?;
        self.set_current_color_hex(hex).await
    }

    pub async fn delete_color(&self, name: &str) -> E2eResult<()> {
        self.select_color(name).await?;
        self.session.wait_for(".del-color").await?.click().await?;
        Ok(())
    }

    pub async fn wait_save(&self) -> E2eResult<()> {
        self.session.wait_save().await
    }
}
