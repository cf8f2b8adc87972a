//! Admin landing page with one card per tool

use crate::error::E2eResult;
use crate::session::Session;

/// `/site/admin/`: one card per admin tool the user may access
pub struct AdminPage<'a> {
    session: &'a Session,
}

impl<'a> AdminPage<'a> {
    /// The admin page has no heading; the card container identifies it
    pub async fn from_session(session: &'a Session) -> E2eResult<Option<Self>> {
        let found = !session.find_all(".card-container").await?.is_empty();
        Ok(found.then_some(Self { session }))
    }

    async fn has_section(&self, title: &str) -> E2eResult<bool> {
        Ok(self
            .session
            .find_by_text(".card h2", |text| text == title)
            .await?
            .is_some())
    }

    pub async fn has_users_section(&self) -> E2eResult<bool> {
        self.has_section("Users").await
    }

    pub async fn has_groups_section(&self) -> E2eResult<bool> {
        self.has_section("Groups").await
    }

    pub async fn has_auth_section(&self) -> E2eResult<bool> {
        self.has_section("Authentication").await
    }

    pub async fn has_theme_section(&self) -> E2eResult<bool> {
        self.has_section("Theme").await
    }

    pub async fn has_color_palette_section(&self) -> E2eResult<bool> {
        self.has_section("Color Palette").await
    }
}
