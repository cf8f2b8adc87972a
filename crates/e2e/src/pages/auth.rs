//! Authentication plugin configuration

use fantoccini::elements::Element;

use crate::error::E2eResult;
use crate::pages::{css_string, has_heading};
use crate::session::{replace_text, Session};

const NOAUTH: &str = "noauth";
const SIWG: &str = "siwg";

/// Per-plugin authentication settings, autosaved
pub struct AuthConfigEditPage<'a> {
    session: &'a Session,
}

impl<'a> AuthConfigEditPage<'a> {
    pub const HEADING: &'static str = "Authentication Configuration";

    pub async fn from_session(session: &'a Session) -> E2eResult<Option<Self>> {
        session.wait_save().await?;
        Ok(has_heading(session, Self::HEADING)
            .await?
            .then(|| Self { session }))
    }

    fn section_css(key: &str) -> String {
        format!("section[data-plugin-key={}]", css_string(key))
    }

    fn checkbox_css(key: &str) -> String {
        format!(r#"{} input[type="checkbox"]"#, Self::section_css(key))
    }

    async fn checkbox(&self, key: &str) -> E2eResult<Element> {
        self.session.wait_for(&Self::checkbox_css(key)).await
    }

    async fn plugin_enabled(&self, key: &str) -> E2eResult<bool> {
        self.session
            .property_flag(&Self::checkbox_css(key), "checked")
            .await
    }

    async fn toggle_plugin(&self, key: &str) -> E2eResult<()> {
        self.checkbox(key).await?.click().await?;
        Ok(())
    }

    async fn enable_plugin(&self, key: &str, enabled: bool) -> E2eResult<()> {
        if self.plugin_enabled(key).await? != enabled {
            self.toggle_plugin(key).await?;
        }
        Ok(())
    }

    pub async fn noauth_is_enabled(&self) -> E2eResult<bool> {
        self.plugin_enabled(NOAUTH).await
    }

    pub async fn siwg_is_enabled(&self) -> E2eResult<bool> {
        self.plugin_enabled(SIWG).await
    }

    pub async fn toggle_noauth(&self) -> E2eResult<()> {
        self.toggle_plugin(NOAUTH).await
    }

    pub async fn enable_noauth(&self, enabled: bool) -> E2eResult<()> {
        self.enable_plugin(NOAUTH, enabled).await
    }

    pub async fn toggle_sign_in_with_google(&self) -> E2eResult<()> {
        self.toggle_plugin(SIWG).await
    }

    pub async fn enable_sign_in_with_google(&self, enabled: bool) -> E2eResult<()> {
        self.enable_plugin(SIWG, enabled).await
    }

    async fn google_client_id_input(&self) -> E2eResult<Element> {
        let css = format!(r#"{} input[type="text"]"#, Self::section_css(SIWG));
        self.session.wait_for(&css).await
    }

    pub async fn google_client_id(&self) -> E2eResult<String> {
        Ok(self
            .google_client_id_input()
            .await?
            .prop("value")
            .await?
            .unwrap_or_default())
    }

    pub async fn set_google_client_id(&self, client_id: &str) -> E2eResult<()> {
        replace_text(&self.google_client_id_input().await?, client_id).await
    }

    pub async fn wait_save(&self) -> E2eResult<()> {
        self.session.wait_save().await
    }
}
