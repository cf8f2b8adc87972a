//! Login page

use serde_json::json;
use tracing::debug;

use crate::error::E2eResult;
use crate::pages::has_heading;
use crate::session::{select_by_text, Session};

const NOAUTH_TAB: &str = r#"tab-item[key="noauth"]"#;

/// `/login/` with the authentication method tabs
pub struct LoginPage<'a> {
    session: &'a Session,
}

impl<'a> LoginPage<'a> {
    pub const HEADING: &'static str = "Log in";

    pub async fn from_session(session: &'a Session) -> E2eResult<Option<Self>> {
        Ok(has_heading(session, Self::HEADING)
            .await?
            .then(|| Self::new(session)))
    }

    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Log in through the "noauth" tab, which lets you pick any user
    pub async fn log_in_as_user(&self, username: &str) -> E2eResult<()> {
        debug!("Logging in as {} through the login form", username);

        self.session
            .call_element_fn(".tab-strip", "activateTab", vec![json!("noauth")])
            .await?;

        let tab = self.session.wait_for(NOAUTH_TAB).await?;
        let select = self.session.find(&format!("{NOAUTH_TAB} select")).await?;
        select_by_text(&select, username).await?;

        tab.find(fantoccini::Locator::Css(r#"input[type="submit"]"#))
            .await?
            .click()
            .await?;

        Ok(())
    }
}
