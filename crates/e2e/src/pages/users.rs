//! User list and user creation

use fantoccini::elements::Element;

use crate::error::{E2eError, E2eResult};
use crate::pages::has_heading;
use crate::session::{replace_text, select_by_text, Session};

/// `/site/admin/users/`: list of users plus the create form
pub struct UserSelectPage<'a> {
    session: &'a Session,
}

impl<'a> UserSelectPage<'a> {
    pub const HEADING: &'static str = "Select a user";

    pub async fn from_session(session: &'a Session) -> E2eResult<Option<Self>> {
        Ok(has_heading(session, Self::HEADING)
            .await?
            .then(|| Self { session }))
    }

    async fn user_link(&self, username: &str) -> E2eResult<Option<Element>> {
        Ok(self.session.find_links(username).await?.into_iter().next())
    }

    pub async fn has_username(&self, username: &str) -> E2eResult<bool> {
        Ok(self.user_link(username).await?.is_some())
    }

    pub async fn select_user(&self, username: &str) -> E2eResult<()> {
        let link = self
            .user_link(username)
            .await?
            .ok_or_else(|| E2eError::NotFound(format!("no user with name {username}")))?;
        link.click().await?;
        Ok(())
    }

    pub async fn enter_username(&self, username: &str) -> E2eResult<()> {
        let input = self.session.wait_for(r#"input[type="text"]"#).await?;
        replace_text(&input, username).await
    }

    pub async fn select_group(&self, groupname: &str) -> E2eResult<()> {
        let select = self.session.wait_for("select").await?;
        select_by_text(&select, groupname).await
    }

    pub async fn create_user(&self, username: &str, groupname: &str) -> E2eResult<()> {
        self.enter_username(username).await?;
        self.select_group(groupname).await?;
        self.session
            .find(r#"input[value="Create"]"#)
            .await?
            .click()
            .await?;
        Ok(())
    }
}
