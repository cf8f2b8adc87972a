//! Group list and group editor

use std::collections::BTreeMap;

use fantoccini::elements::Element;
use fantoccini::Locator;

use crate::error::{E2eError, E2eResult};
use crate::pages::{css_string, has_heading};
use crate::session::{replace_text, Session};

/// `/site/admin/groups/`: one button per group plus the create form
pub struct GroupSelectPage<'a> {
    session: &'a Session,
}

impl<'a> GroupSelectPage<'a> {
    pub const HEADING: &'static str = "Select a group";

    pub async fn from_session(session: &'a Session) -> E2eResult<Option<Self>> {
        Ok(has_heading(session, Self::HEADING)
            .await?
            .then(|| Self { session }))
    }

    async fn group_button(&self, groupname: &str) -> E2eResult<Option<Element>> {
        let css = format!(".group-container button[data-groupname={}]", css_string(groupname));
        Ok(self.session.find_all(&css).await?.into_iter().next())
    }

    pub async fn has_groupname(&self, groupname: &str) -> E2eResult<bool> {
        Ok(self.group_button(groupname).await?.is_some())
    }

    pub async fn select_group(&self, groupname: &str) -> E2eResult<()> {
        let btn = self
            .group_button(groupname)
            .await?
            .ok_or_else(|| E2eError::NotFound(format!("no group with name {groupname}")))?;
        btn.click().await?;
        Ok(())
    }

    pub async fn enter_groupname(&self, groupname: &str) -> E2eResult<()> {
        let input = self.session.wait_for(r#"input[type="text"]"#).await?;
        replace_text(&input, groupname).await
    }

    /// Submit the create form; the server responds with the new group's
    /// edit page
    pub async fn create_group(&self, groupname: &str) -> E2eResult<()> {
        self.enter_groupname(groupname).await?;
        self.session
            .find(r#"input[value="Create"]"#)
            .await?
            .click()
            .await?;
        Ok(())
    }
}

/// Group edit page: name plus one checkbox per security capability
pub struct GroupEditPage<'a> {
    session: &'a Session,
}

impl<'a> GroupEditPage<'a> {
    pub const HEADING: &'static str = "Edit group";

    pub async fn from_session(session: &'a Session) -> E2eResult<Option<Self>> {
        session.wait_save().await?;
        Ok(has_heading(session, Self::HEADING)
            .await?
            .then(|| Self { session }))
    }

    async fn groupname_input(&self) -> E2eResult<Element> {
        self.session.wait_for(r#"input[type="text"]"#).await
    }

    pub async fn groupname(&self) -> E2eResult<String> {
        Ok(self
            .groupname_input()
            .await?
            .prop("value")
            .await?
            .unwrap_or_default())
    }

    pub async fn set_groupname(&self, groupname: &str) -> E2eResult<()> {
        replace_text(&self.groupname_input().await?, groupname).await
    }

    /// Checkbox for a capability labelled `app.name`
    async fn capability_checkbox(&self, key: &str) -> E2eResult<Element> {
        let label = self
            .session
            .find_by_text("label", |text| text == key)
            .await?
            .ok_or_else(|| E2eError::NotFound(format!("no capability {key}")))?;

        Ok(label.find(Locator::Css(r#"input[type="checkbox"]"#)).await?)
    }

    pub async fn has_capability(&self, key: &str) -> E2eResult<bool> {
        let cbox = self.capability_checkbox(key).await?;
        self.session.element_property_flag(&cbox, "checked").await
    }

    /// Every capability on the page and whether the group holds it
    pub async fn capabilities(&self) -> E2eResult<BTreeMap<String, bool>> {
        let mut caps = BTreeMap::new();
        for label in self.session.find_all("label").await? {
            let boxes = label.find_all(Locator::Css(r#"input[type="checkbox"]"#)).await?;
            let Some(cbox) = boxes.into_iter().next() else {
                continue;
            };
            let checked = self.session.element_property_flag(&cbox, "checked").await?;
            caps.insert(label.text().await?, checked);
        }
        Ok(caps)
    }

    pub async fn toggle_capability(&self, key: &str) -> E2eResult<()> {
        self.capability_checkbox(key).await?.click().await?;
        Ok(())
    }

    pub async fn set_capability(&self, key: &str, granted: bool) -> E2eResult<()> {
        if self.has_capability(key).await? != granted {
            self.toggle_capability(key).await?;
        }
        Ok(())
    }

    pub async fn wait_save(&self) -> E2eResult<()> {
        self.session.wait_save().await
    }
}
