//! The site fixture: application server plus one browser session
//!
//! A [`Site`] is created once per run and handed to every scenario by
//! reference. Scenarios share it serially, so each one starts by logging out
//! (see [`Fixture::reset`](crate::runner::Fixture::reset)).

use async_trait::async_trait;
use tracing::info;

use crate::bootstrap;
use crate::config::SiteConfig;
use crate::error::{E2eError, E2eResult};
use crate::pages::{
    AdminPage, AuthConfigEditPage, ColorPaletteSelectPage, GroupSelectPage, LoginPage,
    ThemeSelectPage, UserSelectPage,
};
use crate::runner::Fixture;
use crate::server::{ServerConfig, ServerHandle};
use crate::session::Session;

/// Group every fixture user belongs to
pub const TEST_GROUP: &str = "test_group";

/// Unprivileged user created during setup
pub const TEST_USER: &str = "test";

/// User created by database init with every capability
pub const ADMIN_USER: &str = "admin";

pub struct Site {
    config: SiteConfig,
    session: Session,
    server: Option<ServerHandle>,
}

impl Site {
    /// Reset state, start the server, open a browser and seed fixture users
    pub async fn start(config: SiteConfig) -> E2eResult<Self> {
        bootstrap::prepare(&config).await?;
        let server = ServerHandle::spawn(ServerConfig::php_dev_server(&config)?).await?;
        let session = Session::connect(&config.session).await?;

        let site = Self {
            config,
            session,
            server: Some(server),
        };
        if let Err(e) = site.setup().await {
            let _ = site.close().await;
            return Err(e);
        }

        info!("Site ready at {}", site.config.base_uri);
        Ok(site)
    }

    async fn setup(&self) -> E2eResult<()> {
        self.log_in_with_nonce(ADMIN_USER).await?;
        self.create_group(TEST_GROUP).await?;
        self.create_user(TEST_USER, TEST_GROUP).await?;
        self.log_out().await
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn uri(&self, path: &str) -> String {
        format!("{}{}", self.config.base_uri, path)
    }

    pub async fn current_uri(&self) -> E2eResult<String> {
        self.session.current_url().await
    }

    /// Reload the current page
    pub async fn reload(&self) -> E2eResult<()> {
        self.session.refresh().await
    }

    pub async fn goto_login_page(&self) -> E2eResult<LoginPage<'_>> {
        self.session.goto(&self.uri("/login/")).await?;
        Ok(LoginPage::new(&self.session))
    }

    pub async fn click_login_link(&self) -> E2eResult<()> {
        let link = self
            .session
            .find_all(".login")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| E2eError::NotFound("login link".to_string()))?;
        link.click().await?;
        Ok(())
    }

    pub async fn goto_hello_page(&self) -> E2eResult<()> {
        self.session.goto(&self.uri("/hello/")).await
    }

    pub async fn goto_admin_page(&self) -> E2eResult<Option<AdminPage<'_>>> {
        self.session.goto(&self.uri("/site/admin/")).await?;
        AdminPage::from_session(&self.session).await
    }

    pub async fn goto_user_select_page(&self) -> E2eResult<Option<UserSelectPage<'_>>> {
        self.session.goto(&self.uri("/site/admin/users/")).await?;
        UserSelectPage::from_session(&self.session).await
    }

    pub async fn goto_group_select_page(&self) -> E2eResult<Option<GroupSelectPage<'_>>> {
        self.session.goto(&self.uri("/site/admin/groups/")).await?;
        GroupSelectPage::from_session(&self.session).await
    }

    pub async fn goto_auth_config_page(&self) -> E2eResult<Option<AuthConfigEditPage<'_>>> {
        self.session.goto(&self.uri("/site/admin/auth_config/")).await?;
        AuthConfigEditPage::from_session(&self.session).await
    }

    pub async fn goto_color_palette_select_page(&self) -> E2eResult<Option<ColorPaletteSelectPage<'_>>> {
        self.session.goto(&self.uri("/site/admin/color_palette/")).await?;
        ColorPaletteSelectPage::from_session(&self.session).await
    }

    pub async fn goto_theme_select_page(&self) -> E2eResult<Option<ThemeSelectPage<'_>>> {
        self.session.goto(&self.uri("/site/admin/theme/")).await?;
        ThemeSelectPage::from_session(&self.session).await
    }

    /// Name shown in the page header, `None` when nobody is logged in
    pub async fn current_username(&self) -> E2eResult<Option<String>> {
        match self.session.find_all(".username").await?.into_iter().next() {
            Some(elem) => Ok(Some(elem.text().await?)),
            None => Ok(None),
        }
    }

    pub async fn log_out(&self) -> E2eResult<()> {
        self.session.goto(&self.uri("/logout/")).await
    }

    /// Log in through the login form
    pub async fn log_in_as_user(&self, username: &str) -> E2eResult<()> {
        let on_login_page = self.current_uri().await?.ends_with("/login/");
        let page = if on_login_page {
            LoginPage::new(&self.session)
        } else {
            self.goto_login_page().await?
        };
        page.log_in_as_user(username).await
    }

    /// Log in through the nonce backdoor, skipping the login form
    pub async fn log_in_with_nonce(&self, username: &str) -> E2eResult<()> {
        let nonce = bootstrap::issue_nonce(&self.config, username).await?;
        let uri = bootstrap::nonce_login_uri(&self.config.base_uri, &nonce)?;
        info!("Logging in as {} with nonce", username);
        self.session.goto(&uri).await
    }

    pub async fn create_user(&self, username: &str, groupname: &str) -> E2eResult<()> {
        let page = self
            .goto_user_select_page()
            .await?
            .ok_or_else(|| E2eError::AssertionFailed("user page not accessible".to_string()))?;
        page.create_user(username, groupname).await
    }

    pub async fn create_group(&self, groupname: &str) -> E2eResult<()> {
        let page = self
            .goto_group_select_page()
            .await?
            .ok_or_else(|| E2eError::AssertionFailed("group page not accessible".to_string()))?;
        page.create_group(groupname).await
    }

    /// Close the browser and stop the server
    pub async fn close(mut self) -> E2eResult<()> {
        let server = self.server.take();
        let result = self.session.close().await;

        if let Some(mut server) = server {
            server.shutdown().await?;
        }
        result
    }
}

#[async_trait]
impl Fixture for Site {
    async fn reset(&self) -> E2eResult<()> {
        self.log_out().await
    }
}
