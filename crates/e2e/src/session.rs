//! WebDriver session - one browser driven serially for the whole run

use std::time::Duration;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};
use crate::wait::{self, ReadinessProbe, WaitOptions, DEFAULT_TIMEOUT};

/// Form that carries the busy marker on autosave pages.
pub const AUTOSAVE_SELECTOR: &str = ".autosave";

/// Dataset key of `data-is-busy`.
pub const BUSY_DATASET_KEY: &str = "isBusy";

const HAS_DATA_ATTRIBUTE_JS: &str = r#"
const [selector, key] = arguments;
const el = document.querySelector(selector);
return !!el && (key in el.dataset);
"#;

const PROPERTY_FLAG_JS: &str = r#"
const [selector, property] = arguments;
const el = document.querySelector(selector);
return !!el && !!el[property];
"#;

const ELEMENT_PROPERTY_FLAG_JS: &str = r#"
const [el, property] = arguments;
return !!el && !!el[property];
"#;

const CALL_ELEMENT_FN_JS: &str = r#"
const [selector, method, ...args] = arguments;
const el = document.querySelector(selector);
if (!el || typeof el[method] !== 'function') return false;
el[method](...args);
return true;
"#;

const CALL_WINDOW_FN_JS: &str = r#"
const [name, ...args] = arguments;
if (typeof window[name] !== 'function') return false;
window[name](...args);
return true;
"#;

/// Browser to request from the WebDriver server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chrome,
    Firefox,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
        }
    }

    /// W3C capabilities for a new session
    pub fn capabilities(&self, headless: bool) -> Capabilities {
        let mut caps = Capabilities::new();
        caps.insert("browserName".to_string(), json!(self.as_str()));

        if headless {
            match self {
                Browser::Chrome => {
                    caps.insert(
                        "goog:chromeOptions".to_string(),
                        json!({ "args": ["--headless=new", "--no-sandbox", "--disable-gpu"] }),
                    );
                }
                Browser::Firefox => {
                    caps.insert(
                        "moz:firefoxOptions".to_string(),
                        json!({ "args": ["-headless"] }),
                    );
                }
            }
        }

        caps
    }
}

impl std::str::FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Browser::Chrome),
            "firefox" => Ok(Browser::Firefox),
            other => Err(format!("unsupported browser '{other}'")),
        }
    }
}

/// Configuration for opening a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Address of the WebDriver server (chromedriver, geckodriver, grid)
    pub webdriver_url: String,

    pub browser: Browser,

    pub headless: bool,

    /// Bound for element lookups that wait for the element to render
    pub element_timeout: Duration,

    /// Bound for autosave readiness waits
    pub save_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            browser: Browser::Chrome,
            headless: true,
            element_timeout: DEFAULT_TIMEOUT,
            save_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A live connection to one browser instance
pub struct Session {
    client: Client,
    element_timeout: Duration,
    save_timeout: Duration,
}

impl Session {
    /// Open a new browser session on the configured WebDriver server
    pub async fn connect(config: &SessionConfig) -> E2eResult<Self> {
        info!(
            "Opening {} session on {}",
            config.browser.as_str(),
            config.webdriver_url
        );

        let client = ClientBuilder::native()
            .capabilities(config.browser.capabilities(config.headless))
            .connect(&config.webdriver_url)
            .await?;

        Ok(Self::from_client(client, config))
    }

    /// Wrap an already connected client
    pub fn from_client(client: Client, config: &SessionConfig) -> Self {
        Self {
            client,
            element_timeout: config.element_timeout,
            save_timeout: config.save_timeout,
        }
    }

    pub fn save_timeout(&self) -> Duration {
        self.save_timeout
    }

    pub async fn goto(&self, url: &str) -> E2eResult<()> {
        debug!("goto {}", url);
        self.client.goto(url).await?;
        Ok(())
    }

    pub async fn current_url(&self) -> E2eResult<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    pub async fn refresh(&self) -> E2eResult<()> {
        debug!("refresh");
        self.client.refresh().await?;
        Ok(())
    }

    /// Find an element that must already be rendered
    pub async fn find(&self, css: &str) -> E2eResult<Element> {
        Ok(self.client.find(Locator::Css(css)).await?)
    }

    /// All elements matching `css`; empty when nothing matches
    pub async fn find_all(&self, css: &str) -> E2eResult<Vec<Element>> {
        Ok(self.client.find_all(Locator::Css(css)).await?)
    }

    /// All anchors whose text is exactly `text`
    pub async fn find_links(&self, text: &str) -> E2eResult<Vec<Element>> {
        Ok(self.client.find_all(Locator::LinkText(text)).await?)
    }

    /// Find an element, waiting up to the element timeout for it to render
    pub async fn wait_for(&self, css: &str) -> E2eResult<Element> {
        let options = WaitOptions::with_timeout(self.element_timeout);
        wait::poll_until(&format!("element '{css}'"), options, || async move {
            Ok::<_, E2eError>(!self.find_all(css).await?.is_empty())
        })
        .await?;

        self.find(css).await
    }

    /// Rendered text of every element matching `css`
    pub async fn texts(&self, css: &str) -> E2eResult<Vec<String>> {
        let mut texts = Vec::new();
        for elem in self.find_all(css).await? {
            texts.push(elem.text().await?);
        }
        Ok(texts)
    }

    /// Text of every top-level heading in the document
    pub async fn headings(&self) -> E2eResult<Vec<String>> {
        self.texts("h1").await
    }

    /// First element matching `css` whose text satisfies `pred`
    pub async fn find_by_text<F>(&self, css: &str, pred: F) -> E2eResult<Option<Element>>
    where
        F: Fn(&str) -> bool,
    {
        for elem in self.find_all(css).await? {
            if pred(&elem.text().await?) {
                return Ok(Some(elem));
            }
        }
        Ok(None)
    }

    /// Whether the first element matching `selector` has `key` in its
    /// dataset. A missing element reads as `false`.
    pub async fn has_data_attribute(&self, selector: &str, key: &str) -> E2eResult<bool> {
        self.bool_script(HAS_DATA_ATTRIBUTE_JS, vec![json!(selector), json!(key)])
            .await
    }

    /// Truthiness of a DOM property (e.g. `checked`) on the first element
    /// matching `selector`. A missing element reads as `false`.
    pub async fn property_flag(&self, selector: &str, property: &str) -> E2eResult<bool> {
        self.bool_script(PROPERTY_FLAG_JS, vec![json!(selector), json!(property)])
            .await
    }

    /// Truthiness of a DOM property on an element already located
    pub async fn element_property_flag(&self, elem: &Element, property: &str) -> E2eResult<bool> {
        let elem = serde_json::to_value(elem)?;
        self.bool_script(ELEMENT_PROPERTY_FLAG_JS, vec![elem, json!(property)])
            .await
    }

    /// Invoke a method on the first element matching `selector`
    pub async fn call_element_fn(&self, selector: &str, method: &str, args: Vec<Value>) -> E2eResult<()> {
        let mut script_args = vec![json!(selector), json!(method)];
        script_args.extend(args);

        if self.bool_script(CALL_ELEMENT_FN_JS, script_args).await? {
            Ok(())
        } else {
            Err(E2eError::NotFound(format!("{selector} with method {method}")))
        }
    }

    /// Invoke a page-provided hook installed on `window`
    pub async fn call_window_fn(&self, name: &str, args: Vec<Value>) -> E2eResult<()> {
        let mut script_args = vec![json!(name)];
        script_args.extend(args);

        if self.bool_script(CALL_WINDOW_FN_JS, script_args).await? {
            Ok(())
        } else {
            Err(E2eError::NotFound(format!("window.{name}")))
        }
    }

    async fn bool_script(&self, script: &str, args: Vec<Value>) -> E2eResult<bool> {
        match self.client.execute(script, args).await? {
            Value::Bool(b) => Ok(b),
            other => Err(E2eError::InvalidAttribute {
                name: "script result".to_string(),
                value: other.to_string(),
            }),
        }
    }

    /// Block until the page's autosave indicator clears
    pub async fn wait_save(&self) -> E2eResult<()> {
        wait::wait_until_ready(self, self.save_timeout).await
    }

    /// End the WebDriver session and close the browser
    pub async fn close(self) -> E2eResult<()> {
        info!("Closing browser session");
        self.client.close().await?;
        Ok(())
    }
}

#[async_trait]
impl ReadinessProbe for Session {
    async fn is_busy(&self) -> E2eResult<bool> {
        self.has_data_attribute(AUTOSAVE_SELECTOR, BUSY_DATASET_KEY).await
    }
}

/// Choose the `<option>` of a `<select>` whose visible text is `text`
pub async fn select_by_text(select: &Element, text: &str) -> E2eResult<()> {
    debug!("select option '{}'", text);
    select.select_by_label(text).await?;
    Ok(())
}

/// Visible text of every option of a `<select>`
pub async fn option_texts(select: &Element) -> E2eResult<Vec<String>> {
    let mut texts = Vec::new();
    for opt in select.find_all(Locator::Css("option")).await? {
        texts.push(opt.text().await?);
    }
    Ok(texts)
}

/// Visible text of the first selected option, if any
pub async fn selected_option_text(select: &Element) -> E2eResult<Option<String>> {
    for opt in select.find_all(Locator::Css("option")).await? {
        if opt.is_selected().await? {
            return Ok(Some(opt.text().await?));
        }
    }
    Ok(None)
}

/// Replace the contents of a text input
pub async fn replace_text(input: &Element, text: &str) -> E2eResult<()> {
    input.clear().await?;
    input.send_keys(text).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_from_str() {
        assert_eq!("chrome".parse::<Browser>().unwrap(), Browser::Chrome);
        assert_eq!("Chromium".parse::<Browser>().unwrap(), Browser::Chrome);
        assert_eq!("firefox".parse::<Browser>().unwrap(), Browser::Firefox);
        assert!("webkit".parse::<Browser>().is_err());
    }

    #[test]
    fn test_headless_chrome_capabilities() {
        let caps = Browser::Chrome.capabilities(true);
        assert_eq!(caps["browserName"], "chrome");

        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));
        assert!(!caps.contains_key("moz:firefoxOptions"));
    }

    #[test]
    fn test_headed_firefox_has_no_options() {
        let caps = Browser::Firefox.capabilities(false);
        assert_eq!(caps["browserName"], "firefox");
        assert!(!caps.contains_key("moz:firefoxOptions"));
    }

    #[test]
    fn test_default_session_config() {
        let config = SessionConfig::default();
        assert_eq!(config.webdriver_url, "http://localhost:4444");
        assert!(config.headless);
        assert_eq!(config.save_timeout, DEFAULT_TIMEOUT);
    }
}
