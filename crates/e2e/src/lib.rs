//! Bassline E2E Test Framework
//!
//! This crate drives the Bassline admin UI through a WebDriver browser:
//! - Resets the data directory and initializes the database
//! - Spawns the PHP dev server as a subprocess
//! - Logs users in through the nonce backdoor or the login form
//! - Wraps every admin page in a page object resolved from its heading
//! - Waits out background autosaves before reading persisted state
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   bassline-uitest (binary)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner<Site>                                           │
//! │    ├── Fixture::reset()  (log out before each scenario)     │
//! │    ├── run scenarios::all() sequentially                    │
//! │    └── write_results() -> test-results.json                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Site (fixture, passed by reference)                        │
//! │    ├── bootstrap: reset data dir, init db, issue nonce      │
//! │    ├── ServerHandle: php -S <netloc> test/server.php        │
//! │    └── Session: one fantoccini client                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  pages::*  from_session() -> Option<Page>                   │
//! │  wait::wait_until_ready(probe, timeout)                     │
//! │    └── polls `.autosave[data-is-busy]` until it clears      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod pages;
pub mod runner;
pub mod scenarios;
pub mod server;
pub mod session;
pub mod site;
pub mod wait;

pub use config::SiteConfig;
pub use error::{E2eError, E2eResult};
pub use runner::TestRunner;
pub use session::Session;
pub use site::Site;
pub use wait::{wait_until_ready, ReadinessProbe};
