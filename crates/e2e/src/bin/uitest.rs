//! UI test runner entry point
//!
//! Brings up the application and a browser, then runs every scenario
//! against them. Run with: cargo run --package bassline-e2e --bin bassline-uitest

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bassline_e2e::config::{default_data_dir, DATA_DIR_VAR};
use bassline_e2e::runner::Filter;
use bassline_e2e::session::Browser;
use bassline_e2e::{scenarios, E2eError, E2eResult, Site, SiteConfig, TestRunner};

#[derive(Parser, Debug)]
#[command(name = "bassline-uitest")]
#[command(about = "Browser tests for the Bassline admin UI")]
#[command(after_help = "Environment: TEST_BASE_URI (required), WEBDRIVER_URL, BASSLINE_ROOT, DATA_DIR, PHP")]
struct Args {
    /// WebDriver server address (overrides WEBDRIVER_URL)
    #[arg(long)]
    webdriver_url: Option<String>,

    /// Application checkout (overrides BASSLINE_ROOT)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Data directory wiped before the run (overrides DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// PHP interpreter (overrides PHP)
    #[arg(long)]
    php: Option<PathBuf>,

    /// Browser to use (chrome, firefox)
    #[arg(long, default_value = "chrome")]
    browser: Browser,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Seconds to wait for an autosave to finish
    #[arg(long, default_value = "10")]
    save_timeout: u64,

    /// Run only scenarios in this suite (login, groups, users, ...)
    #[arg(short, long)]
    suite: Option<String>,

    /// Run only scenarios whose name contains this
    #[arg(short, long)]
    name: Option<String>,

    /// List scenarios and exit
    #[arg(long)]
    list: bool,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.list {
        for scenario in scenarios::all() {
            println!("{}", scenario.full_name());
        }
        return;
    }

    // Nothing may start before the configuration is known
    let config = match build_config(&args, |key| std::env::var(key).ok()) {
        Ok(config) => config,
        Err(E2eError::MissingEnv(var)) => {
            eprintln!("Must specify {var} environment variable");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Run async main
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args, config)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

/// Environment first, then command line flags on top
fn build_config<F>(args: &Args, lookup: F) -> E2eResult<SiteConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let data_dir_from_env = lookup(DATA_DIR_VAR).is_some();
    let mut config = SiteConfig::from_lookup(&lookup)?.browser(args.browser);

    if let Some(root) = &args.root {
        config.root_dir = root.clone();
        if !data_dir_from_env {
            config.data_dir = default_data_dir(root);
        }
    }
    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(php) = &args.php {
        config.php = php.clone();
    }
    if let Some(url) = &args.webdriver_url {
        config.session.webdriver_url = url.clone();
    }

    config.server_log = Some(args.output.join("server.log"));
    config.session.headless = !args.headed;
    config.session.save_timeout = Duration::from_secs(args.save_timeout);

    Ok(config)
}

async fn async_main(args: Args, config: SiteConfig) -> E2eResult<bool> {
    std::fs::create_dir_all(&args.output)?;

    let site = Site::start(config).await?;
    let runner = TestRunner::new(scenarios::all(), &args.output);

    let filter = Filter {
        suite: args.suite,
        name: args.name,
    };
    let results = runner.run(&site, &filter).await;

    let written = runner.write_results(&results);

    info!("Shutting down");
    close_after_report(written, site.close()).await?;

    Ok(results.success())
}

/// Await `close` whatever happened to the report; the report error wins
async fn close_after_report<T, Fut>(written: E2eResult<T>, close: Fut) -> E2eResult<()>
where
    Fut: Future<Output = E2eResult<()>>,
{
    let closed = close.await;
    written?;
    closed
}
