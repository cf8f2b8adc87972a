//! Scenario runner: executes scenarios one after another against a shared
//! fixture and collects a result report

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::E2eResult;

/// State shared by every scenario of a run
#[async_trait]
pub trait Fixture: Sync {
    /// Bring the fixture back to a state the next scenario can start from
    async fn reset(&self) -> E2eResult<()>;
}

pub type ScenarioFn<F> = for<'a> fn(&'a F) -> LocalBoxFuture<'a, E2eResult<()>>;

/// A named end-to-end scenario
pub struct Scenario<F> {
    /// Group the scenario belongs to (`login`, `groups`, ...)
    pub suite: &'static str,
    pub name: &'static str,
    pub run: ScenarioFn<F>,
}

impl<F> Scenario<F> {
    pub fn new(suite: &'static str, name: &'static str, run: ScenarioFn<F>) -> Self {
        Self { suite, name, run }
    }

    /// `suite::name`
    pub fn full_name(&self) -> String {
        format!("{}::{}", self.suite, self.name)
    }
}

/// Which scenarios to run
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub suite: Option<String>,
    /// Substring of the full scenario name
    pub name: Option<String>,
}

impl Filter {
    pub fn matches<F>(&self, scenario: &Scenario<F>) -> bool {
        let suite_ok = self.suite.as_deref().map_or(true, |s| s == scenario.suite);
        let name_ok = self
            .name
            .as_deref()
            .map_or(true, |n| scenario.full_name().contains(n));
        suite_ok && name_ok
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running all scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

pub struct TestRunner<F> {
    scenarios: Vec<Scenario<F>>,
    output_dir: PathBuf,
}

impl<F: Fixture> TestRunner<F> {
    pub fn new(scenarios: Vec<Scenario<F>>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            scenarios,
            output_dir: output_dir.into(),
        }
    }

    pub fn scenarios(&self) -> &[Scenario<F>] {
        &self.scenarios
    }

    /// Run the matching scenarios in order. A failing scenario does not
    /// stop the run.
    pub async fn run(&self, fixture: &F, filter: &Filter) -> TestSuiteResult {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        let selected: Vec<&Scenario<F>> = self
            .scenarios
            .iter()
            .filter(|s| {
                let keep = filter.matches(s);
                if !keep {
                    skipped += 1;
                }
                keep
            })
            .collect();

        info!("Running {} scenario(s)...", selected.len());

        for scenario in selected {
            let result = self.run_one(fixture, scenario).await;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        TestSuiteResult {
            total: self.scenarios.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        }
    }

    async fn run_one(&self, fixture: &F, scenario: &Scenario<F>) -> TestResult {
        let name = scenario.full_name();
        let start = Instant::now();
        debug!("Running scenario: {}", name);

        let outcome = match fixture.reset().await {
            Ok(()) => (scenario.run)(fixture).await,
            Err(e) => Err(e),
        };

        TestResult {
            name,
            success: outcome.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
            error: outcome.err().map(|e| e.to_string()),
        }
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        write_results(&self.output_dir, results)
    }
}

/// Write `results` as `test-results.json` under `output_dir`
pub fn write_results(output_dir: &Path, results: &TestSuiteResult) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join("test-results.json");
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::E2eError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        resets: AtomicUsize,
        log: Mutex<Vec<&'static str>>,
        fail_reset: bool,
    }

    #[async_trait]
    impl Fixture for Recorder {
        async fn reset(&self) -> E2eResult<()> {
            self.resets.fetch_add(1, Ordering::SeqCst);
            if self.fail_reset {
                return Err(E2eError::NotFound("logout link".to_string()));
            }
            Ok(())
        }
    }

    fn passes(f: &Recorder) -> LocalBoxFuture<'_, E2eResult<()>> {
        Box::pin(async move {
            f.log.lock().unwrap().push("passes");
            Ok(())
        })
    }

    fn fails(f: &Recorder) -> LocalBoxFuture<'_, E2eResult<()>> {
        Box::pin(async move {
            f.log.lock().unwrap().push("fails");
            Err(E2eError::AssertionFailed("expected admin".to_string()))
        })
    }

    fn runner() -> TestRunner<Recorder> {
        TestRunner::new(
            vec![
                Scenario::new("login", "passes", passes),
                Scenario::new("groups", "fails", fails),
                Scenario::new("groups", "passes_too", passes),
            ],
            "test-results",
        )
    }

    #[tokio::test]
    async fn test_runs_all_in_order_and_resets_each() {
        let fixture = Recorder::default();
        let result = runner().run(&fixture, &Filter::default()).await;

        assert_eq!(result.total, 3);
        assert_eq!(result.passed, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.skipped, 0);
        assert!(!result.success());
        assert_eq!(fixture.resets.load(Ordering::SeqCst), 3);
        assert_eq!(*fixture.log.lock().unwrap(), vec!["passes", "fails", "passes"]);

        let failure = &result.results[1];
        assert_eq!(failure.name, "groups::fails");
        assert!(failure.error.as_deref().unwrap().contains("expected admin"));
    }

    #[tokio::test]
    async fn test_filter_by_suite_and_name() {
        let fixture = Recorder::default();
        let filter = Filter {
            suite: Some("groups".to_string()),
            name: Some("passes".to_string()),
        };

        let result = runner().run(&fixture, &filter).await;

        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 0);
        assert_eq!(result.skipped, 2);
        assert_eq!(result.results[0].name, "groups::passes_too");
        assert!(result.success());
    }

    #[tokio::test]
    async fn test_failed_reset_fails_scenario_without_running_it() {
        let fixture = Recorder {
            fail_reset: true,
            ..Default::default()
        };

        let result = runner().run(&fixture, &Filter::default()).await;

        assert_eq!(result.failed, 3);
        assert!(fixture.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_results() {
        let tmp = tempfile::TempDir::new().unwrap();
        let fixture = Recorder::default();
        let runner = TestRunner::new(
            vec![Scenario::new("login", "passes", passes)],
            tmp.path().join("out"),
        );

        let result = runner.run(&fixture, &Filter::default()).await;
        let path = runner.write_results(&result).unwrap();

        let parsed: TestSuiteResult =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed.passed, 1);
        assert_eq!(parsed.results[0].name, "login::passes");
    }
}
