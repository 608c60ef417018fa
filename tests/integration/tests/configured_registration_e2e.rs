use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use anyhow::bail;
use async_trait::async_trait;
use viewpoint_suite::{
    create_configured_test, register_suite, test_body, Browser, BrowsingContext, ContextOptions,
    DeviceTag, LocationTag, Page, StrategyKind, TestBody, TestCase, TestFixtures, TestFramework,
    TestSuite,
};

const FRAMEWORK_DEFAULT_VIEWPORT: (u32, u32) = (1280, 720);

#[derive(Debug, Default)]
struct BrowserLog {
    contexts_opened: usize,
    context_options: Vec<ContextOptions>,
    events: Vec<String>,
}

struct FakePage {
    viewport: Option<(u32, u32)>,
    log: Arc<Mutex<BrowserLog>>,
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str) -> anyhow::Result<()> {
        self.log
            .lock()
            .expect("lock")
            .events
            .push(format!("goto:{url}"));
        Ok(())
    }

    async fn viewport_size(&self) -> Option<(u32, u32)> {
        self.viewport
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.log
            .lock()
            .expect("lock")
            .events
            .push("page_close".to_string());
        Ok(())
    }
}

struct FakeContext {
    options: ContextOptions,
    log: Arc<Mutex<BrowserLog>>,
}

#[async_trait]
impl BrowsingContext for FakeContext {
    async fn new_page(&self) -> anyhow::Result<Arc<dyn Page>> {
        Ok(Arc::new(FakePage {
            viewport: Some(self.options.viewport.unwrap_or(FRAMEWORK_DEFAULT_VIEWPORT)),
            log: Arc::clone(&self.log),
        }))
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.log
            .lock()
            .expect("lock")
            .events
            .push("context_close".to_string());
        Ok(())
    }
}

struct FakeBrowser {
    log: Arc<Mutex<BrowserLog>>,
}

impl FakeBrowser {
    fn new() -> (Arc<Self>, Arc<Mutex<BrowserLog>>) {
        let log = Arc::new(Mutex::new(BrowserLog::default()));
        (
            Arc::new(Self {
                log: Arc::clone(&log),
            }),
            log,
        )
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn new_context(
        &self,
        options: ContextOptions,
    ) -> anyhow::Result<Arc<dyn BrowsingContext>> {
        {
            let mut log = self.log.lock().expect("lock");
            log.contexts_opened += 1;
            log.context_options.push(options.clone());
        }
        Ok(Arc::new(FakeContext {
            options,
            log: Arc::clone(&self.log),
        }))
    }
}

struct DeclaredTest {
    name: String,
    body: Option<TestBody>,
}

#[derive(Default)]
struct RecordingFramework {
    declared: Vec<DeclaredTest>,
}

impl TestFramework for RecordingFramework {
    fn declare_test(&mut self, name: &str, body: TestBody) {
        self.declared.push(DeclaredTest {
            name: name.to_string(),
            body: Some(body),
        });
    }

    fn declare_skipped_test(&mut self, name: &str) {
        self.declared.push(DeclaredTest {
            name: name.to_string(),
            body: None,
        });
    }
}

impl RecordingFramework {
    /// Runs a declared body against framework-default fixtures, the way the
    /// host framework would. Skipped declarations have no body to run.
    async fn run_declared(&self, index: usize, browser: &Arc<FakeBrowser>) -> anyhow::Result<()> {
        let declared = &self.declared[index];
        let body = declared
            .body
            .as_ref()
            .unwrap_or_else(|| panic!("test '{}' was declared skipped", declared.name));
        let log = Arc::clone(&browser.log);
        let context: Arc<dyn BrowsingContext> = Arc::new(FakeContext {
            options: ContextOptions::default(),
            log: Arc::clone(&log),
        });
        let page: Arc<dyn Page> = Arc::new(FakePage {
            viewport: Some(FRAMEWORK_DEFAULT_VIEWPORT),
            log,
        });
        let fixtures = TestFixtures {
            page,
            context,
            browser: Arc::clone(browser) as Arc<dyn Browser>,
        };
        body(fixtures).await
    }
}

#[tokio::test]
async fn integration_mobile_tagged_case_runs_in_a_375_by_667_context() {
    let (browser, log) = FakeBrowser::new();
    let mut framework = RecordingFramework::default();

    let case = TestCase::new(
        "mobileLoginTest",
        test_body(|fixtures: TestFixtures| async move {
            let viewport = fixtures.page.viewport_size().await;
            if viewport != Some((375, 667)) {
                bail!("unexpected viewport {viewport:?}");
            }
            fixtures.page.goto("https://example.com/login").await
        }),
    )
    .expect("case")
    .with_device(DeviceTag::Mobile);

    let registered = create_configured_test(&mut framework, &case, "mobile login test");
    assert_eq!(registered.strategy, StrategyKind::DeviceContext);

    framework
        .run_declared(0, &browser)
        .await
        .expect("mobile body should pass");

    let log = log.lock().expect("lock");
    assert_eq!(log.contexts_opened, 1);
    let options = &log.context_options[0];
    assert_eq!(options.viewport, Some((375, 667)));
    assert!(options.is_mobile);
    assert!(options.has_touch);
    assert_eq!(
        log.events
            .iter()
            .filter(|event| *event == "context_close")
            .count(),
        1
    );
}

#[tokio::test]
async fn integration_location_tagged_case_grants_geolocation_and_closes_page_first() {
    let (browser, log) = FakeBrowser::new();
    let mut framework = RecordingFramework::default();

    let case = TestCase::new(
        "londonWeatherTest",
        test_body(|_fixtures| async { Ok(()) }),
    )
    .expect("case")
    .with_location(LocationTag::London);

    create_configured_test(&mut framework, &case, "london weather test");
    framework
        .run_declared(0, &browser)
        .await
        .expect("london body should pass");

    let log = log.lock().expect("lock");
    let options = &log.context_options[0];
    let geolocation = options.geolocation.as_ref().expect("geolocation");
    assert_eq!(geolocation.latitude, 51.5074);
    assert_eq!(geolocation.longitude, -0.1278);
    assert_eq!(options.permissions, vec!["geolocation".to_string()]);

    let closes: Vec<&str> = log
        .events
        .iter()
        .filter(|event| event.ends_with("close"))
        .map(String::as_str)
        .collect();
    assert_eq!(closes, vec!["page_close", "context_close"]);
}

#[tokio::test]
async fn regression_failing_device_body_still_closes_its_context() {
    let (browser, log) = FakeBrowser::new();
    let mut framework = RecordingFramework::default();

    let case = TestCase::new(
        "desktopDashboardTest",
        test_body(|_fixtures| async { bail!("dashboard widget missing") }),
    )
    .expect("case")
    .with_device(DeviceTag::Desktop);

    create_configured_test(&mut framework, &case, "desktop dashboard test");
    let error = framework
        .run_declared(0, &browser)
        .await
        .expect_err("body failure should propagate");
    assert!(error.to_string().contains("dashboard widget missing"));

    let log = log.lock().expect("lock");
    assert_eq!(
        log.events
            .iter()
            .filter(|event| *event == "context_close")
            .count(),
        1
    );
}

#[tokio::test]
async fn regression_failing_location_body_closes_page_then_context() {
    let (browser, log) = FakeBrowser::new();
    let mut framework = RecordingFramework::default();

    let case = TestCase::new(
        "newyorkCheckoutTest",
        test_body(|_fixtures| async { bail!("checkout button missing") }),
    )
    .expect("case")
    .with_location(LocationTag::NewYork);

    create_configured_test(&mut framework, &case, "newyork checkout test");
    let error = framework
        .run_declared(0, &browser)
        .await
        .expect_err("body failure should propagate");
    assert!(error.to_string().contains("checkout button missing"));

    let log = log.lock().expect("lock");
    let closes: Vec<&str> = log
        .events
        .iter()
        .filter(|event| event.ends_with("close"))
        .map(String::as_str)
        .collect();
    assert_eq!(closes, vec!["page_close", "context_close"]);
}

#[tokio::test]
async fn functional_skip_tagged_case_never_executes_its_body() {
    let (_browser, _log) = FakeBrowser::new();
    let mut framework = RecordingFramework::default();

    let executed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&executed);
    let case = TestCase::new(
        "temporarilyDisabledTest",
        test_body(move |_fixtures| {
            let flag = Arc::clone(&flag);
            async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        }),
    )
    .expect("case")
    .with_skip();

    let registered = create_configured_test(&mut framework, &case, "temporarily disabled test");

    assert_eq!(registered.strategy, StrategyKind::Skip);
    assert_eq!(framework.declared.len(), 1);
    assert_eq!(framework.declared[0].name, "temporarily disabled test");
    assert!(
        framework.declared[0].body.is_none(),
        "skipped declaration must carry no runnable body"
    );
    assert!(!executed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn integration_untagged_case_registers_once_as_t1_on_default_fixtures() {
    let (browser, log) = FakeBrowser::new();
    let mut framework = RecordingFramework::default();

    let case = TestCase::new(
        "t1",
        test_body(|fixtures: TestFixtures| async move {
            let viewport = fixtures.page.viewport_size().await;
            if viewport != Some(FRAMEWORK_DEFAULT_VIEWPORT) {
                bail!("default fixtures should be untouched, saw {viewport:?}");
            }
            Ok(())
        }),
    )
    .expect("case");

    let registered = create_configured_test(&mut framework, &case, "t1");

    assert_eq!(framework.declared.len(), 1);
    assert_eq!(framework.declared[0].name, "t1");
    assert_eq!(registered.strategy, StrategyKind::Default);

    framework
        .run_declared(0, &browser)
        .await
        .expect("default body should pass");

    // The registrar must not have asked the browser for any extra context.
    assert_eq!(log.lock().expect("lock").contexts_opened, 0);
}

#[tokio::test]
async fn functional_responsive_suite_registers_in_order_with_derived_names() {
    let (browser, log) = FakeBrowser::new();
    let mut framework = RecordingFramework::default();

    let suite = TestSuite::new("responsive")
        .with_case(
            TestCase::new(
                "mobileLoginTest",
                test_body(|fixtures: TestFixtures| async move {
                    match fixtures.page.viewport_size().await {
                        Some((375, 667)) => Ok(()),
                        other => bail!("mobile viewport mismatch: {other:?}"),
                    }
                }),
            )
            .expect("case")
            .with_device(DeviceTag::Mobile),
        )
        .with_case(
            TestCase::new(
                "desktopDashboardTest",
                test_body(|fixtures: TestFixtures| async move {
                    match fixtures.page.viewport_size().await {
                        Some((1920, 1080)) => Ok(()),
                        other => bail!("desktop viewport mismatch: {other:?}"),
                    }
                }),
            )
            .expect("case")
            .with_device(DeviceTag::Desktop),
        )
        .with_case(
            TestCase::new(
                "skippedTest",
                test_body(|_fixtures| async { bail!("broken feature, must never run") }),
            )
            .expect("case")
            .with_skip(),
        )
        .with_case(
            TestCase::new(
                "defaultConfigTest",
                test_body(|fixtures: TestFixtures| async move {
                    match fixtures.page.viewport_size().await {
                        Some((1280, 720)) => Ok(()),
                        other => bail!("default viewport mismatch: {other:?}"),
                    }
                }),
            )
            .expect("case"),
        );

    let registered = register_suite(&mut framework, &suite);

    let names: Vec<&str> = registered.iter().map(|test| test.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "mobile login test",
            "desktop dashboard test",
            "skipped test",
            "default config test"
        ]
    );

    framework
        .run_declared(0, &browser)
        .await
        .expect("mobile case should pass");
    framework
        .run_declared(1, &browser)
        .await
        .expect("desktop case should pass");
    assert!(framework.declared[2].body.is_none());
    framework
        .run_declared(3, &browser)
        .await
        .expect("default case should pass");

    let log = log.lock().expect("lock");
    assert_eq!(log.contexts_opened, 2);
    assert_eq!(log.context_options[0].viewport, Some((375, 667)));
    assert_eq!(log.context_options[1].viewport, Some((1920, 1080)));
    assert_eq!(
        log.events
            .iter()
            .filter(|event| *event == "context_close")
            .count(),
        2
    );
}
