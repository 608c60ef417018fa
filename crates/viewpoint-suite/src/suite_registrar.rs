use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::suite_catalog::{DeviceConfig, LocationConfig, GEOLOCATION_PERMISSION};
use crate::suite_metadata::{TestBody, TestCase, TestMetadata};

/// A page within a browsing context. Implemented by the host framework.
#[async_trait]
pub trait Page: Send + Sync {
    async fn goto(&self, url: &str) -> anyhow::Result<()>;
    async fn viewport_size(&self) -> Option<(u32, u32)>;
    async fn close(&self) -> anyhow::Result<()>;
}

/// An isolated, closable browsing session. Exclusively owned by one test
/// invocation; never shared across tests.
#[async_trait]
pub trait BrowsingContext: Send + Sync {
    async fn new_page(&self) -> anyhow::Result<Arc<dyn Page>>;
    async fn close(&self) -> anyhow::Result<()>;
}

/// Browsing-context factory. Implemented by the host framework.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn new_context(&self, options: ContextOptions) -> anyhow::Result<Arc<dyn BrowsingContext>>;
}

/// Fixtures handed to a test body: the page and context it runs against and
/// the browser they came from.
#[derive(Clone)]
pub struct TestFixtures {
    pub page: Arc<dyn Page>,
    pub context: Arc<dyn BrowsingContext>,
    pub browser: Arc<dyn Browser>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Context-initialization options passed to [`Browser::new_context`].
pub struct ContextOptions {
    pub viewport: Option<(u32, u32)>,
    pub user_agent: Option<String>,
    pub is_mobile: bool,
    pub has_touch: bool,
    pub geolocation: Option<Geolocation>,
    pub permissions: Vec<String>,
}

impl ContextOptions {
    pub fn from_device(config: &DeviceConfig) -> Self {
        Self {
            viewport: Some((config.viewport_width, config.viewport_height)),
            user_agent: Some(config.user_agent.clone()),
            is_mobile: config.is_mobile,
            has_touch: config.has_touch,
            ..Self::default()
        }
    }

    pub fn from_location(config: &LocationConfig) -> Self {
        Self {
            geolocation: Some(Geolocation {
                latitude: config.latitude,
                longitude: config.longitude,
                accuracy: config.accuracy,
            }),
            permissions: vec![GEOLOCATION_PERMISSION.to_string()],
            ..Self::default()
        }
    }
}

/// How a case is materialized into a framework-level test. Strategies are
/// mutually exclusive; the first match in priority order wins.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionStrategy {
    Skip,
    DeviceContext(DeviceConfig),
    LocationContext(LocationConfig),
    Default,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Skip,
    DeviceContext,
    LocationContext,
    Default,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::DeviceContext => "device_context",
            Self::LocationContext => "location_context",
            Self::Default => "default",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ExecutionStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Skip => StrategyKind::Skip,
            Self::DeviceContext(_) => StrategyKind::DeviceContext,
            Self::LocationContext(_) => StrategyKind::LocationContext,
            Self::Default => StrategyKind::Default,
        }
    }
}

/// Handle recording what was requested from the framework for one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredTest {
    pub name: String,
    pub strategy: StrategyKind,
}

/// Test-declaration seam of the host framework. The framework owns
/// execution scheduling, timeouts, and failure reporting for declared
/// bodies; skipped declarations are reported as skipped, never executed.
pub trait TestFramework: Send {
    fn declare_test(&mut self, name: &str, body: TestBody);
    fn declare_skipped_test(&mut self, name: &str);
}

/// Resolves the execution strategy for accumulated metadata. Priority:
/// skip, then device, then location, then default. When both a device and a
/// location fragment are present the device fragment wins and the location
/// fragment is ignored.
pub fn resolve_strategy(metadata: &TestMetadata) -> ExecutionStrategy {
    if metadata.should_skip {
        return ExecutionStrategy::Skip;
    }
    if let Some(device) = &metadata.device_config {
        return ExecutionStrategy::DeviceContext(device.clone());
    }
    if let Some(location) = &metadata.location_config {
        return ExecutionStrategy::LocationContext(location.clone());
    }
    ExecutionStrategy::Default
}

/// Materializes a case into a framework-level test under `test_name`,
/// consulting its accumulated metadata for the execution strategy.
///
/// Body errors are not intercepted here; they surface through the
/// framework's own failure reporting. The device and location wrappers
/// close their context (and, for the location path, the page first) on
/// every exit path, and a cleanup failure never masks a prior body error.
pub fn create_configured_test(
    framework: &mut dyn TestFramework,
    case: &TestCase,
    test_name: &str,
) -> RegisteredTest {
    let strategy = resolve_strategy(case.metadata());
    match &strategy {
        ExecutionStrategy::Skip => framework.declare_skipped_test(test_name),
        ExecutionStrategy::DeviceContext(device) => {
            let body = device_context_body(case.body(), ContextOptions::from_device(device));
            framework.declare_test(test_name, body);
        }
        ExecutionStrategy::LocationContext(location) => {
            let body = location_context_body(case.body(), ContextOptions::from_location(location));
            framework.declare_test(test_name, body);
        }
        ExecutionStrategy::Default => framework.declare_test(test_name, case.body()),
    }
    tracing::debug!(
        test = test_name,
        strategy = strategy.kind().as_str(),
        "registered configured test"
    );
    RegisteredTest {
        name: test_name.to_string(),
        strategy: strategy.kind(),
    }
}

fn device_context_body(body: TestBody, options: ContextOptions) -> TestBody {
    Arc::new(move |fixtures: TestFixtures| {
        let body = Arc::clone(&body);
        let options = options.clone();
        Box::pin(async move {
            let context = fixtures.browser.new_context(options).await?;
            let page = context.new_page().await?;
            let outcome = body(TestFixtures {
                page,
                context: Arc::clone(&context),
                browser: Arc::clone(&fixtures.browser),
            })
            .await;
            let context_close = context.close().await;
            outcome?;
            context_close
        })
    })
}

fn location_context_body(body: TestBody, options: ContextOptions) -> TestBody {
    Arc::new(move |fixtures: TestFixtures| {
        let body = Arc::clone(&body);
        let options = options.clone();
        Box::pin(async move {
            let context = fixtures.browser.new_context(options).await?;
            let page = context.new_page().await?;
            let outcome = body(TestFixtures {
                page: Arc::clone(&page),
                context: Arc::clone(&context),
                browser: Arc::clone(&fixtures.browser),
            })
            .await;
            // Page first, then its context.
            let page_close = page.close().await;
            let context_close = context.close().await;
            outcome?;
            page_close?;
            context_close
        })
    })
}
