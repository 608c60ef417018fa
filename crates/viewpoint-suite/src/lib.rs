//! Device and geolocation configuration for browser end-to-end test registration.
//!
//! Test cases carry accumulated configuration fragments (device profile,
//! geolocation profile, skip marker) and are materialized against a pluggable
//! test framework under one of four execution strategies.

pub mod suite_catalog;
pub mod suite_metadata;
pub mod suite_plan;
pub mod suite_registrar;
pub mod suite_scanner;

pub use suite_catalog::{
    device_config, location_config, ConfigTag, DeviceConfig, DeviceTag, LocationConfig,
    LocationTag, GEOLOCATION_PERMISSION,
};
pub use suite_metadata::{test_body, ConfigurationError, TestBody, TestCase, TestMetadata};
pub use suite_registrar::{
    create_configured_test, resolve_strategy, Browser, BrowsingContext, ContextOptions,
    ExecutionStrategy, Geolocation, Page, RegisteredTest, StrategyKind, TestFixtures,
    TestFramework,
};
pub use suite_scanner::{display_name, register_suite, TestSuite};
