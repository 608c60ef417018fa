use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::suite_catalog::{
    device_config, location_config, ConfigTag, DeviceConfig, DeviceTag, LocationConfig,
    LocationTag,
};
use crate::suite_registrar::TestFixtures;

/// Async test body invoked with framework-provided fixtures.
pub type TestBody =
    Arc<dyn Fn(TestFixtures) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Wraps an async closure into a storable [`TestBody`].
pub fn test_body<F, Fut>(body: F) -> TestBody
where
    F: Fn(TestFixtures) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |fixtures| Box::pin(body(fixtures)))
}

/// Declaration-time configuration failure. Fatal for the test file being
/// declared; nothing is registered for the offending case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("configuration tags can only be applied to method-shaped targets; identifier '{ident}' is blank")]
    NotMethodShaped { ident: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Accumulated configuration fragments for one test case.
pub struct TestMetadata {
    pub device_config: Option<DeviceConfig>,
    pub location_config: Option<LocationConfig>,
    pub should_skip: bool,
}

/// A test body with its identifier and accumulated configuration carried
/// alongside it. Two cases built from the same closure are still distinct;
/// there is no process-wide store keyed by function identity.
#[derive(Clone)]
pub struct TestCase {
    ident: String,
    body: TestBody,
    metadata: TestMetadata,
}

impl TestCase {
    pub fn new(ident: impl Into<String>, body: TestBody) -> Result<Self, ConfigurationError> {
        let ident = ident.into();
        if ident.trim().is_empty() {
            return Err(ConfigurationError::NotMethodShaped { ident });
        }
        Ok(Self {
            ident,
            body,
            metadata: TestMetadata::default(),
        })
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn metadata(&self) -> &TestMetadata {
        &self.metadata
    }

    pub fn body(&self) -> TestBody {
        Arc::clone(&self.body)
    }

    /// Merges the tag's fragment into this case, leaving other fragments
    /// untouched. Re-applying the same fragment type overwrites it.
    pub fn apply_tag(&mut self, tag: ConfigTag) {
        match tag {
            ConfigTag::Mobile => {
                self.metadata.device_config = Some(device_config(DeviceTag::Mobile));
            }
            ConfigTag::Desktop => {
                self.metadata.device_config = Some(device_config(DeviceTag::Desktop));
            }
            ConfigTag::London => {
                self.metadata.location_config = Some(location_config(LocationTag::London));
            }
            ConfigTag::NewYork => {
                self.metadata.location_config = Some(location_config(LocationTag::NewYork));
            }
            ConfigTag::Skip => {
                self.metadata.should_skip = true;
            }
        }
        tracing::debug!(
            tag = tag.as_keyword(),
            case = %self.ident,
            "applied configuration tag"
        );
    }

    pub fn with_tag(mut self, tag: ConfigTag) -> Self {
        self.apply_tag(tag);
        self
    }

    pub fn with_device(self, tag: DeviceTag) -> Self {
        self.with_tag(tag.into())
    }

    pub fn with_location(self, tag: LocationTag) -> Self {
        self.with_tag(tag.into())
    }

    pub fn with_skip(self) -> Self {
        self.with_tag(ConfigTag::Skip)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("ident", &self.ident)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
