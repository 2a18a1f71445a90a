//! Choosing which fixture a test gets

use crate::registry::FixtureRegistry;
use testkit_foundation::{TestKitError, TestKitResult};

/// Fixture names a test declared at each level, most specific first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureRequest {
    /// Set on the individual fixture parameter
    pub parameter: Option<String>,
    /// Set on the test function
    pub test: Option<String>,
    /// Set on the enclosing suite or group
    pub suite: Option<String>,
}

impl FixtureRequest {
    /// A request that relies entirely on the registry's implicit fixture
    pub fn new() -> Self {
        Self::default()
    }

    /// A request with a per-call fixture name
    pub fn named(name: impl Into<String>) -> Self {
        Self::new().with_parameter(name)
    }

    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameter = Some(name.into());
        self
    }

    pub fn with_test(mut self, name: impl Into<String>) -> Self {
        self.test = Some(name.into());
        self
    }

    pub fn with_suite(mut self, name: impl Into<String>) -> Self {
        self.suite = Some(name.into());
        self
    }

    /// Resolve the fixture name: parameter, test, suite, then the registry's implicit name
    pub fn resolve(&self, registry: &FixtureRegistry) -> TestKitResult<String> {
        select_fixture_name([
            self.parameter.as_deref(),
            self.test.as_deref(),
            self.suite.as_deref(),
            registry.implicit_fixture_name(),
        ])
        .map(str::to_string)
        .ok_or_else(|| {
            let available = registry.fixture_names();
            let message = if available.is_empty() {
                "no fixture was requested and no fixtures were discovered".to_string()
            } else {
                format!(
                    "no fixture was requested and {} fixtures are available; name one explicitly",
                    available.len()
                )
            };
            TestKitError::ambiguous_fixture(message, available)
        })
    }
}

/// First present, non-empty name in priority order
pub fn select_fixture_name<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|name| !name.is_empty())
}
