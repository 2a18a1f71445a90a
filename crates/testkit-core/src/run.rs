//! Run-scoped context a test harness drives through its lifecycle hooks

use crate::locator_search::LocatorSearch;
use crate::registry::FixtureRegistry;
use crate::scope::FixtureScope;
use crate::selection::FixtureRequest;
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Arc;
use testkit_config::AppConfig;
use testkit_foundation::TestKitResult;
use tracing::debug;

/// State shared by every test in one run
///
/// Create one per run and pass it to each test's setup. The registry is
/// built on first use; concurrent callers wait for that single construction
/// and share its result.
#[derive(Debug)]
pub struct RunContext {
    search: LocatorSearch,
    registry: OnceCell<Arc<FixtureRegistry>>,
}

impl RunContext {
    pub fn new(search: LocatorSearch) -> Self {
        Self {
            search,
            registry: OnceCell::new(),
        }
    }

    /// Locator search from configuration, relative paths resolved against `base`
    pub fn from_config(config: &AppConfig, base: &Path) -> Self {
        Self::new(LocatorSearch::from_config(&config.locator, base))
    }

    /// The run's registry, building it on first call
    ///
    /// A failed construction is not cached; the next caller tries again.
    pub fn registry(&self) -> TestKitResult<Arc<FixtureRegistry>> {
        self.registry
            .get_or_try_init(|| {
                debug!(candidates = ?self.search.candidates(), "Building fixture registry");
                FixtureRegistry::locate(&self.search).map(Arc::new)
            })
            .cloned()
    }

    /// Before-all hook: build the registry so configuration problems surface during setup
    pub fn before_all(&self) -> TestKitResult<()> {
        self.registry().map(|_| ())
    }

    /// Resolve a request to a fixture name and isolate that fixture
    ///
    /// Name resolution happens before any copying, so an unresolvable request
    /// fails without touching the filesystem.
    pub fn scope_for(&self, request: &FixtureRequest) -> TestKitResult<FixtureScope> {
        let registry = self.registry()?;
        let name = request.resolve(&registry)?;
        registry.resolve_scope(&name)
    }

    /// After-each hook
    pub fn after_each(&self, scope: FixtureScope) {
        scope.release();
    }

    /// After-all hook: remove the staging directory if the registry was ever built
    ///
    /// Call only once every scope of the run has been released.
    pub fn after_all(&self) {
        if let Some(registry) = self.registry.get() {
            registry.release();
        }
    }
}
