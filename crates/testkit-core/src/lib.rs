//! Fixture resolution and isolation for build tool plugin integration tests
//!
//! A build step stages fixture projects and writes a locator file
//! ([`FixtureStager`]). During the test run a [`RunContext`] finds that file,
//! builds the [`FixtureRegistry`] once, and hands each test a
//! [`FixtureScope`]: a private copy of one fixture that is deleted when the
//! test is done.
//!
//! ```no_run
//! use testkit_core::{FixtureRequest, LocatorSearch, RunContext};
//!
//! let context = RunContext::new(LocatorSearch::explicit("target/testkit/testkit_locator.properties"));
//! context.before_all()?;
//!
//! let scope = context.scope_for(&FixtureRequest::named("simple"))?;
//! let invocation = scope.invocation(["build"]);
//! assert_eq!(invocation.working_dir, scope.directory());
//! context.after_each(scope);
//!
//! context.after_all();
//! # Ok::<(), testkit_foundation::TestKitError>(())
//! ```

pub mod invocation;
pub mod isolation;
pub mod locator_search;
pub mod registry;
pub mod run;
pub mod scope;
pub mod selection;
pub mod stager;

pub use invocation::{BuildInvocation, BuildOutput, BuildRunner, CommandRunner};
pub use locator_search::LocatorSearch;
pub use registry::FixtureRegistry;
pub use run::RunContext;
pub use scope::FixtureScope;
pub use selection::{select_fixture_name, FixtureRequest};
pub use stager::{FixtureStager, StageReport};
