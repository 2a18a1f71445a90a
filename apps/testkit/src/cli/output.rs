//! Text and JSON rendering for CLI results

use anyhow::Result;
use serde_json::json;
use testkit_core::{FixtureRegistry, StageReport};

pub fn print_stage_report(report: &StageReport, format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "Staged {} fixture(s) into {}",
        report.fixtures.len(),
        report.record.base_dir.display()
    );
    for fixture in &report.fixtures {
        println!("  {}", fixture);
    }
    println!("Locator file: {}", report.locator_path.display());
    Ok(())
}

pub fn print_registry(registry: &FixtureRegistry, format: &str) -> Result<()> {
    let fixtures = registry.fixture_names();

    if format == "json" {
        let value = json!({
            "baseDir": registry.base_dir().to_string_lossy(),
            "stagingDir": registry.staging_dir().to_string_lossy(),
            "implicitFixtureName": registry.implicit_fixture_name(),
            "fixtures": fixtures,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Base directory:    {}", registry.base_dir().display());
    println!("Staging directory: {}", registry.staging_dir().display());
    println!(
        "Implicit fixture:  {}",
        registry.implicit_fixture_name().unwrap_or("(none)")
    );
    println!("Fixtures:");
    for fixture in &fixtures {
        let marker = if Some(fixture.as_str()) == registry.implicit_fixture_name() {
            " (implicit)"
        } else {
            ""
        };
        println!("  {}{}", fixture, marker);
    }
    Ok(())
}
