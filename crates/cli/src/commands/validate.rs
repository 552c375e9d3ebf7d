use chrono::Utc;
use sardis_site_validator::validate_site;
use std::path::PathBuf;

use super::load_site;

pub async fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating site at: {}", path.display());

    let site = load_site(&path)?;
    println!("✓ site.toml parsed");
    println!("  Site: {} ({})", site.info.name, site.info.base_url);

    let report = validate_site(&site, Utc::now());

    for info in &report.info {
        println!("  {}", info);
    }
    for warning in &report.warnings {
        println!("⚠ {}", warning);
    }
    for error in &report.errors {
        eprintln!("✗ {}", error);
    }

    if !report.is_valid() {
        anyhow::bail!("Validation failed with {} error(s)", report.errors.len());
    }

    println!("\n✅ Content and structured data valid");
    Ok(())
}
