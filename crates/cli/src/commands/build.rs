use anyhow::{Context, Result};
use chrono::Utc;
use sardis_site_generator::generate_site;
use sardis_site_validator::validate_site;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::load_site;

pub const MANIFEST_FILE: &str = "schema-manifest.json";

/// What a build wrote
#[derive(Debug)]
pub struct BuildSummary {
    pub pages: usize,
    pub schemas: usize,
    pub static_files: usize,
}

/// Build static site for deployment
pub async fn run(path: PathBuf, output: PathBuf) -> Result<()> {
    println!("🔨 Building static site...");
    println!("   Source: {}", path.display());
    println!("   Output: {}", output.display());
    println!();

    let summary = build_static_site(&path, &output)?;

    println!("   ✓ Wrote {} pages", summary.pages);
    println!("   ✓ Embedded {} JSON-LD schemas", summary.schemas);
    println!("   ✓ Copied {} static files", summary.static_files);
    println!();
    println!("✅ Build complete!");
    println!("   Output: {}", output.display());
    println!();

    Ok(())
}

/// Validate, generate and write the site.
///
/// Refuses to write anything when validation reports errors.
pub fn build_static_site(path: &Path, output: &Path) -> Result<BuildSummary> {
    let site = load_site(path)?;

    let report = validate_site(&site, Utc::now());
    for warning in &report.warnings {
        println!("   ⚠ {}", warning);
    }
    if !report.is_valid() {
        for error in &report.errors {
            eprintln!("   ✗ {}", error);
        }
        anyhow::bail!(
            "Validation failed with {} error(s); nothing was written",
            report.errors.len()
        );
    }

    let generated = generate_site(&site).context("Failed to generate site")?;

    fs::create_dir_all(output).context("Failed to create output directory")?;

    for (page_path, html) in &generated.pages {
        let dst = output.join(page_path);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&dst, html).with_context(|| format!("Failed to write {}", dst.display()))?;
    }

    let manifest = serde_json::to_string_pretty(&generated.manifest)
        .context("Failed to serialize schema manifest")?;
    fs::write(output.join(MANIFEST_FILE), manifest)
        .context("Failed to write schema manifest")?;

    let static_files = copy_static(&path.join("static"), output)?;

    Ok(BuildSummary {
        pages: generated.pages.len(),
        schemas: generated.manifest.routes.values().map(Vec::len).sum(),
        static_files,
    })
}

/// Copy everything under the site's static/ directory into the output root,
/// keeping each file's path relative to static/
fn copy_static(static_dir: &Path, output: &Path) -> Result<usize> {
    let mut copied = 0;
    if !static_dir.exists() {
        return Ok(copied);
    }

    for entry in WalkDir::new(static_dir).follow_links(true).sort_by_file_name() {
        let entry = entry.context("Failed to read static directory")?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(static_dir)?;
        let dst_path = output.join(relative);
        if let Some(parent) = dst_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::copy(entry.path(), &dst_path)
            .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        copied += 1;
    }

    Ok(copied)
}
