use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use sardis_site_core::Taxonomy;
use std::fs;
use std::path::{Path, PathBuf};

use super::SITE_TOML;

const DEFAULT_NAME: &str = "Sardis";
const DEFAULT_BASE_URL: &str = "https://sardis.sh";

/// Escape a string for safe inclusion in TOML as a TOML v1.0.0 basic string
///
/// Handles the required escape sequences for TOML basic strings:
/// - Backslash (\\) -> \\\\
/// - Quote (\") -> \\\"
/// - Backspace (\b) -> \\b
/// - Form feed (\f) -> \\f
/// - Newline (\n) -> \\n
/// - Carriage return (\r) -> \\r
/// - Tab (\t) -> \\t
///
/// The starter file is written by hand rather than serialized so it can
/// carry comments explaining each section.
fn toml_escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\x08', "\\b")
        .replace('\x0C', "\\f")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Initialize a new site directory.
///
/// Creates the directory (if needed), a `static/` folder for files copied
/// verbatim into the build, and a starter `site.toml` holding the standard
/// category taxonomy plus one sample record of each content kind.
///
/// # Errors
///
/// Returns an error if site.toml already exists or file operations fail.
pub async fn run(path: PathBuf) -> Result<()> {
    println!("🌱 Initializing site in {}", path.display());

    let site_toml = path.join(SITE_TOML);
    if site_toml.exists() {
        anyhow::bail!(
            "{} already exists in {}; refusing to overwrite",
            SITE_TOML,
            path.display()
        );
    }

    create_directory_structure(&path)?;
    println!("   ✓ Created directories");

    let content = generate_site_toml(
        DEFAULT_NAME,
        DEFAULT_BASE_URL,
        &Taxonomy::standard(),
        Utc::now().date_naive(),
    );
    fs::write(&site_toml, content).context("Failed to write site.toml")?;
    println!("   ✓ Generated {}", SITE_TOML);

    println!();
    println!("Next steps:");
    println!("   1. Edit {}", site_toml.display());
    println!("   2. sardis-site validate {}", path.display());
    println!("   3. sardis-site preview {}", path.display());

    Ok(())
}

fn create_directory_structure(base: &Path) -> Result<()> {
    fs::create_dir_all(base.join("static")).context("Failed to create static directory")?;
    Ok(())
}

fn generate_site_toml(name: &str, base_url: &str, taxonomy: &Taxonomy, today: NaiveDate) -> String {
    let mut out = format!(
        r##"# Site metadata, used for canonical URLs and the Organization schema
[site]
name = "{name}"
base_url = "{base_url}"
description = "Payment infrastructure for AI agents"
# logo = "/logo.png"
same_as = []

# Category taxonomy shared by the FAQ, blog, changelog and comparison pages.
# Every record's category must match one of these labels exactly.
"##,
        name = toml_escape_string(name),
        base_url = toml_escape_string(base_url),
    );

    for category in taxonomy.categories() {
        out.push_str(&format!(
            "[[category]]\nlabel = \"{}\"\ncolor = \"{}\"\n",
            toml_escape_string(&category.label),
            toml_escape_string(&category.color_token)
        ));
        if let Some(icon) = &category.icon_token {
            out.push_str(&format!("icon = \"{}\"\n", toml_escape_string(icon)));
        }
        out.push('\n');
    }

    let date = today.format("%Y-%m-%d");
    out.push_str(&format!(
        r##"[[faq]]
category = "General"
question = "What is {name}?"
answer = "{name} lets AI agents pay for things within limits you set."

[[post]]
slug = "hello-world"
title = "Hello, world"
description = "Introducing {name}"
category = "Announcement"
published = "{date}"
body = """
Welcome to the {name} blog.
"""

[[release]]
version = "0.1.0"
date = "{date}"
title = "First release"
category = "Feature"
changes = ["Initial public release"]

[[comparison]]
category = "Security"
feature = "Key custody"
sardis = "Split across parties with MPC"
alternative = "Single custodial key"
"##,
        name = toml_escape_string(name),
        date = date,
    ));

    out
}
