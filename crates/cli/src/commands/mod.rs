pub mod build;
pub mod init;
pub mod preview;
pub mod validate;

use anyhow::{Context, Result};
use sardis_site_core::{Site, parse_site_toml};
use std::path::Path;

pub const SITE_TOML: &str = "site.toml";

/// Load site.toml from a site directory, with a hint when it is missing
pub fn load_site(path: &Path) -> Result<Site> {
    if !path.exists() {
        anyhow::bail!(
            "Site directory does not exist: {}\nRun 'sardis-site init {}' first",
            path.display(),
            path.display()
        );
    }

    let site_toml_path = path.join(SITE_TOML);
    if !site_toml_path.exists() {
        anyhow::bail!(
            "{} not found in {}\nRun 'sardis-site init {}' first",
            SITE_TOML,
            path.display(),
            path.display()
        );
    }

    parse_site_toml(&site_toml_path).context("Failed to parse site.toml")
}
