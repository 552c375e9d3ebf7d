use crate::error::{Error, Result};
use crate::taxonomy::{Category, Taxonomy};
use crate::types::*;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use url::Url;

/// Raw TOML configuration structure
/// This matches the site.toml file structure exactly
#[derive(Debug, Deserialize)]
struct RawConfig {
    site: RawSite,
    #[serde(default)]
    category: Vec<RawCategory>,
    #[serde(default)]
    faq: Vec<FaqItem>,
    #[serde(default)]
    post: Vec<RawPost>,
    #[serde(default)]
    release: Vec<ChangelogRelease>,
    #[serde(default)]
    comparison: Vec<ComparisonRow>,
}

#[derive(Debug, Deserialize)]
struct RawSite {
    name: String,
    base_url: String, // Parse as Url
    description: String,
    logo: Option<String>,
    #[serde(default)]
    same_as: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    label: String,
    color: String,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    slug: Option<String>, // Derived from title when absent
    title: String,
    description: String,
    category: String,
    published: String,
    modified: Option<String>,
    author: Option<String>,
    image: Option<String>,
    #[serde(default)]
    body: String,
}

/// Parse site.toml from a file path
pub fn parse_site_toml<P: AsRef<Path>>(path: P) -> Result<Site> {
    let content = fs::read_to_string(path)?;
    parse_site_toml_str(&content)
}

/// Parse site.toml from a string (useful for testing)
pub fn parse_site_toml_str(content: &str) -> Result<Site> {
    let raw: RawConfig = toml::from_str(content)?;

    let info = SiteInfo {
        base_url: parse_base_url(&raw.site.base_url)?,
        name: raw.site.name,
        description: raw.site.description,
        logo: raw.site.logo,
        same_as: raw.site.same_as,
    };

    // An empty [[category]] list means the built-in vocabulary
    let taxonomy = if raw.category.is_empty() {
        Taxonomy::standard()
    } else {
        Taxonomy::new(
            raw.category
                .into_iter()
                .map(|c| Category {
                    label: c.label,
                    color_token: c.color,
                    icon_token: c.icon,
                })
                .collect(),
        )?
    };

    let posts: Result<Vec<BlogPost>> = raw
        .post
        .into_iter()
        .map(|p| {
            let slug = match p.slug {
                Some(slug) => validate_slug(&slug, "post.slug")?,
                None => validate_slug(&slugify(&p.title), "post.title")?,
            };

            Ok(BlogPost {
                slug,
                title: p.title,
                description: p.description,
                category: p.category,
                published: p.published,
                modified: p.modified,
                author: p.author,
                image: p.image,
                body: p.body,
            })
        })
        .collect();

    Ok(Site {
        info,
        taxonomy,
        faqs: raw.faq,
        posts: posts?,
        releases: raw.release,
        comparisons: raw.comparison,
    })
}

/// Parse the site base URL, which every canonical and schema URL is joined onto.
///
/// Only absolute `http`/`https` URLs are accepted. A missing trailing slash
/// is added so relative joins keep any path prefix.
fn parse_base_url(s: &str) -> Result<Url> {
    let mut url = Url::parse(s)
        .map_err(|e| Error::ConfigParse(format!("Invalid base_url '{}': {}", s, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::ConfigParse(format!(
            "base_url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Validate a slug used as a URL path segment.
///
/// Rejects anything that would escape its route: separators, parent
/// references, or characters outside `[a-z0-9-]`.
fn validate_slug(slug: &str, field_name: &str) -> Result<String> {
    if slug.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty slug in '{}' field",
            field_name
        )));
    }

    if let Some(bad) = slug
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(Error::ConfigParse(format!(
            "Invalid character '{}' in '{}': '{}'. Use lowercase letters, digits and '-'.",
            bad, field_name, slug
        )));
    }

    Ok(slug.to_string())
}
