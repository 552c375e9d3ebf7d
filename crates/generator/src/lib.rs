// Static page generation with JSON-LD structured data

pub mod page;
pub mod schema;

use sardis_site_core::{AccordionState, BreadcrumbTrail, Result, Site};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::debug;

pub use page::Page;
pub use schema::{
    JsonLd, article_schema, breadcrumb_schema, faq_schema, organization_schema, website_schema,
};

/// Every page that makes up a built site
pub struct GeneratedSite {
    pub pages: Vec<(PathBuf, String)>, // (path, html)
    pub manifest: SchemaManifest,
}

/// Digest of every JSON-LD payload per route, for snapshot comparisons
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaManifest {
    pub routes: BTreeMap<String, Vec<SchemaDigest>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDigest {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub sha256: String,
}

impl SchemaDigest {
    pub fn of(schema: &JsonLd) -> Result<Self> {
        let json = schema.to_json()?;
        Ok(SchemaDigest {
            schema_type: schema.schema_type().to_string(),
            sha256: format!("{:x}", Sha256::digest(json.as_bytes())),
        })
    }
}

/// Routes the site has pages for. Sections with no content are skipped.
pub fn routes(site: &Site) -> Vec<String> {
    let mut routes = vec!["/".to_string()];
    if !site.faqs.is_empty() {
        routes.push("/faq".to_string());
    }
    if !site.posts.is_empty() {
        routes.push("/blog".to_string());
        routes.extend(site.posts.iter().map(|p| p.path()));
    }
    if !site.releases.is_empty() {
        routes.push("/changelog".to_string());
    }
    if !site.comparisons.is_empty() {
        routes.push("/compare".to_string());
    }
    routes
}

/// Breadcrumb names for routes whose title is not the title-cased segment
fn route_titles(site: &Site) -> HashMap<String, String> {
    let mut titles = HashMap::new();
    titles.insert("/faq".to_string(), "FAQ".to_string());
    for post in &site.posts {
        titles.insert(post.path(), post.title.clone());
    }
    titles
}

/// Compose the page for `route`, or `None` if the site has no such page.
///
/// Any content or structured-data error fails the whole page.
pub fn build_page(site: &Site, route: &str, state: &AccordionState) -> Result<Option<Page>> {
    let route = normalize_route(route);
    let titles = route_titles(site);
    let breadcrumbs = || breadcrumb_schema(&site.info.base_url, &BreadcrumbTrail::for_path(&route, &titles));

    let page = match route.as_str() {
        "/" => Page {
            route: route.clone(),
            title: site.info.name.clone(),
            description: site.info.description.clone(),
            schemas: vec![organization_schema(&site.info)?, website_schema(&site.info)],
            body: page::home_body(site),
        },
        "/faq" if !site.faqs.is_empty() => Page {
            route: route.clone(),
            title: "FAQ".to_string(),
            description: format!("Frequently asked questions about {}", site.info.name),
            schemas: vec![faq_schema(&site.faqs)?, breadcrumbs()?],
            body: page::faq_body(site, state)?,
        },
        "/blog" if !site.posts.is_empty() => Page {
            route: route.clone(),
            title: "Blog".to_string(),
            description: format!("News and engineering notes from {}", site.info.name),
            schemas: vec![breadcrumbs()?],
            body: page::blog_index_body(site, state)?,
        },
        "/changelog" if !site.releases.is_empty() => Page {
            route: route.clone(),
            title: "Changelog".to_string(),
            description: format!("Release history for {}", site.info.name),
            schemas: vec![breadcrumbs()?],
            body: page::changelog_body(site, state)?,
        },
        "/compare" if !site.comparisons.is_empty() => Page {
            route: route.clone(),
            title: "Compare".to_string(),
            description: format!("How {} compares to the alternatives", site.info.name),
            schemas: vec![breadcrumbs()?],
            body: page::comparison_body(site, state)?,
        },
        other => {
            let Some(post) = other.strip_prefix("/blog/").and_then(|slug| site.post(slug)) else {
                return Ok(None);
            };
            Page {
                route: route.clone(),
                title: post.title.clone(),
                description: post.description.clone(),
                schemas: vec![article_schema(&site.info, &post.article_meta())?, breadcrumbs()?],
                body: page::post_body(site, post)?,
            }
        }
    };

    debug!(route = %page.route, schemas = page.schemas.len(), "composed page");
    Ok(Some(page))
}

/// Build every page with default UI state (all items closed, no filter)
pub fn generate_site(site: &Site) -> Result<GeneratedSite> {
    let state = AccordionState::new();
    let mut pages = Vec::new();
    let mut manifest = SchemaManifest::default();

    for route in routes(site) {
        let Some(page) = build_page(site, &route, &state)? else {
            continue;
        };

        let digests = page
            .schemas
            .iter()
            .map(SchemaDigest::of)
            .collect::<Result<Vec<_>>>()?;
        manifest.routes.insert(page.route.clone(), digests);

        pages.push((page.output_path(), page.render(&site.info, None)?));
    }

    debug!(pages = pages.len(), "generated site");
    Ok(GeneratedSite { pages, manifest })
}

/// "/faq/" and "faq" both become "/faq"; the empty route becomes "/"
fn normalize_route(route: &str) -> String {
    let trimmed = route.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sardis_site_core::parse_site_toml_str;
    use serde_json::Value;

    fn site() -> Site {
        parse_site_toml_str(
            r##"
[site]
name = "Sardis"
base_url = "https://sardis.sh"
description = "Payments for AI agents"

[[faq]]
category = "General"
question = "What is Sardis?"
answer = "A payment layer for agents."

[[post]]
slug = "hello"
title = "Hello"
description = "First post"
category = "Announcement"
published = "2025-02-01"
"##,
        )
        .unwrap()
    }

    fn schema_values(page: &Page) -> Vec<Value> {
        page.schemas
            .iter()
            .map(|s| serde_json::to_value(s).unwrap())
            .collect()
    }

    #[test]
    fn test_routes_skip_empty_sections() {
        assert_eq!(routes(&site()), vec!["/", "/faq", "/blog", "/blog/hello"]);
    }

    #[test]
    fn test_normalize_route() {
        assert_eq!(normalize_route(""), "/");
        assert_eq!(normalize_route("/"), "/");
        assert_eq!(normalize_route("faq"), "/faq");
        assert_eq!(normalize_route("/blog/hello/"), "/blog/hello");
    }

    #[test]
    fn test_faq_page_schemas() {
        let page = build_page(&site(), "/faq", &AccordionState::new())
            .unwrap()
            .unwrap();
        let values = schema_values(&page);

        assert_eq!(values[0]["@type"], "FAQPage");
        assert_eq!(values[0]["mainEntity"][0]["name"], "What is Sardis?");
        assert_eq!(values[1]["@type"], "BreadcrumbList");
        assert_eq!(values[1]["itemListElement"][1]["name"], "FAQ");
        assert!(values[1]["itemListElement"][1].get("item").is_none());
    }

    #[test]
    fn test_post_page_schemas() {
        let page = build_page(&site(), "/blog/hello", &AccordionState::new())
            .unwrap()
            .unwrap();
        let values = schema_values(&page);

        assert_eq!(values[0]["@type"], "BlogPosting");
        assert_eq!(values[0]["url"], "https://sardis.sh/blog/hello");
        let crumbs = values[1]["itemListElement"].as_array().unwrap();
        assert_eq!(crumbs.len(), 3);
        assert_eq!(crumbs[1]["item"], "https://sardis.sh/blog");
        assert_eq!(crumbs[2]["name"], "Hello");
    }

    #[test]
    fn test_home_page_schemas() {
        let page = build_page(&site(), "/", &AccordionState::new())
            .unwrap()
            .unwrap();
        let types: Vec<&str> = page.schemas.iter().map(|s| s.schema_type()).collect();
        assert_eq!(types, vec!["Organization", "WebSite"]);
    }

    #[test]
    fn test_unknown_routes_return_none() {
        let site = site();
        let state = AccordionState::new();
        assert!(build_page(&site, "/changelog", &state).unwrap().is_none());
        assert!(build_page(&site, "/blog/missing", &state).unwrap().is_none());
        assert!(build_page(&site, "/pricing", &state).unwrap().is_none());
    }

    #[test]
    fn test_invalid_post_date_fails_build() {
        let mut site = site();
        site.posts[0].published = "soon".to_string();
        assert!(generate_site(&site).is_err());
    }

    #[test]
    fn test_generate_site_is_deterministic() {
        let site = site();
        let first = generate_site(&site).unwrap();
        let second = generate_site(&site).unwrap();

        assert_eq!(first.pages, second.pages);
        assert_eq!(first.manifest, second.manifest);
        assert_eq!(first.pages.len(), 4);
    }

    #[test]
    fn test_manifest_digests() {
        let generated = generate_site(&site()).unwrap();
        let faq = &generated.manifest.routes["/faq"];

        assert_eq!(faq.len(), 2);
        assert_eq!(faq[0].schema_type, "FAQPage");
        assert_eq!(faq[0].sha256.len(), 64);
        assert!(faq[0].sha256.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_pages_embed_json_ld() {
        let generated = generate_site(&site()).unwrap();
        let (_, html) = generated
            .pages
            .iter()
            .find(|(path, _)| path == &PathBuf::from("faq/index.html"))
            .unwrap();
        assert_eq!(html.matches(r#"<script type="application/ld+json">"#).count(), 2);
    }
}
