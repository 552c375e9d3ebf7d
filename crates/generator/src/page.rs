use pulldown_cmark::{Options, Parser, html};
use sardis_site_core::{
    AccordionState, BlogPost, Category, Categorized, ChangelogRelease, ComparisonRow,
    ContentRecord, FaqItem, RecordKey, Result, Site, SiteInfo, Taxonomy,
};
use std::path::PathBuf;

use crate::schema::{JsonLd, absolute_url, normalize_date};

/// HTML-escape a string to prevent XSS attacks
///
/// Escapes: & < > " '
pub fn html_escape(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#x27;".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

/// One composed page: head metadata, structured data and body markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Route path, e.g. "/faq"
    pub route: String,
    pub title: String,
    pub description: String,
    pub schemas: Vec<JsonLd>,
    pub body: String,
}

impl Page {
    /// File the page is written to, relative to the output directory
    pub fn output_path(&self) -> PathBuf {
        let trimmed = self.route.trim_matches('/');
        if trimmed.is_empty() {
            PathBuf::from("index.html")
        } else {
            PathBuf::from(trimmed).join("index.html")
        }
    }

    /// Full `<title>`: "Page | Site", or just the site name on the home page
    pub fn full_title(&self, site: &SiteInfo) -> String {
        if self.route == "/" || self.title == site.name {
            site.name.clone()
        } else {
            format!("{} | {}", self.title, site.name)
        }
    }

    /// `<head>` contents: title, description, canonical link and one
    /// JSON-LD script per schema
    pub fn render_head(&self, site: &SiteInfo) -> Result<String> {
        let title = html_escape(&self.full_title(site));
        let description = html_escape(&self.description);
        let canonical = absolute_url(&site.base_url, &self.route)
            .map(|u| u.to_string())
            .unwrap_or_else(|| site.base_url.to_string());
        let canonical = html_escape(&canonical);

        let mut head = format!(
            r#"    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <meta name="description" content="{description}">
    <link rel="canonical" href="{canonical}">
    <meta property="og:title" content="{title}">
    <meta property="og:description" content="{description}">
    <meta property="og:url" content="{canonical}">
"#
        );

        for schema in &self.schemas {
            head.push_str("    ");
            head.push_str(&schema.to_script_tag()?);
            head.push('\n');
        }

        Ok(head)
    }

    /// Complete HTML document.
    ///
    /// `extra_script` is appended before `</body>`; the preview server uses
    /// it for live reload.
    pub fn render(&self, site: &SiteInfo, extra_script: Option<&str>) -> Result<String> {
        let head = self.render_head(site)?;
        let site_name = html_escape(&site.name);

        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
{head}</head>
<body>
    <header class="site-header"><a href="/">{site_name}</a></header>
    <main>
{body}
    </main>
    <footer class="site-footer">&copy; {site_name}</footer>
{script}</body>
</html>
"#,
            head = head,
            site_name = site_name,
            body = self.body,
            script = extra_script.unwrap_or(""),
        ))
    }
}

/// A record together with its stable key
struct Keyed<'a, T> {
    key: RecordKey,
    record: &'a T,
}

impl<T: Categorized> Categorized for Keyed<'_, T> {
    fn category(&self) -> &str {
        self.record.category()
    }
}

fn keyed_faqs(faqs: &[FaqItem]) -> Vec<Keyed<'_, FaqItem>> {
    ContentRecord::keyed(faqs.iter().map(ContentRecord::Faq))
        .into_iter()
        .zip(faqs)
        .map(|((key, _), record)| Keyed { key, record })
        .collect()
}

fn keyed_rows(rows: &[ComparisonRow]) -> Vec<Keyed<'_, ComparisonRow>> {
    ContentRecord::keyed(rows.iter().map(ContentRecord::ComparisonRow))
        .into_iter()
        .zip(rows)
        .map(|((key, _), record)| Keyed { key, record })
        .collect()
}

pub(crate) fn category_badge(category: &Category) -> String {
    let icon = category
        .icon_token
        .as_deref()
        .map(|icon| format!(r#" data-icon="{}""#, html_escape(icon)))
        .unwrap_or_default();
    format!(
        r#"<span class="badge badge-{}"{}>{}</span>"#,
        html_escape(&category.color_token),
        icon,
        html_escape(&category.label)
    )
}

/// Filter links for every category present in `records`, in first-seen order
fn filter_nav<R: Categorized>(
    taxonomy: &Taxonomy,
    records: &[R],
    state: &AccordionState,
    route: &str,
) -> Result<String> {
    let groups = taxonomy.group_by_category(records)?;
    let active = state.active_filter();

    let all_class = if active.is_none() { " active" } else { "" };
    let mut nav = format!(
        r#"        <nav class="category-filter"><a class="filter{}" href="{}">All</a>"#,
        all_class, route
    );

    for (category, _) in groups {
        let class = if active == Some(category.label.as_str()) {
            " active"
        } else {
            ""
        };
        nav.push_str(&format!(
            r#"<a class="filter filter-{}{}" href="{}?category={}">{}</a>"#,
            html_escape(&category.color_token),
            class,
            route,
            category.key(),
            html_escape(&category.label)
        ));
    }
    nav.push_str("</nav>\n");

    Ok(nav)
}

/// FAQ body: questions grouped by category as independent accordions
pub fn faq_body(site: &Site, state: &AccordionState) -> Result<String> {
    let entries = keyed_faqs(&site.faqs);
    let visible = state.visible(&entries);
    let groups = site.taxonomy.group_by_category(&visible)?;

    let mut body = String::from("        <h1>Frequently Asked Questions</h1>\n");
    body.push_str(&filter_nav(&site.taxonomy, &entries, state, "/faq")?);

    for (category, items) in groups {
        body.push_str(&format!(
            "        <section class=\"faq-group\" id=\"{}\">\n            <h2>{}</h2>\n",
            category.key(),
            category_badge(category)
        ));
        for entry in items {
            let open = if state.is_open(&entry.key) { " open" } else { "" };
            body.push_str(&format!(
                r#"            <details class="faq-item" id="{}"{}>
                <summary>{}</summary>
                <p>{}</p>
            </details>
"#,
                entry.key,
                open,
                html_escape(&entry.record.question),
                html_escape(&entry.record.answer)
            ));
        }
        body.push_str("        </section>\n");
    }

    Ok(body)
}

/// Blog index: post cards, newest first as authored
pub fn blog_index_body(site: &Site, state: &AccordionState) -> Result<String> {
    let visible = state.visible(&site.posts);

    let mut body = String::from("        <h1>Blog</h1>\n");
    body.push_str(&filter_nav(&site.taxonomy, &site.posts, state, "/blog")?);
    body.push_str("        <ul class=\"post-list\">\n");

    for post in visible {
        let category = site.taxonomy.resolve(&post.category)?;
        body.push_str(&format!(
            r#"            <li class="post-card" id="{}">
                {}
                <a href="{}"><h2>{}</h2></a>
                <time datetime="{}">{}</time>
                <p>{}</p>
            </li>
"#,
            post.slug,
            category_badge(category),
            post.path(),
            html_escape(&post.title),
            normalize_date(&post.published)?,
            html_escape(&post.published),
            html_escape(&post.description)
        ));
    }
    body.push_str("        </ul>\n");

    Ok(body)
}

/// Single blog post with its markdown body rendered to HTML
pub fn post_body(site: &Site, post: &BlogPost) -> Result<String> {
    let category = site.taxonomy.resolve(&post.category)?;
    let byline = post
        .author
        .as_deref()
        .map(|a| format!(r#"<span class="author">{}</span> "#, html_escape(a)))
        .unwrap_or_default();

    Ok(format!(
        r#"        <article class="post">
            <header>
                {}
                <h1>{}</h1>
                <p class="byline">{}<time datetime="{}">{}</time></p>
            </header>
{}
        </article>
"#,
        category_badge(category),
        html_escape(&post.title),
        byline,
        normalize_date(&post.published)?,
        html_escape(&post.published),
        render_markdown(&post.body)
    ))
}

/// Changelog: one section per release, anchored by version slug
pub fn changelog_body(site: &Site, state: &AccordionState) -> Result<String> {
    let visible = state.visible(&site.releases);

    let mut body = String::from("        <h1>Changelog</h1>\n");
    body.push_str(&filter_nav(&site.taxonomy, &site.releases, state, "/changelog")?);

    for release in visible {
        body.push_str(&release_section(&site.taxonomy, release)?);
    }

    Ok(body)
}

fn release_section(taxonomy: &Taxonomy, release: &ChangelogRelease) -> Result<String> {
    let category = taxonomy.resolve(&release.category)?;
    let changes: String = release
        .changes
        .iter()
        .map(|c| format!("                <li>{}</li>\n", html_escape(c)))
        .collect();

    Ok(format!(
        r#"        <section class="release" id="{}">
            <h2>{} <span class="version">{}</span></h2>
            {}
            <time datetime="{}">{}</time>
            <ul>
{}            </ul>
        </section>
"#,
        release.slug(),
        html_escape(&release.title),
        html_escape(&release.version),
        category_badge(category),
        normalize_date(&release.date)?,
        html_escape(&release.date),
        changes
    ))
}

/// Comparison tables, one per category
pub fn comparison_body(site: &Site, state: &AccordionState) -> Result<String> {
    let entries = keyed_rows(&site.comparisons);
    let visible = state.visible(&entries);
    let groups = site.taxonomy.group_by_category(&visible)?;

    let mut body = String::from("        <h1>How Sardis Compares</h1>\n");
    body.push_str(&filter_nav(&site.taxonomy, &entries, state, "/compare")?);

    for (category, rows) in groups {
        let rows_html: String = rows
            .iter()
            .map(|entry| {
                format!(
                    "                <tr id=\"{}\"><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                    entry.key,
                    html_escape(&entry.record.feature),
                    html_escape(&entry.record.sardis),
                    html_escape(&entry.record.alternative)
                )
            })
            .collect();

        body.push_str(&format!(
            r#"        <section class="comparison-group" id="{}">
            <h2>{}</h2>
            <table>
                <thead><tr><th>Feature</th><th>{}</th><th>Alternatives</th></tr></thead>
                <tbody>
{}                </tbody>
            </table>
        </section>
"#,
            category.key(),
            category_badge(category),
            html_escape(&site.info.name),
            rows_html
        ));
    }

    Ok(body)
}

/// Home page: site description and links to each populated section
pub fn home_body(site: &Site) -> String {
    let mut links = String::new();
    let sections = [
        ("/faq", "FAQ", !site.faqs.is_empty()),
        ("/blog", "Blog", !site.posts.is_empty()),
        ("/changelog", "Changelog", !site.releases.is_empty()),
        ("/compare", "Compare", !site.comparisons.is_empty()),
    ];
    for (href, name, present) in sections {
        if present {
            links.push_str(&format!(r#"<a href="{}">{}</a>"#, href, name));
        }
    }

    format!(
        r#"        <h1>{}</h1>
        <p class="tagline">{}</p>
        <nav class="sections">{}</nav>
"#,
        html_escape(&site.info.name),
        html_escape(&site.info.description),
        links
    )
}

fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::website_schema;
    use sardis_site_core::parse_site_toml_str;

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
answer = "A payment layer."

[[faq]]
category = "Security"
question = "Who holds keys?"
answer = "Nobody alone <MPC>."

[[faq]]
category = "General"
question = "Is it free?"
answer = "During beta."

[[post]]
slug = "hello"
title = "Hello & welcome"
description = "First post"
category = "Announcement"
published = "2025-02-01"
author = "Ada"
body = "Some **bold** text"

[[release]]
version = "1.2.0"
date = "2025-03-01"
title = "Policies"
category = "Feature"
changes = ["Spending limits", "Allow <lists>"]

[[comparison]]
category = "Security"
feature = "Custody"
sardis = "MPC"
alternative = "Custodial"
"##,
        )
        .unwrap()
    }

    #[test]
    fn test_html_escape_basic_characters() {
        assert_eq!(html_escape("Hello World"), "Hello World");
        assert_eq!(html_escape("Test & Test"), "Test &amp; Test");
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("\"quoted\""), "&quot;quoted&quot;");
        assert_eq!(html_escape("'single'"), "&#x27;single&#x27;");
    }

    #[test]
    fn test_html_escape_unicode() {
        assert_eq!(html_escape("支払い"), "支払い");
        assert_eq!(html_escape("paiement sécurisé"), "paiement sécurisé");
    }

    #[test]
    fn test_output_path() {
        let mut page = Page {
            route: "/".to_string(),
            title: "Sardis".to_string(),
            description: String::new(),
            schemas: vec![],
            body: String::new(),
        };
        assert_eq!(page.output_path(), PathBuf::from("index.html"));

        page.route = "/blog/hello".to_string();
        assert_eq!(page.output_path(), PathBuf::from("blog/hello/index.html"));
    }

    #[test]
    fn test_render_head() {
        let site = site();
        let page = Page {
            route: "/faq".to_string(),
            title: "FAQ".to_string(),
            description: "Answers \"here\"".to_string(),
            schemas: vec![website_schema(&site.info)],
            body: String::new(),
        };
        let head = page.render_head(&site.info).unwrap();

        assert!(head.contains("<title>FAQ | Sardis</title>"));
        assert!(head.contains(r#"<meta name="description" content="Answers &quot;here&quot;">"#));
        assert!(head.contains(r#"<link rel="canonical" href="https://sardis.sh/faq">"#));
        assert_eq!(head.matches(r#"<script type="application/ld+json">"#).count(), 1);
    }

    #[test]
    fn test_render_full_document_with_script() {
        let site = site();
        let page = Page {
            route: "/".to_string(),
            title: "Sardis".to_string(),
            description: "Home".to_string(),
            schemas: vec![],
            body: "<p>hi</p>".to_string(),
        };
        let html = page.render(&site.info, Some("<script>reload()</script>\n")).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Sardis</title>"));
        assert!(html.contains("<p>hi</p>"));
        assert!(html.contains("<script>reload()</script>\n</body>"));
    }

    #[test]
    fn test_faq_body_groups_in_first_seen_order() {
        let site = site();
        let body = faq_body(&site, &AccordionState::new()).unwrap();

        let general = body.find(r#"id="general""#).unwrap();
        let security = body.find(r#"id="security""#).unwrap();
        assert!(general < security);
        assert!(body.contains(r#"id="faq-general-1""#));
        assert!(body.contains("Nobody alone &lt;MPC&gt;."));
        assert!(!body.contains(" open>"));
    }

    #[test]
    fn test_faq_body_respects_accordion_state() {
        let site = site();
        let mut state = AccordionState::new();
        state.toggle(&RecordKey::position(
            sardis_site_core::ContentKind::Faq,
            "Security",
            0,
        ));
        let body = faq_body(&site, &state).unwrap();
        assert!(body.contains(r#"id="faq-security-0" open>"#));
        assert!(body.contains(r#"id="faq-general-0">"#));
    }

    #[test]
    fn test_faq_body_filter_keeps_keys_stable() {
        let site = site();
        let mut state = AccordionState::new();
        state.set_filter(Some(site.taxonomy.resolve("Security").unwrap()));

        let body = faq_body(&site, &state).unwrap();
        assert!(body.contains(r#"id="faq-security-0""#));
        assert!(!body.contains("What is Sardis?"));
        assert!(body.contains(r#"class="filter filter-red active""#));
    }

    #[test]
    fn test_faq_body_unknown_category_errors() {
        let mut site = site();
        site.faqs[0].category = "Genral".to_string();
        assert!(faq_body(&site, &AccordionState::new()).is_err());
    }

    #[test]
    fn test_post_body_renders_markdown() {
        let site = site();
        let body = post_body(&site, &site.posts[0]).unwrap();
        assert!(body.contains("<strong>bold</strong>"));
        assert!(body.contains("<h1>Hello &amp; welcome</h1>"));
        assert!(body.contains(r#"<span class="author">Ada</span>"#));
    }

    #[test]
    fn test_changelog_body() {
        let site = site();
        let body = changelog_body(&site, &AccordionState::new()).unwrap();
        assert!(body.contains(r#"id="v1-2-0""#));
        assert!(body.contains("<li>Allow &lt;lists&gt;</li>"));
        assert!(body.contains(r#"datetime="2025-03-01""#));
    }

    #[test]
    fn test_comparison_body() {
        let site = site();
        let body = comparison_body(&site, &AccordionState::new()).unwrap();
        assert!(body.contains(r#"<tr id="comparison-security-0">"#));
        assert!(body.contains("<th>Sardis</th>"));
    }

    #[test]
    fn test_home_body_links_populated_sections() {
        let mut site = site();
        site.comparisons.clear();
        let body = home_body(&site);
        assert!(body.contains(r#"href="/faq""#));
        assert!(!body.contains(r#"href="/compare""#));
    }

    #[test]
    fn test_category_badge() {
        let taxonomy = Taxonomy::standard();
        let badge = category_badge(taxonomy.resolve("Security").unwrap());
        assert_eq!(
            badge,
            r#"<span class="badge badge-red" data-icon="shield">Security</span>"#
        );
    }
}
