//! schema.org JSON-LD builders.
//!
//! Every builder is a pure function of its input: no I/O and no clock. The
//! output types fix their field order, so serializing equal input always
//! yields byte-identical JSON.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use sardis_site_core::{ArticleKind, ArticleMeta, BreadcrumbTrail, Error, FaqItem, Result, SiteInfo};
use serde::Serialize;
use url::Url;

pub const SCHEMA_CONTEXT: &str = "https://schema.org";

/// A top-level JSON-LD document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum JsonLd {
    FaqPage(FaqPage),
    BreadcrumbList(BreadcrumbList),
    Article(Article),
    Organization(Organization),
    WebSite(WebSite),
}

impl JsonLd {
    /// The `@type` of the document
    pub fn schema_type(&self) -> &'static str {
        match self {
            JsonLd::FaqPage(n) => n.kind,
            JsonLd::BreadcrumbList(n) => n.kind,
            JsonLd::Article(n) => n.kind,
            JsonLd::Organization(n) => n.kind,
            JsonLd::WebSite(n) => n.kind,
        }
    }

    /// Compact JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::InvalidData(format!("Failed to serialize JSON-LD: {}", e)))
    }

    /// JSON wrapped in a `<script type="application/ld+json">` element.
    ///
    /// `<` is written as `\u003c`, which JSON parsers read back unchanged,
    /// so text like `</script>` inside content cannot end the element early.
    pub fn to_script_tag(&self) -> Result<String> {
        let json = self.to_json()?.replace('<', "\\u003c");
        Ok(format!(
            r#"<script type="application/ld+json">{}</script>"#,
            json
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqPage {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub main_entity: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    pub accepted_answer: Answer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreadcrumbList {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub item_list_element: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub position: usize,
    pub name: String,
    /// Absent for the current page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
}

/// `Article` or `BlogPosting`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub headline: String,
    pub description: String,
    pub url: String,
    pub main_entity_of_page: WebPageRef,
    pub date_published: String,
    pub date_modified: String,
    pub author: Party,
    pub publisher: Publisher,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebPageRef {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    #[serde(rename = "@id")]
    pub id: String,
}

/// A `Person` or `Organization` credited with a work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Party {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Publisher {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<ImageObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageObject {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    pub url: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub same_as: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebSite {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    pub url: String,
    pub description: String,
}

/// Build a `BreadcrumbList` from a navigation trail.
///
/// Positions run 1..=N in trail order. Every entry but the last must carry
/// an `href`, which is resolved against `base`; the last entry is the
/// current page and never gets an `item`. A trail of more than one entry
/// must start at `base` itself.
pub fn breadcrumb_schema(base: &Url, trail: &BreadcrumbTrail) -> Result<JsonLd> {
    if trail.is_empty() {
        return Err(Error::EmptyContent(
            "breadcrumb trail has no entries".to_string(),
        ));
    }

    let last = trail.len() - 1;
    let mut elements = Vec::with_capacity(trail.len());

    for (i, crumb) in trail.iter().enumerate() {
        if crumb.name.trim().is_empty() {
            return Err(Error::InvalidTrail(format!("entry {} has no name", i + 1)));
        }

        let item = if i == last {
            None
        } else {
            let href = crumb.href.as_deref().ok_or_else(|| {
                Error::InvalidTrail(format!(
                    "entry {} ('{}') has no href; only the current page may omit it",
                    i + 1,
                    crumb.name
                ))
            })?;
            let url = absolute_url(base, href).ok_or_else(|| {
                Error::InvalidTrail(format!(
                    "entry {} ('{}') has an unusable href '{}'",
                    i + 1,
                    crumb.name,
                    href
                ))
            })?;
            if i == 0 && url != *base {
                return Err(Error::InvalidTrail(format!(
                    "trail starts at '{}' instead of the site root {}",
                    crumb.name, base
                )));
            }
            Some(url.to_string())
        };

        elements.push(ListItem {
            kind: "ListItem",
            position: i + 1,
            name: crumb.name.clone(),
            item,
        });
    }

    Ok(JsonLd::BreadcrumbList(BreadcrumbList {
        context: SCHEMA_CONTEXT,
        kind: "BreadcrumbList",
        item_list_element: elements,
    }))
}

/// Build a `FAQPage` with one `Question` per item, in order.
///
/// Question and answer text is copied verbatim.
pub fn faq_schema(items: &[FaqItem]) -> Result<JsonLd> {
    if items.is_empty() {
        return Err(Error::EmptyContent("FAQ page has no questions".to_string()));
    }

    let mut questions = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if item.question.trim().is_empty() {
            return Err(Error::EmptyContent(format!("FAQ item {} has no question", i + 1)));
        }
        if item.answer.trim().is_empty() {
            return Err(Error::EmptyContent(format!(
                "FAQ item {} ('{}') has no answer",
                i + 1,
                item.question
            )));
        }

        questions.push(Question {
            kind: "Question",
            name: item.question.clone(),
            accepted_answer: Answer {
                kind: "Answer",
                text: item.answer.clone(),
            },
        });
    }

    Ok(JsonLd::FaqPage(FaqPage {
        context: SCHEMA_CONTEXT,
        kind: "FAQPage",
        main_entity: questions,
    }))
}

/// Build an `Article` or `BlogPosting` for a page on `site`.
///
/// `dateModified` falls back to `datePublished`. Without a named author the
/// site's organization is credited.
pub fn article_schema(site: &SiteInfo, meta: &ArticleMeta) -> Result<JsonLd> {
    if meta.title.trim().is_empty() {
        return Err(Error::EmptyContent(format!(
            "article at '{}' has no title",
            meta.path
        )));
    }

    let date_published = normalize_date(&meta.published_date)?;
    let date_modified = match &meta.modified_date {
        Some(modified) => normalize_date(modified)?,
        None => date_published.clone(),
    };

    let url = page_url(&site.base_url, &meta.path)?;

    let author = match &meta.author {
        Some(name) => Party {
            kind: "Person",
            name: name.clone(),
            url: None,
        },
        None => Party {
            kind: "Organization",
            name: site.name.clone(),
            url: Some(site.base_url.to_string()),
        },
    };

    let image = meta
        .image
        .as_deref()
        .map(|img| page_url(&site.base_url, img))
        .transpose()?;

    let kind = match meta.kind {
        ArticleKind::Article => "Article",
        ArticleKind::BlogPosting => "BlogPosting",
    };

    Ok(JsonLd::Article(Article {
        context: SCHEMA_CONTEXT,
        kind,
        headline: meta.title.clone(),
        description: meta.description.clone(),
        url: url.clone(),
        main_entity_of_page: WebPageRef {
            kind: "WebPage",
            id: url,
        },
        date_published,
        date_modified,
        author,
        publisher: publisher(site)?,
        image,
    }))
}

/// `Organization` describing the site owner
pub fn organization_schema(site: &SiteInfo) -> Result<JsonLd> {
    let logo = site
        .logo
        .as_deref()
        .map(|logo| page_url(&site.base_url, logo))
        .transpose()?;

    Ok(JsonLd::Organization(Organization {
        context: SCHEMA_CONTEXT,
        kind: "Organization",
        name: site.name.clone(),
        url: site.base_url.to_string(),
        description: site.description.clone(),
        logo,
        same_as: site.same_as.clone(),
    }))
}

/// `WebSite` describing the site itself
pub fn website_schema(site: &SiteInfo) -> JsonLd {
    JsonLd::WebSite(WebSite {
        context: SCHEMA_CONTEXT,
        kind: "WebSite",
        name: site.name.clone(),
        url: site.base_url.to_string(),
        description: site.description.clone(),
    })
}

fn publisher(site: &SiteInfo) -> Result<Publisher> {
    let logo = match site.logo.as_deref() {
        Some(logo) => Some(ImageObject {
            kind: "ImageObject",
            url: page_url(&site.base_url, logo)?,
        }),
        None => None,
    };

    Ok(Publisher {
        kind: "Organization",
        name: site.name.clone(),
        url: site.base_url.to_string(),
        logo,
    })
}

/// Resolve an href against the site base.
///
/// Absolute URLs pass through and protocol-relative ones (`//cdn.host/x`)
/// take the base scheme. Other paths are joined under the base path, so a
/// base of `https://x.dev/docs/` maps `/faq` to `https://x.dev/docs/faq`.
/// A relative href that lands outside the base path gives `None`.
pub fn absolute_url(base: &Url, href: &str) -> Option<Url> {
    if let Ok(url) = Url::parse(href) {
        return Some(url);
    }
    if href.starts_with("//") {
        return base.join(href).ok();
    }

    let url = base.join(href.trim_start_matches('/')).ok()?;
    url.as_str().starts_with(base.as_str()).then_some(url)
}

fn page_url(base: &Url, href: &str) -> Result<String> {
    absolute_url(base, href)
        .map(|u| u.to_string())
        .ok_or_else(|| Error::InvalidData(format!("Cannot resolve URL '{}'", href)))
}

/// Parse an authored date (`YYYY-MM-DD` or RFC 3339) to its UTC calendar day
pub fn parse_content_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| invalid_date(s))
}

/// Parse an authored date to an instant. A plain date stands for the start
/// of that day in UTC.
pub fn parse_content_instant(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid_date(s))
}

/// Normalize an authored date to ISO 8601.
///
/// Plain dates stay `YYYY-MM-DD`; date-times become UTC RFC 3339 with
/// second precision.
pub fn normalize_date(s: &str) -> Result<String> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.format("%Y-%m-%d").to_string());
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| {
            dt.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        })
        .map_err(|_| invalid_date(s))
}

fn invalid_date(s: &str) -> Error {
    Error::InvalidDate(format!("'{}' is not YYYY-MM-DD or RFC 3339", s))
}
