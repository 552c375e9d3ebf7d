use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use url::Url;

use crate::taxonomy::Taxonomy;

/// Complete site content, loaded from site.toml
#[derive(Debug, Clone)]
pub struct Site {
    pub info: SiteInfo,
    pub taxonomy: Taxonomy,
    pub faqs: Vec<FaqItem>,
    pub posts: Vec<BlogPost>,
    pub releases: Vec<ChangelogRelease>,
    pub comparisons: Vec<ComparisonRow>,
}

impl Site {
    /// Every record on the site, in page order (FAQ, blog, changelog, comparison)
    pub fn records(&self) -> Vec<ContentRecord<'_>> {
        self.faqs
            .iter()
            .map(ContentRecord::Faq)
            .chain(self.posts.iter().map(ContentRecord::BlogPost))
            .chain(self.releases.iter().map(ContentRecord::ChangelogRelease))
            .chain(self.comparisons.iter().map(ContentRecord::ComparisonRow))
            .collect()
    }

    pub fn post(&self, slug: &str) -> Option<&BlogPost> {
        self.posts.iter().find(|p| p.slug == slug)
    }
}

/// Site-wide metadata used for canonical URLs and publisher info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInfo {
    pub name: String,
    pub base_url: Url,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// Social profile URLs for the Organization schema
    #[serde(default)]
    pub same_as: Vec<String>,
}

/// Anything that belongs to a taxonomy category
pub trait Categorized {
    fn category(&self) -> &str;
}

impl<T: Categorized + ?Sized> Categorized for &T {
    fn category(&self) -> &str {
        (**self).category()
    }
}

/// Single question on the FAQ page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqItem {
    pub category: String,
    pub question: String,
    pub answer: String,
}

/// Blog post with a markdown body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub category: String,
    /// As authored: `YYYY-MM-DD` or RFC 3339
    pub published: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub body: String,
}

impl BlogPost {
    pub fn path(&self) -> String {
        format!("/blog/{}", self.slug)
    }

    /// Article metadata for structured data
    pub fn article_meta(&self) -> ArticleMeta {
        ArticleMeta {
            title: self.title.clone(),
            description: self.description.clone(),
            path: self.path(),
            published_date: self.published.clone(),
            modified_date: self.modified.clone(),
            kind: ArticleKind::BlogPosting,
            author: self.author.clone(),
            image: self.image.clone(),
        }
    }
}

/// One release on the changelog page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogRelease {
    pub version: String,
    pub date: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub changes: Vec<String>,
}

impl ChangelogRelease {
    /// URL-safe anchor for the release, e.g. "1.2.0" -> "v1-2-0"
    pub fn slug(&self) -> String {
        let version = self.version.trim_start_matches(['v', 'V']);
        format!("v{}", slugify(version))
    }
}

/// One row of the comparison table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub category: String,
    pub feature: String,
    pub sardis: String,
    pub alternative: String,
}

impl Categorized for FaqItem {
    fn category(&self) -> &str {
        &self.category
    }
}

impl Categorized for BlogPost {
    fn category(&self) -> &str {
        &self.category
    }
}

impl Categorized for ChangelogRelease {
    fn category(&self) -> &str {
        &self.category
    }
}

impl Categorized for ComparisonRow {
    fn category(&self) -> &str {
        &self.category
    }
}

/// Page type a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Faq,
    Blog,
    Changelog,
    Comparison,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Faq => "faq",
            ContentKind::Blog => "blog",
            ContentKind::Changelog => "changelog",
            ContentKind::Comparison => "comparison",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content record of any kind, borrowed from the site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRecord<'a> {
    Faq(&'a FaqItem),
    BlogPost(&'a BlogPost),
    ChangelogRelease(&'a ChangelogRelease),
    ComparisonRow(&'a ComparisonRow),
}

impl<'a> ContentRecord<'a> {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentRecord::Faq(_) => ContentKind::Faq,
            ContentRecord::BlogPost(_) => ContentKind::Blog,
            ContentRecord::ChangelogRelease(_) => ContentKind::Changelog,
            ContentRecord::ComparisonRow(_) => ContentKind::Comparison,
        }
    }

    /// Assign a stable key to every record.
    ///
    /// Blog posts and releases are keyed by slug. FAQ items and comparison
    /// rows are keyed by their position within their category, counted
    /// separately per content kind, so the same input order always yields
    /// the same keys.
    pub fn keyed<I>(records: I) -> Vec<(RecordKey, ContentRecord<'a>)>
    where
        I: IntoIterator<Item = ContentRecord<'a>>,
    {
        let mut positions: HashMap<(ContentKind, String), usize> = HashMap::new();

        records
            .into_iter()
            .map(|record| {
                let key = match record {
                    ContentRecord::BlogPost(post) => RecordKey::Slug(post.slug.clone()),
                    ContentRecord::ChangelogRelease(release) => RecordKey::Slug(release.slug()),
                    ContentRecord::Faq(_) | ContentRecord::ComparisonRow(_) => {
                        let kind = record.kind();
                        let category = record.category().to_string();
                        let next = positions.entry((kind, category.clone())).or_insert(0);
                        let index = *next;
                        *next += 1;
                        RecordKey::Position {
                            kind,
                            category,
                            index,
                        }
                    }
                };
                (key, record)
            })
            .collect()
    }
}

impl Categorized for ContentRecord<'_> {
    fn category(&self) -> &str {
        match self {
            ContentRecord::Faq(r) => &r.category,
            ContentRecord::BlogPost(r) => &r.category,
            ContentRecord::ChangelogRelease(r) => &r.category,
            ContentRecord::ComparisonRow(r) => &r.category,
        }
    }
}

/// Stable identity of a record, used for UI state and HTML anchors
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    Slug(String),
    Position {
        kind: ContentKind,
        category: String,
        index: usize,
    },
}

impl RecordKey {
    pub fn position(kind: ContentKind, category: impl Into<String>, index: usize) -> Self {
        RecordKey::Position {
            kind,
            category: category.into(),
            index,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Slug(slug) => f.write_str(slug),
            RecordKey::Position {
                kind,
                category,
                index,
            } => write!(f, "{}-{}-{}", kind, slugify(category), index),
        }
    }
}

/// One entry of a breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crumb {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Crumb {
    pub fn link(name: impl Into<String>, href: impl Into<String>) -> Self {
        Crumb {
            name: name.into(),
            href: Some(href.into()),
        }
    }

    /// The current page, which carries no link
    pub fn current(name: impl Into<String>) -> Self {
        Crumb {
            name: name.into(),
            href: None,
        }
    }
}

/// Ordered navigation path from the site root to the current page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreadcrumbTrail(pub Vec<Crumb>);

impl BreadcrumbTrail {
    pub fn new(crumbs: Vec<Crumb>) -> Self {
        BreadcrumbTrail(crumbs)
    }

    /// Derive a trail from a route path.
    ///
    /// `/docs/faq` becomes Home (`/`), Docs (`/docs`), then the current
    /// page. Segment names come from `titles` when present, otherwise the
    /// segment is title-cased.
    pub fn for_path(path: &str, titles: &HashMap<String, String>) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut crumbs = Vec::with_capacity(segments.len() + 1);

        if segments.is_empty() {
            crumbs.push(Crumb::current("Home"));
            return BreadcrumbTrail(crumbs);
        }

        crumbs.push(Crumb::link("Home", "/"));

        let mut href = String::new();
        for (i, segment) in segments.iter().enumerate() {
            href.push('/');
            href.push_str(segment);

            let name = titles
                .get(&href)
                .cloned()
                .unwrap_or_else(|| title_case(segment));

            if i + 1 == segments.len() {
                crumbs.push(Crumb::current(name));
            } else {
                crumbs.push(Crumb::link(name, href.clone()));
            }
        }

        BreadcrumbTrail(crumbs)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Crumb> {
        self.0.iter()
    }
}

/// Schema.org type used for an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArticleKind {
    Article,
    BlogPosting,
}

/// Metadata describing an article page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMeta {
    pub title: String,
    pub description: String,
    pub path: String,
    pub published_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<String>,
    pub kind: ArticleKind,
    /// Person name; the site's organization is credited when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Lowercase, ASCII-only, hyphen-separated slug
pub fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' || c == '.' || c == '/' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn title_case(segment: &str) -> String {
    segment
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
