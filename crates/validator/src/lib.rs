// Authoring-time content checks, run before anything is published

use chrono::{DateTime, NaiveDate, Utc};
use sardis_site_core::{Categorized, ContentKind, ContentRecord, RecordKey, Site};
use sardis_site_generator::{
    generate_site,
    schema::{parse_content_date, parse_content_instant},
};
use std::collections::HashSet;
use tracing::debug;

/// Search engines truncate meta descriptions past roughly this length
pub const MAX_DESCRIPTION_LEN: usize = 160;
/// Longest `headline` Google shows for an Article
pub const MAX_HEADLINE_LEN: usize = 110;

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check a whole site and collect every problem instead of stopping at the first.
///
/// Nothing may be dated after `now`. A plain date counts from the start of
/// its day in UTC.
pub fn validate_site(site: &Site, now: DateTime<Utc>) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_categories(site, &mut report);
    check_unique_keys(site, &mut report);
    check_dates(site, now, &mut report);
    check_faqs(site, &mut report);
    check_lengths(site, &mut report);

    // Only worth composing pages once the content itself is sound
    if report.is_valid()
        && let Err(e) = generate_site(site)
    {
        report.errors.push(format!("Site build failed: {}", e));
    }

    report.info.push(format!(
        "{} FAQ items, {} posts, {} releases, {} comparison rows",
        site.faqs.len(),
        site.posts.len(),
        site.releases.len(),
        site.comparisons.len()
    ));
    report
        .info
        .push(format!("{} categories registered", site.taxonomy.len()));

    debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validated site"
    );
    report
}

fn check_categories(site: &Site, report: &mut ValidationReport) {
    let mut used = HashSet::new();

    for (key, record) in ContentRecord::keyed(site.records()) {
        match site.taxonomy.resolve(record.category()) {
            Ok(category) => {
                used.insert(category.label.clone());
            }
            Err(e) => report
                .errors
                .push(format!("{} '{}': {}", record.kind(), describe(&key, record), e)),
        }
    }

    for category in site.taxonomy.categories() {
        if !used.contains(&category.label) {
            report
                .warnings
                .push(format!("Category '{}' has no content", category.label));
        }
    }
}

fn check_unique_keys(site: &Site, report: &mut ValidationReport) {
    let mut seen: HashSet<(ContentKind, RecordKey)> = HashSet::new();

    for (key, record) in ContentRecord::keyed(site.records()) {
        if !seen.insert((record.kind(), key.clone())) {
            report.errors.push(format!(
                "Duplicate {} key '{}'; each must be unique",
                record.kind(),
                key
            ));
        }
    }
}

fn check_dates(site: &Site, now: DateTime<Utc>, report: &mut ValidationReport) {
    for post in &site.posts {
        let published = check_date(&post.published, "published", &post.slug, now, report);

        if let Some(modified) = &post.modified {
            let modified = check_date(modified, "modified", &post.slug, now, report);
            if let (Some(published), Some(modified)) = (published, modified)
                && modified < published
            {
                report.errors.push(format!(
                    "post '{}': modified date {} is before published date {}",
                    post.slug, modified, published
                ));
            }
        }
    }

    for release in &site.releases {
        check_date(&release.date, "date", &release.slug(), now, report);
    }
}

fn check_date(
    value: &str,
    field: &str,
    owner: &str,
    now: DateTime<Utc>,
    report: &mut ValidationReport,
) -> Option<NaiveDate> {
    let date = match parse_content_date(value) {
        Ok(date) => date,
        Err(e) => {
            report.errors.push(format!("'{}': {}: {}", owner, field, e));
            return None;
        }
    };

    if let Ok(instant) = parse_content_instant(value)
        && instant > now
    {
        report.errors.push(format!(
            "'{}': {} date {} is in the future",
            owner,
            field,
            value.trim()
        ));
    }
    Some(date)
}

fn check_faqs(site: &Site, report: &mut ValidationReport) {
    for (i, faq) in site.faqs.iter().enumerate() {
        if faq.question.trim().is_empty() {
            report.errors.push(format!("FAQ item {} has no question", i + 1));
        }
        if faq.answer.trim().is_empty() {
            report
                .errors
                .push(format!("FAQ item {} ('{}') has no answer", i + 1, faq.question));
        }
    }
}

fn check_lengths(site: &Site, report: &mut ValidationReport) {
    if site.info.description.chars().count() > MAX_DESCRIPTION_LEN {
        report.warnings.push(format!(
            "Site description is longer than {} characters",
            MAX_DESCRIPTION_LEN
        ));
    }

    for post in &site.posts {
        if post.description.chars().count() > MAX_DESCRIPTION_LEN {
            report.warnings.push(format!(
                "post '{}': description is longer than {} characters",
                post.slug, MAX_DESCRIPTION_LEN
            ));
        }
        if post.title.chars().count() > MAX_HEADLINE_LEN {
            report.warnings.push(format!(
                "post '{}': title is longer than {} characters",
                post.slug, MAX_HEADLINE_LEN
            ));
        }
        if post.body.trim().is_empty() {
            report
                .warnings
                .push(format!("post '{}': body is empty", post.slug));
        }
    }
}

fn describe(key: &RecordKey, record: ContentRecord<'_>) -> String {
    match record {
        ContentRecord::Faq(faq) => faq.question.clone(),
        ContentRecord::ComparisonRow(row) => row.feature.clone(),
        ContentRecord::BlogPost(_) | ContentRecord::ChangelogRelease(_) => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sardis_site_core::parse_site_toml_str;

    const SITE: &str = r##"
[site]
name = "Sardis"
base_url = "https://sardis.sh"
description = "Payments for AI agents"

[[category]]
label = "General"
color = "slate"

[[category]]
label = "Announcement"
color = "purple"

[[faq]]
category = "General"
question = "What is Sardis?"
answer = "A payment layer."

[[post]]
slug = "hello"
title = "Hello"
description = "First post"
category = "Announcement"
published = "2025-02-01"
body = "Welcome."
"##;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn site() -> Site {
        parse_site_toml_str(SITE).unwrap()
    }

    #[test]
    fn test_valid_site() {
        let report = validate_site(&site(), now());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
        assert!(report.info[0].contains("1 FAQ items, 1 posts"));
    }

    #[test]
    fn test_unknown_category_is_error() {
        let mut site = site();
        site.faqs[0].category = "Genral".to_string();

        let report = validate_site(&site, now());
        assert!(!report.is_valid());
        assert!(report.errors[0].contains("faq 'What is Sardis?'"));
        assert!(report.errors[0].contains("Unknown category: 'Genral'"));
    }

    #[test]
    fn test_unused_category_is_warning() {
        let mut site = site();
        site.posts.clear();

        let report = validate_site(&site, now());
        assert!(report.is_valid());
        assert_eq!(report.warnings, vec!["Category 'Announcement' has no content"]);
    }

    #[test]
    fn test_duplicate_slug_is_error() {
        let mut site = site();
        let copy = site.posts[0].clone();
        site.posts.push(copy);

        let report = validate_site(&site, now());
        assert!(report.errors.iter().any(|e| e.contains("Duplicate blog key 'hello'")));
    }

    #[test]
    fn test_future_date_is_error() {
        let mut site = site();
        site.posts[0].published = "2025-06-02".to_string();

        let report = validate_site(&site, now());
        assert!(report.errors.iter().any(|e| e.contains("in the future")));
    }

    #[test]
    fn test_today_is_allowed() {
        let mut site = site();
        site.posts[0].published = "2025-06-01T12:00:00Z".to_string();
        assert!(validate_site(&site, now()).is_valid());

        site.posts[0].published = "2025-06-01".to_string();
        assert!(validate_site(&site, now()).is_valid());
    }

    #[test]
    fn test_later_the_same_day_is_future() {
        let mut site = site();
        site.posts[0].published = "2025-06-01T23:00:00Z".to_string();

        let report = validate_site(&site, now());
        assert!(report.errors.iter().any(|e| e.contains("2025-06-01T23:00:00Z is in the future")));

        // 13:30 in UTC+2 is 11:30 UTC
        site.posts[0].published = "2025-06-01T13:30:00+02:00".to_string();
        assert!(validate_site(&site, now()).is_valid());
    }

    #[test]
    fn test_unparseable_date_is_error() {
        let mut site = site();
        site.posts[0].published = "yesterday".to_string();

        let report = validate_site(&site, now());
        assert!(report.errors.iter().any(|e| e.contains("Invalid date")));
    }

    #[test]
    fn test_modified_before_published_is_error() {
        let mut site = site();
        site.posts[0].modified = Some("2025-01-01".to_string());

        let report = validate_site(&site, now());
        assert!(report.errors.iter().any(|e| e.contains("before published date")));
    }

    #[test]
    fn test_blank_answer_is_error() {
        let mut site = site();
        site.faqs[0].answer = "   ".to_string();

        let report = validate_site(&site, now());
        assert!(report.errors.iter().any(|e| e.contains("has no answer")));
    }

    #[test]
    fn test_long_description_and_empty_body_warn() {
        let mut site = site();
        site.posts[0].description = "x".repeat(MAX_DESCRIPTION_LEN + 1);
        site.posts[0].body = String::new();

        let report = validate_site(&site, now());
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_release_dates_checked() {
        let mut site = site();
        site.releases.push(sardis_site_core::ChangelogRelease {
            version: "1.0.0".to_string(),
            date: "2025-13-40".to_string(),
            title: "GA".to_string(),
            category: "Announcement".to_string(),
            changes: vec![],
        });

        let report = validate_site(&site, now());
        assert!(report.errors.iter().any(|e| e.starts_with("'v1-0-0': date")));
    }
}
