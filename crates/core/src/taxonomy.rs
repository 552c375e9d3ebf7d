use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Categorized, slugify};

/// Display metadata for a content category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    /// Design-system color token, e.g. "emerald"
    pub color_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_token: Option<String>,
}

impl Category {
    pub fn new(label: impl Into<String>, color_token: impl Into<String>) -> Self {
        Category {
            label: label.into(),
            color_token: color_token.into(),
            icon_token: None,
        }
    }

    pub fn with_icon(mut self, icon_token: impl Into<String>) -> Self {
        self.icon_token = Some(icon_token.into());
        self
    }

    /// Stable group key, also used for filter query values
    pub fn key(&self) -> String {
        slugify(&self.label)
    }
}

/// The fixed vocabulary of categories shared by every page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
    categories: Vec<Category>,
}

impl Taxonomy {
    /// Build a taxonomy, rejecting labels whose keys collide
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        for (i, category) in categories.iter().enumerate() {
            if category.label.trim().is_empty() {
                return Err(Error::InvalidData(format!(
                    "Category #{} has an empty label",
                    i + 1
                )));
            }

            let key = category.key();
            if let Some(existing) = categories[..i].iter().find(|c| c.key() == key) {
                return Err(Error::InvalidData(format!(
                    "Duplicate category '{}' (collides with '{}')",
                    category.label, existing.label
                )));
            }
        }

        Ok(Taxonomy { categories })
    }

    /// Built-in vocabulary for the Sardis site
    pub fn standard() -> Self {
        Taxonomy {
            categories: vec![
                Category::new("General", "slate").with_icon("help-circle"),
                Category::new("Security", "red").with_icon("shield"),
                Category::new("Payments", "emerald").with_icon("credit-card"),
                Category::new("Developers", "blue").with_icon("code"),
                Category::new("Pricing", "amber").with_icon("tag"),
                Category::new("Feature", "emerald").with_icon("sparkles"),
                Category::new("Improvement", "blue").with_icon("trending-up"),
                Category::new("Fix", "orange").with_icon("wrench"),
                Category::new("Announcement", "purple").with_icon("megaphone"),
                Category::new("Engineering", "cyan").with_icon("cpu"),
                Category::new("Product", "pink").with_icon("package"),
            ],
        }
    }

    /// Look up a category by its label.
    ///
    /// Labels match exactly; a typo in content is an error rather than a
    /// fallback style.
    pub fn resolve(&self, label: &str) -> Result<&Category> {
        self.categories
            .iter()
            .find(|c| c.label == label)
            .ok_or_else(|| Error::UnknownCategory(label.to_string()))
    }

    /// Look up a category by its key (the slug of its label)
    pub fn by_key(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key() == key)
    }

    /// Group records by category, in the order categories are first seen.
    ///
    /// Records keep their input order within each group.
    pub fn group_by_category<'r, R: Categorized>(
        &self,
        records: &'r [R],
    ) -> Result<Vec<(&Category, Vec<&'r R>)>> {
        let mut groups: Vec<(&Category, Vec<&'r R>)> = Vec::new();

        for record in records {
            let category = self.resolve(record.category())?;
            match groups.iter_mut().find(|(c, _)| c.label == category.label) {
                Some((_, members)) => members.push(record),
                None => groups.push((category, vec![record])),
            }
        }

        Ok(groups)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
