//! Template entity and naming rules.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// A single immutable version of a named template.
///
/// The same shape is used for version records and for the latest pointer,
/// which mirrors the newest version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Template name, unique per store.
    pub name: String,

    /// Version number, starting at 1.
    pub version: u32,

    /// Template text, possibly containing the `<input>` placeholder.
    #[serde(rename = "template")]
    pub content: String,
}

impl Template {
    /// Create the first version of a template.
    #[must_use]
    pub fn first(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            content: content.into(),
        }
    }

    /// Build the version following this one with new content.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VersionOverflow`] if this is version `u32::MAX`.
    pub fn next(&self, content: impl Into<String>) -> Result<Self> {
        let version = self
            .version
            .checked_add(1)
            .ok_or_else(|| StoreError::VersionOverflow(self.name.clone()))?;
        Ok(Self {
            name: self.name.clone(),
            version,
            content: content.into(),
        })
    }

    /// Summary of this template for listings.
    #[must_use]
    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            name: self.name.clone(),
            version: self.version,
        }
    }
}

/// Name and latest version of a stored template.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateSummary {
    /// Template name.
    pub name: String,
    /// Latest version.
    pub version: u32,
}

/// Check that a name can be used as a storage key.
///
/// Names end up as file names next to version records named
/// `<name>_v<N>.json`, so a name may not itself end in such a suffix.
///
/// # Errors
///
/// Returns [`StoreError::InvalidName`] describing the first violated rule.
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        Some("name cannot be empty")
    } else if name.trim() != name {
        Some("name cannot start or end with whitespace")
    } else if name.starts_with('.') {
        Some("name cannot start with '.'")
    } else if name.contains(['/', '\\']) {
        Some("name cannot contain path separators")
    } else if name.chars().any(char::is_control) {
        Some("name cannot contain control characters")
    } else if split_version_suffix(name).is_some() {
        Some("name cannot end with a version suffix like '_v2'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Split `name_v7` into `("name", 7)`.
pub(crate) fn split_version_suffix(stem: &str) -> Option<(&str, u32)> {
    let (name, digits) = stem.rsplit_once("_v")?;
    if name.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(|version| (name, version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_and_next() {
        let v1 = Template::first("sum", "Q: <input>");
        assert_eq!(v1.version, 1);

        let v2 = v1.next("Q2: <input>").unwrap();
        assert_eq!(v2.name, "sum");
        assert_eq!(v2.version, 2);
        assert_eq!(v2.content, "Q2: <input>");
    }

    #[test]
    fn test_next_at_max_version() {
        let mut last = Template::first("sum", "x");
        last.version = u32::MAX;
        assert!(matches!(last.next("y"), Err(StoreError::VersionOverflow(name)) if name == "sum"));
    }

    #[test]
    fn test_record_field_names() {
        let json = serde_json::to_value(Template::first("a", "b")).unwrap();
        assert_eq!(json, serde_json::json!({"name": "a", "version": 1, "template": "b"}));
    }

    #[test]
    fn test_valid_names() {
        for name in ["sum", "code-review", "my template", "v2", "a_b", "x_version"] {
            assert!(validate_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "  ", " sum", "../etc", "a/b", "a\\b", ".hidden", "tab\there", "sum_v2"] {
            assert!(
                matches!(validate_name(name), Err(StoreError::InvalidName { .. })),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_split_version_suffix() {
        assert_eq!(split_version_suffix("sum_v3"), Some(("sum", 3)));
        assert_eq!(split_version_suffix("a_v_v12"), Some(("a_v", 12)));
        assert_eq!(split_version_suffix("sum"), None);
        assert_eq!(split_version_suffix("sum_v"), None);
        assert_eq!(split_version_suffix("sum_vx"), None);
        assert_eq!(split_version_suffix("_v1"), None);
    }
}
