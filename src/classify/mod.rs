//! Path classification.
//!
//! The outermost directory of a changed path that names any rule's marker is
//! its type folder. Only rules for that folder are tried, in [`RuleSet`] order,
//! and the first whose suffix matches decides the outcome. Anything nested
//! deeper (a static resource holding an `lwc/` tree, say) belongs to the outer
//! component. Rules are built once at startup and never mutated afterwards.
mod rules;

use crate::manifest::MetadataRecord;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use rules::{builtin_rules, BUILTIN_CATEGORIES};

/// How a component name is derived from a matched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extraction {
    /// File name with the rule suffix removed.
    StripSuffix,
    /// First path segment after the marker; must be a directory.
    BundleFolder,
    /// `<Object>.<file stem>` from `<marker>/<Object>/<child folder>/.../<file>`.
    ObjectChild,
    /// Everything below the marker with the suffix removed.
    FolderPath,
    /// First path segment after the marker, cut at its first dot.
    FirstDot,
}

/// Precedence group a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCategory {
    SingleFile,
    Bundle,
    ObjectChild,
    Folder,
    Special,
    Configured,
}

/// One row of the classification table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRule {
    pub category: RuleCategory,
    pub marker: String,
    pub suffix: Option<String>,
    pub metadata_type: String,
    pub extraction: Extraction,
}

impl ClassificationRule {
    /// Build a project-configured rule, validating its fields.
    pub fn configured(
        marker: &str,
        suffix: Option<&str>,
        metadata_type: &str,
        extraction: Extraction,
    ) -> Result<Self> {
        if marker.trim().is_empty() || marker.contains('/') || marker.contains('\\') {
            return Err(anyhow!(
                "rule marker must be a single directory name (got {marker:?})"
            ));
        }
        if metadata_type.trim().is_empty() {
            return Err(anyhow!("rule for marker {marker:?} has an empty type"));
        }
        if suffix.is_some_and(str::is_empty) {
            return Err(anyhow!("rule for marker {marker:?} has an empty suffix"));
        }
        if suffix.is_none() && extraction == Extraction::ObjectChild {
            return Err(anyhow!(
                "object_child rule for marker {marker:?} requires a suffix"
            ));
        }
        Ok(Self {
            category: RuleCategory::Configured,
            marker: marker.to_string(),
            suffix: suffix.map(str::to_string),
            metadata_type: metadata_type.to_string(),
            extraction,
        })
    }

    /// Whether this rule applies to `segments` whose type folder sits at `type_folder`.
    fn matches(&self, segments: &[&str], type_folder: usize) -> bool {
        if segments[type_folder] != self.marker {
            return false;
        }
        match (self.suffix.as_deref(), segments.last()) {
            (Some(suffix), Some(file_name)) => file_name.ends_with(suffix),
            _ => true,
        }
    }

    fn strip_suffix<'a>(&self, value: &'a str) -> &'a str {
        match self.suffix.as_deref() {
            Some(suffix) => value.strip_suffix(suffix).unwrap_or(value),
            None => value,
        }
    }

    fn extract_name(&self, segments: &[&str], type_folder: usize) -> Option<String> {
        let below = &segments[type_folder + 1..];
        let file_name = *segments.last()?;
        let name = match self.extraction {
            Extraction::StripSuffix => self.strip_suffix(file_name).to_string(),
            Extraction::BundleFolder => {
                // Loose files next to the bundles (jsconfig.json etc.) are not bundles.
                if below.len() < 2 {
                    return None;
                }
                below[0].to_string()
            }
            Extraction::ObjectChild => {
                // <Object>/<child folder>/<file>; a file directly in the object folder is not a child.
                if below.len() < 3 {
                    return None;
                }
                let stem = self.strip_suffix(file_name);
                if stem.is_empty() {
                    return None;
                }
                format!("{}.{}", below[0], stem)
            }
            Extraction::FolderPath => {
                let relative = below.join("/");
                self.strip_suffix(&relative).to_string()
            }
            Extraction::FirstDot => {
                let first = below.first()?;
                first.split('.').next().unwrap_or_default().to_string()
            }
        };
        if name.is_empty() || name.ends_with('/') {
            return None;
        }
        Some(name)
    }
}

impl fmt::Display for ClassificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/*{} -> {}",
            self.marker,
            self.suffix.as_deref().unwrap_or(""),
            self.metadata_type
        )
    }
}

/// Detailed outcome of classifying one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Matched(MetadataRecord),
    /// A rule matched but the path shape yielded no usable name.
    Malformed { metadata_type: String },
    Unmatched,
}

impl Classification {
    pub fn into_record(self) -> Option<MetadataRecord> {
        match self {
            Classification::Matched(record) => Some(record),
            _ => None,
        }
    }
}

/// Ordered classification table.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<ClassificationRule>,
}

impl RuleSet {
    /// The built-in table with no project additions.
    pub fn builtin() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }

    /// Use `rules` verbatim, in the given order.
    pub fn from_rules(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    /// Append project-configured rules after every built-in category.
    pub fn with_extra(mut self, extra: impl IntoIterator<Item = ClassificationRule>) -> Self {
        self.rules.extend(extra);
        self
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    /// Classify a path, returning `None` when no rule produces a record.
    pub fn classify(&self, path: &str) -> Option<MetadataRecord> {
        self.inspect(path).into_record()
    }

    /// Classify a path and report why it did or did not produce a record.
    pub fn inspect(&self, path: &str) -> Classification {
        let normalized = path.replace('\\', "/");
        let segments: Vec<&str> = normalized
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect();
        let Some(type_folder) = self.type_folder(&segments) else {
            return Classification::Unmatched;
        };
        for rule in &self.rules {
            if !rule.matches(&segments, type_folder) {
                continue;
            }
            return match rule.extract_name(&segments, type_folder) {
                Some(name) => Classification::Matched(MetadataRecord::new(
                    rule.metadata_type.clone(),
                    name,
                )),
                None => {
                    tracing::debug!(path, rule = %rule, "matched rule produced no name");
                    Classification::Malformed {
                        metadata_type: rule.metadata_type.clone(),
                    }
                }
            };
        }
        Classification::Unmatched
    }

    /// Index of the outermost directory that is some rule's marker.
    fn type_folder(&self, segments: &[&str]) -> Option<usize> {
        let (_, dirs) = segments.split_last()?;
        dirs.iter()
            .position(|segment| self.rules.iter().any(|rule| rule.marker == *segment))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
