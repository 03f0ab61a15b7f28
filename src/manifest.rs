//! Manifest aggregation and rendering.
//!
//! Records are grouped per metadata type and rendered into the package
//! manifest the platform CLI accepts as a retrieve selector. Rendering is
//! byte-stable: types are emitted alphabetically and names case-insensitively.
use quick_xml::escape::escape;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// Namespace declared on the manifest root element.
pub const MANIFEST_NAMESPACE: &str = "http://soap.sforce.com/2006/04/metadata";
/// Root element name of the manifest document.
pub const MANIFEST_ROOT: &str = "Package";
/// Default value for the trailing `<version>` element.
pub const DEFAULT_API_VERSION: &str = "58.0";

const INDENT: &str = "    ";

/// A classified component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetadataRecord {
    pub metadata_type: String,
    pub name: String,
}

impl MetadataRecord {
    pub fn new(metadata_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata_type: metadata_type.into(),
            name: name.into(),
        }
    }
}

/// Unique component names keyed by metadata type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestGrouping {
    types: BTreeMap<String, BTreeSet<String>>,
}

impl ManifestGrouping {
    /// Add a record; returns `false` when the component was already present.
    pub fn insert(&mut self, record: MetadataRecord) -> bool {
        self.types
            .entry(record.metadata_type)
            .or_default()
            .insert(record.name)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Number of distinct metadata types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Number of distinct components across all types.
    pub fn component_count(&self) -> usize {
        self.types.values().map(BTreeSet::len).sum()
    }

    pub fn names(&self, metadata_type: &str) -> Option<&BTreeSet<String>> {
        self.types.get(metadata_type)
    }

    /// Types in emission order, each with its names sorted case-insensitively.
    pub fn sorted_blocks(&self) -> Vec<(&str, Vec<&str>)> {
        self.types
            .iter()
            .map(|(metadata_type, names)| (metadata_type.as_str(), sorted_names(names)))
            .collect()
    }
}

/// Group records by type, collapsing duplicate components.
pub fn aggregate<I>(records: I) -> ManifestGrouping
where
    I: IntoIterator<Item = MetadataRecord>,
{
    let mut grouping = ManifestGrouping::default();
    for record in records {
        grouping.insert(record);
    }
    grouping
}

fn sorted_names(names: &BTreeSet<String>) -> Vec<&str> {
    let mut sorted: Vec<&str> = names.iter().map(String::as_str).collect();
    // Byte order breaks ties so names differing only in case stay stable.
    sorted.sort_by_cached_key(|name| (name.to_lowercase(), *name));
    sorted
}

/// Render the manifest document for `grouping`.
pub fn serialize(grouping: &ManifestGrouping, api_version: &str) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(out, "<{MANIFEST_ROOT} xmlns=\"{MANIFEST_NAMESPACE}\">");
    for (metadata_type, names) in grouping.sorted_blocks() {
        let _ = writeln!(out, "{INDENT}<types>");
        for name in names {
            let _ = writeln!(out, "{INDENT}{INDENT}<members>{}</members>", escape(name));
        }
        let _ = writeln!(out, "{INDENT}{INDENT}<name>{}</name>", escape(metadata_type));
        let _ = writeln!(out, "{INDENT}</types>");
    }
    let _ = writeln!(out, "{INDENT}<version>{}</version>", escape(api_version));
    let _ = writeln!(out, "</{MANIFEST_ROOT}>");
    out
}
