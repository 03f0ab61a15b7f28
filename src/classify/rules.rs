//! Built-in classification table.
//!
//! Each category is matched in the order it appears in [`BUILTIN_CATEGORIES`],
//! and rules within a category are matched top to bottom. Anything that could
//! shadow a more specific suffix must come after it.
use super::{ClassificationRule, Extraction, RuleCategory};

/// `(marker, suffix, metadata type)` rows for a single category.
type RuleRows = &'static [(&'static str, Option<&'static str>, &'static str)];

/// One file per component; name is the file name minus the suffix.
const SINGLE_FILE: RuleRows = &[
    ("classes", Some(".cls"), "ApexClass"),
    ("triggers", Some(".trigger"), "ApexTrigger"),
    ("pages", Some(".page"), "ApexPage"),
    ("components", Some(".component"), "ApexComponent"),
    ("objects", Some(".object-meta.xml"), "CustomObject"),
    ("layouts", Some(".layout-meta.xml"), "Layout"),
    ("flows", Some(".flow-meta.xml"), "Flow"),
    ("permissionsets", Some(".permissionset-meta.xml"), "PermissionSet"),
    (
        "permissionsetgroups",
        Some(".permissionsetgroup-meta.xml"),
        "PermissionSetGroup",
    ),
    ("profiles", Some(".profile-meta.xml"), "Profile"),
    ("tabs", Some(".tab-meta.xml"), "CustomTab"),
    ("labels", Some(".labels-meta.xml"), "CustomLabels"),
    ("applications", Some(".app-meta.xml"), "CustomApplication"),
    ("flexipages", Some(".flexipage-meta.xml"), "FlexiPage"),
    ("customMetadata", Some(".md-meta.xml"), "CustomMetadata"),
    ("customPermissions", Some(".customPermission-meta.xml"), "CustomPermission"),
    ("quickActions", Some(".quickAction-meta.xml"), "QuickAction"),
    ("globalValueSets", Some(".globalValueSet-meta.xml"), "GlobalValueSet"),
    ("standardValueSets", Some(".standardValueSet-meta.xml"), "StandardValueSet"),
    ("remoteSiteSettings", Some(".remoteSite-meta.xml"), "RemoteSiteSetting"),
    ("namedCredentials", Some(".namedCredential-meta.xml"), "NamedCredential"),
    ("workflows", Some(".workflow-meta.xml"), "Workflow"),
    ("approvalProcesses", Some(".approvalProcess-meta.xml"), "ApprovalProcess"),
    ("sharingRules", Some(".sharingRules-meta.xml"), "SharingRules"),
];

/// Multi-file components addressed by their folder.
const BUNDLE: RuleRows = &[
    ("lwc", None, "LightningComponentBundle"),
    ("aura", None, "AuraDefinitionBundle"),
];

/// Children of `objects/<Object>/...`; name is `<Object>.<file stem>`.
const OBJECT_CHILD: RuleRows = &[
    ("objects", Some(".field-meta.xml"), "CustomField"),
    ("objects", Some(".validationRule-meta.xml"), "ValidationRule"),
    ("objects", Some(".recordType-meta.xml"), "RecordType"),
    ("objects", Some(".listView-meta.xml"), "ListView"),
    ("objects", Some(".webLink-meta.xml"), "WebLink"),
    ("objects", Some(".fieldSet-meta.xml"), "FieldSet"),
    ("objects", Some(".compactLayout-meta.xml"), "CompactLayout"),
    ("objects", Some(".businessProcess-meta.xml"), "BusinessProcess"),
];

/// Foldered types; name keeps the sub-folder path under the marker.
const FOLDER: RuleRows = &[
    ("reports", Some(".reportFolder-meta.xml"), "Report"),
    ("reports", Some(".report-meta.xml"), "Report"),
    ("dashboards", Some(".dashboardFolder-meta.xml"), "Dashboard"),
    ("dashboards", Some(".dashboard-meta.xml"), "Dashboard"),
    ("email", Some(".emailFolder-meta.xml"), "EmailTemplate"),
    ("email", Some(".email-meta.xml"), "EmailTemplate"),
    ("email", Some(".email"), "EmailTemplate"),
    ("documents", Some(".documentFolder-meta.xml"), "Document"),
];

/// Rules whose names come from the first segment under the marker.
const SPECIAL: RuleRows = &[("staticresources", None, "StaticResource")];

/// Category order used by [`builtin_rules`].
pub const BUILTIN_CATEGORIES: [RuleCategory; 5] = [
    RuleCategory::SingleFile,
    RuleCategory::Bundle,
    RuleCategory::ObjectChild,
    RuleCategory::Folder,
    RuleCategory::Special,
];

fn rows_for(category: RuleCategory) -> (RuleRows, Extraction) {
    match category {
        RuleCategory::SingleFile => (SINGLE_FILE, Extraction::StripSuffix),
        RuleCategory::Bundle => (BUNDLE, Extraction::BundleFolder),
        RuleCategory::ObjectChild => (OBJECT_CHILD, Extraction::ObjectChild),
        RuleCategory::Folder => (FOLDER, Extraction::FolderPath),
        RuleCategory::Special => (SPECIAL, Extraction::FirstDot),
        RuleCategory::Configured => (&[], Extraction::StripSuffix),
    }
}

/// Materialize the built-in table in precedence order.
pub fn builtin_rules() -> Vec<ClassificationRule> {
    let mut rules = Vec::new();
    for category in BUILTIN_CATEGORIES {
        let (rows, extraction) = rows_for(category);
        for (marker, suffix, metadata_type) in rows {
            rules.push(ClassificationRule {
                category,
                marker: (*marker).to_string(),
                suffix: suffix.map(str::to_string),
                metadata_type: (*metadata_type).to_string(),
                extraction,
            });
        }
    }
    rules
}
