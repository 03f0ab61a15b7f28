//! Change-set stamping for retrieved manifests.
//!
//! The retrieved `package.xml` is rewritten event by event so the
//! `<fullName>` element lands as the first child of the root element no matter
//! how the platform formatted the document.
use crate::manifest::{MANIFEST_NAMESPACE, MANIFEST_ROOT};
use anyhow::{anyhow, Context, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::path::Path;

/// Element carrying the change-set label.
pub const FULL_NAME_TAG: &str = "fullName";

const CHILD_INDENT: &str = "\n    ";

/// Insert `<fullName>label</fullName>` as the first child of the manifest root.
///
/// An existing top-level `fullName` is replaced. Documents whose root is not
/// a `Package` element are rejected.
pub fn insert_full_name(document: &str, label: &str) -> Result<String> {
    let mut reader = Reader::from_str(document);
    let mut writer = Writer::new(Vec::new());
    let mut depth = 0usize;
    let mut skip_until: Option<usize> = None;
    let mut inserted = false;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("parse manifest at byte {}", reader.buffer_position()))?;
        match event {
            Event::Eof => break,
            Event::Start(start) => {
                depth += 1;
                if skip_until.is_some() {
                    continue;
                }
                if depth == 1 {
                    check_root(&start)?;
                    writer
                        .write_event(Event::Start(start))
                        .context("write manifest root")?;
                    write_full_name(&mut writer, label)?;
                    inserted = true;
                    continue;
                }
                if depth == 2 && is_full_name(&start) {
                    skip_until = Some(depth);
                    continue;
                }
                writer
                    .write_event(Event::Start(start))
                    .context("write manifest element")?;
            }
            Event::End(end) => {
                let closing = depth;
                depth = depth.saturating_sub(1);
                if let Some(skip_depth) = skip_until {
                    if closing == skip_depth {
                        skip_until = None;
                    }
                    continue;
                }
                writer
                    .write_event(Event::End(end))
                    .context("write manifest element")?;
            }
            Event::Empty(empty) => {
                if skip_until.is_some() || (depth == 1 && is_full_name(&empty)) {
                    continue;
                }
                if depth == 0 {
                    check_root(&empty)?;
                    let end = empty.to_end().into_owned();
                    writer
                        .write_event(Event::Start(empty))
                        .context("write manifest root")?;
                    write_full_name(&mut writer, label)?;
                    writer
                        .write_event(Event::Text(BytesText::from_escaped("\n")))
                        .context("write manifest root")?;
                    writer
                        .write_event(Event::End(end))
                        .context("write manifest root")?;
                    inserted = true;
                    continue;
                }
                writer
                    .write_event(Event::Empty(empty))
                    .context("write manifest element")?;
            }
            other => {
                if skip_until.is_none() {
                    writer
                        .write_event(other)
                        .context("write manifest content")?;
                }
            }
        }
    }

    if !inserted {
        return Err(anyhow!("manifest has no <{MANIFEST_ROOT}> root element"));
    }
    String::from_utf8(writer.into_inner()).context("manifest is not valid UTF-8")
}

/// Stamp the manifest file at `path` in place.
pub fn patch_manifest_file(path: &Path, label: &str) -> Result<()> {
    let document =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let patched = insert_full_name(&document, label)
        .with_context(|| format!("patch {}", path.display()))?;
    fs::write(path, patched).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn is_full_name(element: &BytesStart<'_>) -> bool {
    element.local_name().as_ref() == FULL_NAME_TAG.as_bytes()
}

fn check_root(element: &BytesStart<'_>) -> Result<()> {
    if element.local_name().as_ref() != MANIFEST_ROOT.as_bytes() {
        return Err(anyhow!(
            "manifest root is <{}>, expected <{MANIFEST_ROOT}>",
            String::from_utf8_lossy(element.name().as_ref())
        ));
    }
    let namespace = element
        .try_get_attribute("xmlns")
        .context("read manifest namespace")?
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned());
    if namespace.as_deref() != Some(MANIFEST_NAMESPACE) {
        tracing::warn!(
            namespace = namespace.as_deref().unwrap_or("<none>"),
            "manifest root declares an unexpected namespace"
        );
    }
    Ok(())
}

fn write_full_name(writer: &mut Writer<Vec<u8>>, label: &str) -> Result<()> {
    writer
        .write_event(Event::Text(BytesText::from_escaped(CHILD_INDENT)))
        .context("write fullName")?;
    writer
        .write_event(Event::Start(BytesStart::new(FULL_NAME_TAG)))
        .context("write fullName")?;
    writer
        .write_event(Event::Text(BytesText::new(label)))
        .context("write fullName")?;
    writer
        .write_event(Event::End(BytesEnd::new(FULL_NAME_TAG)))
        .context("write fullName")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{aggregate, serialize, MetadataRecord, DEFAULT_API_VERSION};

    fn generated_manifest() -> String {
        let grouping = aggregate([MetadataRecord::new("ApexClass", "Foo")]);
        serialize(&grouping, DEFAULT_API_VERSION)
    }

    #[test]
    fn full_name_follows_root_start_tag() {
        let patched = insert_full_name(&generated_manifest(), "Release 42").expect("patch");
        assert!(patched.contains(
            "<Package xmlns=\"http://soap.sforce.com/2006/04/metadata\">\n    <fullName>Release 42</fullName>\n    <types>"
        ));
        assert!(patched.contains("<members>Foo</members>"));
        assert!(patched.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    }

    #[test]
    fn reformatted_root_still_gets_patched() {
        let document = "<?xml version='1.0'?><Package   xmlns='http://soap.sforce.com/2006/04/metadata'><types><members>A</members><name>ApexClass</name></types><version>58.0</version></Package>";
        let patched = insert_full_name(document, "cs").expect("patch");
        assert!(patched.contains("<fullName>cs</fullName>"));
        let root_end = patched.find("<fullName>").expect("fullName");
        let types = patched.find("<types>").expect("types");
        assert!(root_end < types);
    }

    #[test]
    fn existing_full_name_is_replaced() {
        let document = "<Package xmlns=\"http://soap.sforce.com/2006/04/metadata\">\n    <fullName>old</fullName>\n    <version>58.0</version>\n</Package>\n";
        let patched = insert_full_name(document, "new").expect("patch");
        assert_eq!(patched.matches("<fullName>").count(), 1);
        assert!(patched.contains("<fullName>new</fullName>"));
        assert!(!patched.contains("old"));
    }

    #[test]
    fn label_is_escaped() {
        let patched = insert_full_name(&generated_manifest(), "Q1 <hotfix> & more").expect("patch");
        assert!(patched.contains("<fullName>Q1 &lt;hotfix&gt; &amp; more</fullName>"));
    }

    #[test]
    fn empty_root_is_expanded() {
        let patched = insert_full_name("<Package/>", "cs").expect("patch");
        assert_eq!(patched, "<Package>\n    <fullName>cs</fullName>\n</Package>");
    }

    #[test]
    fn wrong_root_is_rejected() {
        let err = insert_full_name("<Manifest><version>1</version></Manifest>", "cs")
            .expect_err("wrong root");
        assert!(err.to_string().contains("expected <Package>"));
    }

    #[test]
    fn document_without_elements_is_rejected() {
        let err = insert_full_name("<?xml version=\"1.0\"?>\n", "cs").expect_err("no root");
        assert!(err.to_string().contains("no <Package> root"));
    }

    #[test]
    fn patch_manifest_file_rewrites_in_place() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("package.xml");
        std::fs::write(&path, generated_manifest()).expect("write manifest");
        patch_manifest_file(&path, "Sprint 7").expect("patch file");
        let text = std::fs::read_to_string(&path).expect("read manifest");
        assert!(text.contains("<fullName>Sprint 7</fullName>"));
    }
}
