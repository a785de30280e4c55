//! Read-only adapter over the zipped OOXML package.
//!
//! Pulls the raw XML parts the engine needs out of the ZIP container: the
//! document body, and the comments part located through the relationship
//! table. Everything else in the package is ignored.

use std::io::{Cursor, Read};

use zip::read::ZipArchive;

use crate::error::ExtractError;
use crate::wml::strip_bom;

/// Relationship type identifying the comments part.
const COMMENTS_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";

const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
const DEFAULT_COMMENTS_PART: &str = "word/comments.xml";

/// Raw XML parts of one document package. Owning strings so the parsed trees
/// built from them can borrow freely during extraction.
#[derive(Debug)]
pub struct DocxPackage {
    pub document_xml: String,
    /// `None` when the package has no comments part, which is not an error.
    pub comments_xml: Option<String>,
}

impl DocxPackage {
    /// Open raw bytes as a document package. Fails the whole document if the
    /// bytes are not a valid ZIP or the body part is missing.
    pub fn open(bytes: &[u8]) -> Result<Self, ExtractError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;

        let document_xml = read_part(&mut zip, DOCUMENT_PART)?
            .ok_or_else(|| ExtractError::MissingPart(DOCUMENT_PART.to_string()))?;

        let comments_part = comments_part_name(&mut zip)?;
        let comments_xml = match comments_part {
            Some(name) => read_part(&mut zip, &name)?,
            None => None,
        };

        Ok(Self {
            document_xml,
            comments_xml,
        })
    }
}

fn read_part<R: Read + std::io::Seek>(
    zip: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, ExtractError> {
    let mut file = match zip.by_name(name) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(|e| ExtractError::PartRead {
            part: name.to_string(),
            message: e.to_string(),
        })?;
    Ok(Some(text))
}

/// Resolve the comments part through the document relationship table,
/// falling back to the conventional part name when the table is missing or
/// does not advertise one.
fn comments_part_name<R: Read + std::io::Seek>(
    zip: &mut ZipArchive<R>,
) -> Result<Option<String>, ExtractError> {
    if let Some(rels_xml) = read_part(zip, DOCUMENT_RELS_PART)? {
        match roxmltree::Document::parse(strip_bom(&rels_xml)) {
            Ok(rels) => {
                for rel in rels
                    .descendants()
                    .filter(|n| n.tag_name().name() == "Relationship")
                {
                    if rel.attribute("Type") == Some(COMMENTS_REL_TYPE) {
                        if let Some(target) = rel.attribute("Target") {
                            return Ok(Some(resolve_target(target)));
                        }
                    }
                }
            }
            Err(e) => {
                tracing::debug!("unreadable relationship table, using default part name: {e}");
            }
        }
    }

    // Some producers omit the relationship but still ship the part.
    if zip.by_name(DEFAULT_COMMENTS_PART).is_ok() {
        return Ok(Some(DEFAULT_COMMENTS_PART.to_string()));
    }
    Ok(None)
}

/// Relationship targets are relative to `word/` unless rooted.
fn resolve_target(target: &str) -> String {
    if let Some(rooted) = target.strip_prefix('/') {
        rooted.to_string()
    } else {
        format!("word/{target}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_targets_resolve_under_word() {
        assert_eq!(resolve_target("comments.xml"), "word/comments.xml");
        assert_eq!(resolve_target("/word/comments.xml"), "word/comments.xml");
    }

    #[test]
    fn garbage_bytes_fail_as_package_error() {
        let err = DocxPackage::open(b"not a zip archive").unwrap_err();
        assert!(matches!(err, ExtractError::Package(_)));
    }
}
