//! Document merging: per-sheet PDFs → one multi-page PDF.
//!
//! Each input is loaded with `lopdf`, its object ids are shifted past those
//! already taken, and its page objects are appended to a single flat page
//! tree under a fresh catalog. Attributes a page inherits from its old
//! `Pages` ancestors are copied onto the page itself, since those ancestors
//! are dropped.

use crate::error::PlaceCardError;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Page attributes that may live on a `Pages` ancestor instead of the page.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"Resources", b"CropBox", b"Rotate"];

/// Merge `pages` (in order) into one PDF at `output`. Returns the page count.
///
/// The output is written to a temporary sibling and renamed into place, so a
/// failed merge never leaves a truncated document behind.
pub fn merge_pdfs(pages: &[PathBuf], output: &Path) -> Result<usize, PlaceCardError> {
    let mut merged = merge_documents(pages)?;
    let page_count = merged.get_pages().len();

    let mut bytes = Vec::new();
    merged
        .save_to(&mut bytes)
        .map_err(|e| PlaceCardError::Merge {
            detail: format!("could not serialise merged PDF: {e}"),
        })?;

    write_atomic(output, &bytes)?;
    info!("Wrote {} pages to {}", page_count, output.display());
    Ok(page_count)
}

/// Build the merged document in memory.
pub fn merge_documents(pages: &[PathBuf]) -> Result<Document, PlaceCardError> {
    if pages.is_empty() {
        return Err(PlaceCardError::Merge {
            detail: "no pages to merge".into(),
        });
    }

    let mut merged = Document::with_version("1.5");
    let mut kids: Vec<ObjectId> = Vec::new();
    let mut next_id = 1;

    for path in pages {
        let mut doc = Document::load(path).map_err(|e| PlaceCardError::Merge {
            detail: format!("could not read '{}': {e}", path.display()),
        })?;
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            warn!("'{}' contains no pages", path.display());
        }
        let flattened = page_ids
            .iter()
            .map(|&id| flatten_page(&doc, id).map(|dict| (id, dict)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|detail| PlaceCardError::Merge {
                detail: format!("'{}': {detail}", path.display()),
            })?;
        debug!("'{}': {} page(s)", path.display(), flattened.len());

        for (id, object) in doc.objects {
            if is_tree_node(&object) {
                continue;
            }
            merged.objects.insert(id, object);
        }
        for (id, page) in flattened {
            merged.objects.insert(id, Object::Dictionary(page));
            kids.push(id);
        }
    }

    merged.max_id = next_id - 1;
    let pages_id = merged.new_object_id();
    for kid in &kids {
        if let Some(Object::Dictionary(page)) = merged.objects.get_mut(kid) {
            page.set("Parent", pages_id);
        }
    }

    let count = kids.len() as i64;
    let kids: Vec<Object> = kids.into_iter().map(Object::Reference).collect();
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);

    Ok(merged)
}

/// Copy of the page dictionary with inherited attributes pulled down.
fn flatten_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary, String> {
    let mut page = doc
        .get_dictionary(page_id)
        .map_err(|e| format!("page {page_id:?}: {e}"))?
        .clone();

    let mut parent = parent_of(&page);
    // Guard against cyclic Parent chains in malformed files.
    let mut depth = 0;
    while let Some(id) = parent {
        let Ok(node) = doc.get_dictionary(id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = parent_of(node);
        depth += 1;
        if depth > 64 {
            break;
        }
    }
    Ok(page)
}

fn parent_of(dict: &Dictionary) -> Option<ObjectId> {
    dict.get(b"Parent").and_then(|p| p.as_reference()).ok()
}

/// Catalogs, page-tree nodes and outlines are rebuilt or dropped.
fn is_tree_node(object: &Object) -> bool {
    let Object::Dictionary(dict) = object else {
        return false;
    };
    matches!(
        dict.get(b"Type").and_then(|t| t.as_name()),
        Ok(b"Catalog" | b"Pages" | b"Outlines" | b"Outline")
    )
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PlaceCardError> {
    let write_err = |source| PlaceCardError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let tmp_path = path.with_extension("pdf.tmp");
    std::fs::write(&tmp_path, bytes).map_err(write_err)?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        write_err(e)
    })
}
