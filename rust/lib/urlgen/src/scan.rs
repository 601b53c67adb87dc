//! Pages directory traversal.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::GenError;
use crate::extract::extract_query;
use crate::ir::{Dir, Page, PageNode};

/// Scan `dir` into a page tree.
///
/// A page leaf is a file ending in `.{extension}` whose name does not start
/// with `_`. Directories without any page leaf below them are dropped.
/// Entries are visited in file-name order.
pub fn scan_pages(dir: &Path, extension: &str) -> Result<Vec<PageNode>, GenError> {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    scan_dir(dir, &suffix)
}

fn scan_dir(dir: &Path, suffix: &str) -> Result<Vec<PageNode>, GenError> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| GenError::io(dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| GenError::io(dir, e))?;
    entries.sort_by_key(|e| e.file_name());

    let mut nodes = Vec::new();
    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| GenError::io(&path, e))?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            debug!(path = %path.display(), "skipping non utf-8 entry");
            continue;
        };

        if file_type.is_dir() {
            let children = scan_dir(&path, suffix)?;
            if !children.is_empty() {
                nodes.push(PageNode::Dir(Dir {
                    name: name.to_string(),
                    children,
                }));
            }
            continue;
        }

        let Some(stem) = name.strip_suffix(suffix) else {
            continue;
        };
        if !file_type.is_file() || name.starts_with('_') || stem.is_empty() {
            continue;
        }
        let source = fs::read_to_string(&path).map_err(|e| GenError::io(&path, e))?;
        let query = extract_query(&path, &source)?;
        debug!(page = stem, has_query = query.is_some(), "scanned page");
        nodes.push(PageNode::Page(Page {
            name: stem.to_string(),
            query,
        }));
    }
    Ok(nodes)
}
