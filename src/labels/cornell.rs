use std::fs;
use std::path::{Path, PathBuf};

use crate::grasp::Point2;

use super::{LabelError, parse_fields};

/// One Cornell label file loaded back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CornellRect {
    pub path: PathBuf,
    pub corners: Vec<Point2>,
}

/// Formats corners as `"{x:.2} {y:.2}"` lines, each newline terminated.
pub fn format_corners(corners: &[Point2]) -> String {
    corners
        .iter()
        .map(|(x, y)| format!("{x:.2} {y:.2}\n"))
        .collect()
}

/// Parses the contents of a Cornell file. Blank lines are skipped.
pub fn parse_corners(text: &str, path: &Path) -> Result<Vec<Point2>, LabelError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_fields::<2>(line, path, i + 1).map(|[x, y]| (x, y)))
        .collect()
}

pub fn read_corners(path: &Path) -> Result<Vec<Point2>, LabelError> {
    let text = fs::read_to_string(path).map_err(|e| LabelError::io(path, e))?;
    parse_corners(&text, path)
}

/// Index encoded in a `grasp_NNN.txt` file name.
pub fn grasp_index(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix("grasp_")?
        .strip_suffix(".txt")?
        .parse()
        .ok()
}

/// Lists `grasp_*` files in a label folder, sorted by name.
///
/// A missing folder yields an empty list.
pub fn list_grasp_files(dir: &Path) -> Result<Vec<PathBuf>, LabelError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| LabelError::io(dir, e))?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("grasp_"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Loads every Cornell rectangle of one image.
pub fn load_dir(dir: &Path) -> Result<Vec<CornellRect>, LabelError> {
    list_grasp_files(dir)?
        .into_iter()
        .map(|path| {
            let corners = read_corners(&path)?;
            Ok(CornellRect { path, corners })
        })
        .collect()
}
