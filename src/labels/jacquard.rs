use std::fmt;
use std::fs;
use std::path::Path;

use crate::grasp::{GraspRect, Point2};

use super::{LabelError, parse_fields};

/// One line of a Jacquard aggregate file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JacquardRecord {
    pub center: Point2,
    pub angle: f64,
    pub width: f64,
    pub height: f64,
}

impl From<&GraspRect> for JacquardRecord {
    fn from(rect: &GraspRect) -> Self {
        Self {
            center: rect.center,
            angle: rect.jacquard_angle,
            width: rect.width,
            height: rect.height,
        }
    }
}

impl fmt::Display for JacquardRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} {:.2} {:.5} {:.2} {:.2}",
            self.center.0, self.center.1, self.angle, self.width, self.height
        )
    }
}

impl JacquardRecord {
    /// The record as written to disk, newline included.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }

    pub fn parse(line: &str, path: &Path, line_no: usize) -> Result<Self, LabelError> {
        let [cx, cy, angle, width, height] = parse_fields::<5>(line, path, line_no)?;
        Ok(Self {
            center: (cx, cy),
            angle,
            width,
            height,
        })
    }
}

/// Parses a whole aggregate file. Blank lines are skipped.
pub fn parse_records(text: &str, path: &Path) -> Result<Vec<JacquardRecord>, LabelError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| JacquardRecord::parse(line, path, i + 1))
        .collect()
}

/// Reads an aggregate file; a missing file yields no records.
pub fn read_records(path: &Path) -> Result<Vec<JacquardRecord>, LabelError> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path).map_err(|e| LabelError::io(path, e))?;
    parse_records(&text, path)
}
