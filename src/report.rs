use std::path::Path;

use serde::ser::SerializeMap;
use serde::Serialize;

use crate::answer_key::TOTAL_COLUMN;
use crate::interpret::{InterpretSheetError, InterpretedSheet};

/// One output row: the sheet's identifier followed by either its answers and
/// scores, or the reason it could not be read.
#[derive(Debug)]
pub struct SheetReport {
    pub student_id: String,
    pub outcome: Result<InterpretedSheet, InterpretSheetError>,
}

/// The file name up to its first dot, e.g. `alice` for `alice.scan.jpg`.
pub fn student_id_from_path(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    file_name.split('.').next().unwrap_or_default().to_string()
}

impl SheetReport {
    pub fn new(path: &Path, outcome: Result<InterpretedSheet, InterpretSheetError>) -> Self {
        Self {
            student_id: student_id_from_path(path),
            outcome,
        }
    }
}

impl Serialize for SheetReport {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("student_id", &self.student_id)?;
        match &self.outcome {
            Ok(sheet) => {
                for (question, answer) in &sheet.answers {
                    map.serialize_entry(&question.to_string(), &answer.to_string())?;
                }
                for (subject, score) in &sheet.scores.subjects {
                    map.serialize_entry(subject.as_str(), score)?;
                }
                map.serialize_entry(TOTAL_COLUMN, &sheet.scores.total)?;
            }
            Err(e) => {
                map.serialize_entry("error", &e.to_string())?;
            }
        }
        map.end()
    }
}
