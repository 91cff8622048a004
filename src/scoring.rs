use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::Serialize;

use crate::answer_key::{AnswerKey, TOTAL_COLUMN};
use crate::types::{Answer, AnswerRecord, SubjectName};

/// Points per subject for one sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScoreSheet {
    pub subjects: BTreeMap<SubjectName, u32>,
    pub total: u32,
}

impl ScoreSheet {
    pub fn subject(&self, subject: &str) -> Option<u32> {
        self.subjects.get(&SubjectName::from(subject)).copied()
    }
}

impl Serialize for ScoreSheet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.subjects.len() + 1))?;
        for (subject, score) in &self.subjects {
            map.serialize_entry(subject.as_str(), score)?;
        }
        map.serialize_entry(TOTAL_COLUMN, &self.total)?;
        map.end()
    }
}

/// Scores a sheet's answers against the key. Questions missing from the
/// record count as unanswered.
pub fn score_answers(record: &AnswerRecord, key: &AnswerKey) -> ScoreSheet {
    let mut sheet = ScoreSheet::default();
    for (subject, questions) in key.subjects() {
        let score = questions
            .iter()
            .filter(|(question, accepted)| {
                accepted.accepts(record.get(*question).unwrap_or(&Answer::Blank))
            })
            .count() as u32;
        sheet.subjects.insert(subject.clone(), score);
        sheet.total += score;
    }
    sheet
}
