use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::types::{Answer, InvalidQuestionId, QuestionId, SubjectName};

/// Column name used for the overall score, so no subject may take it.
pub const TOTAL_COLUMN: &str = "total";

/// Options accepted for one question: a single token such as `C`, or a
/// comma-separated list such as `A,B` where any one listed item is correct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptedAnswer(String);

impl AcceptedAnswer {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `answer` earns the point. A list is checked item by item
    /// against the whole answer token, so a multi-mark answer like `A,B`
    /// never matches the list `A,B`.
    pub fn accepts(&self, answer: &Answer) -> bool {
        if answer.is_blank() {
            return false;
        }

        let token = answer.to_string();
        if self.0.contains(',') {
            self.0.split(',').any(|item| item == token)
        } else {
            self.0 == token
        }
    }
}

impl From<&str> for AcceptedAnswer {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AnswerKeyError {
    #[error("could not read answer key {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("answer key is not a subject -> question -> answer object: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("subject {subject}: {source}")]
    InvalidQuestionId {
        subject: SubjectName,
        source: InvalidQuestionId,
    },

    #[error("subject {subject}, {question}: accepted answer is empty")]
    EmptyAcceptedAnswer {
        subject: SubjectName,
        question: QuestionId,
    },

    #[error("subject {subject} lists {question} more than once")]
    DuplicateQuestion {
        subject: SubjectName,
        question: QuestionId,
    },

    #[error("subject name {0:?} is reserved for the overall score")]
    ReservedSubjectName(String),
}

/// Accepted answers of one subject, by question.
pub type SubjectKey = BTreeMap<QuestionId, AcceptedAnswer>;

/// Correct answers for every subject on a sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnswerKey {
    subjects: BTreeMap<SubjectName, SubjectKey>,
}

impl AnswerKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a key of the form `{"subject": {"Q1": "A", "Q2": "A,B"}}`.
    pub fn from_json_str(json: &str) -> Result<Self, AnswerKeyError> {
        let raw: BTreeMap<String, BTreeMap<String, String>> = serde_json::from_str(json)?;

        let mut key = AnswerKey::new();
        for (subject, questions) in raw {
            if subject == TOTAL_COLUMN {
                return Err(AnswerKeyError::ReservedSubjectName(subject));
            }
            let subject = SubjectName::from(subject);
            let entries = key.subjects.entry(subject.clone()).or_default();

            for (question, accepted) in questions {
                let question = question.parse::<QuestionId>().map_err(|source| {
                    AnswerKeyError::InvalidQuestionId {
                        subject: subject.clone(),
                        source,
                    }
                })?;
                if accepted.is_empty() {
                    return Err(AnswerKeyError::EmptyAcceptedAnswer {
                        subject: subject.clone(),
                        question,
                    });
                }
                if entries
                    .insert(question, AcceptedAnswer(accepted))
                    .is_some()
                {
                    return Err(AnswerKeyError::DuplicateQuestion {
                        subject: subject.clone(),
                        question,
                    });
                }
            }
        }

        Ok(key)
    }

    pub fn load(path: &Path) -> Result<Self, AnswerKeyError> {
        let json = std::fs::read_to_string(path).map_err(|source| AnswerKeyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let key = Self::from_json_str(&json)?;
        info!(
            "loaded answer key with {} subject(s), {} question(s) from {}",
            key.subjects.len(),
            key.question_count(),
            path.display()
        );
        Ok(key)
    }

    pub fn insert(&mut self, subject: SubjectName, question: QuestionId, accepted: AcceptedAnswer) {
        self.subjects
            .entry(subject)
            .or_default()
            .insert(question, accepted);
    }

    pub fn subjects(&self) -> impl Iterator<Item = (&SubjectName, &SubjectKey)> {
        self.subjects.iter()
    }

    pub fn question_count(&self) -> usize {
        self.subjects.values().map(|questions| questions.len()).sum()
    }
}
