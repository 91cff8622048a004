use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// Defines a new type that wraps a String for use as an ID.
macro_rules! idtype {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

idtype!(SubjectName);

/// 1-based question ordinal, written as `Q<n>` in keys and reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuestionId(u32);

impl QuestionId {
    pub fn new(ordinal: u32) -> Option<Self> {
        if ordinal == 0 {
            None
        } else {
            Some(Self(ordinal))
        }
    }

    /// The question at 0-based position `index` on the sheet.
    pub fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    pub fn ordinal(&self) -> u32 {
        self.0
    }
}

impl Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidQuestionId(pub String);

impl Display for InvalidQuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid question id: {:?}", self.0)
    }
}

impl std::error::Error for InvalidQuestionId {}

impl FromStr for QuestionId {
    type Err = InvalidQuestionId;

    /// Accepts `Q7`, `q7` or a bare `7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('Q')
            .or_else(|| s.strip_prefix('q'))
            .unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidQuestionId(s.to_string()));
        }
        digits
            .parse::<u32>()
            .ok()
            .and_then(QuestionId::new)
            .ok_or_else(|| InvalidQuestionId(s.to_string()))
    }
}

impl Serialize for QuestionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QuestionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The marks found for one question.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Answer {
    /// No bubble was filled. Written as `-`.
    Blank,
    Single(char),
    /// Several bubbles were filled; letters are kept in ascending order.
    Multiple(Vec<char>),
}

pub const BLANK_ANSWER_TOKEN: &str = "-";

impl Answer {
    /// Resolves the filled option letters of one question.
    pub fn from_marked(mut letters: Vec<char>) -> Self {
        letters.sort_unstable();
        letters.dedup();
        match letters.as_slice() {
            [] => Answer::Blank,
            [letter] => Answer::Single(*letter),
            _ => Answer::Multiple(letters),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Answer::Blank)
    }
}

impl Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Answer::Blank => write!(f, "{}", BLANK_ANSWER_TOKEN),
            Answer::Single(letter) => write!(f, "{}", letter),
            Answer::Multiple(letters) => {
                for (i, letter) in letters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", letter)?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for Answer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Answers detected on one sheet, keyed by question.
pub type AnswerRecord = BTreeMap<QuestionId, Answer>;
