//! Shared types used across the scheduler, classifier and aggregators.

use serde::{Deserialize, Serialize};

/// Kind of learnable content unit. The scheduler itself is type-agnostic;
/// the discriminant exists for filtering and per-category aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Vocabulary,
    Kanji,
    Grammar,
    Flashcard,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vocabulary => "vocabulary",
            Self::Kanji => "kanji",
            Self::Grammar => "grammar",
            Self::Flashcard => "flashcard",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "vocabulary" => Some(Self::Vocabulary),
            "kanji" => Some(Self::Kanji),
            "grammar" => Some(Self::Grammar),
            "flashcard" => Some(Self::Flashcard),
            _ => None,
        }
    }
}

/// Review-urgency bucket. Derived from `ReviewState` plus recent history,
/// never stored as independent truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriorityBucket {
    Red,
    Yellow,
    Green,
}

impl PriorityBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Yellow => "YELLOW",
            Self::Green => "GREEN",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "RED" => Some(Self::Red),
            "YELLOW" => Some(Self::Yellow),
            "GREEN" => Some(Self::Green),
            _ => None,
        }
    }
}

/// Diagnosis attached to RED items for UI copy. Annotation only; the
/// bucket math never depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The item was forgotten and not yet re-established.
    KnowledgeGap,
    /// Correct but slow or uncertain recall.
    ProcessError,
    /// Fast wrong answer, likely a slip rather than a gap.
    CarelessError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KnowledgeGap => "knowledge_gap",
            Self::ProcessError => "process_error",
            Self::CarelessError => "careless_error",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "knowledge_gap" => Some(Self::KnowledgeGap),
            "process_error" => Some(Self::ProcessError),
            "careless_error" => Some(Self::CarelessError),
            _ => None,
        }
    }
}
