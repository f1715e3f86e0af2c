#[cfg(test)]
#[path = "entry_test.rs"]
mod tests;

use super::Language;
use super::Role;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Normal,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedCode {
    pub language: Language,
    pub source: String,
}

/// A single turn in the transcript. Entries are never mutated once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptEntry {
    role: Role,
    text: String,
    code: Option<GeneratedCode>,
    kind: EntryKind,
}

impl TranscriptEntry {
    pub fn user(text: &str) -> TranscriptEntry {
        return TranscriptEntry {
            role: Role::User,
            text: text.to_string(),
            code: None,
            kind: EntryKind::Normal,
        };
    }

    pub fn assistant(text: &str) -> TranscriptEntry {
        return TranscriptEntry {
            role: Role::Assistant,
            text: text.to_string(),
            code: None,
            kind: EntryKind::Normal,
        };
    }

    pub fn assistant_error(text: &str) -> TranscriptEntry {
        return TranscriptEntry {
            role: Role::Assistant,
            text: text.to_string(),
            code: None,
            kind: EntryKind::Error,
        };
    }

    pub fn assistant_with_code(text: &str, language: Language, source: &str) -> TranscriptEntry {
        return TranscriptEntry {
            role: Role::Assistant,
            text: text.to_string(),
            code: Some(GeneratedCode {
                language,
                source: source.to_string(),
            }),
            kind: EntryKind::Normal,
        };
    }

    pub fn role(&self) -> Role {
        return self.role;
    }

    pub fn text(&self) -> &str {
        return &self.text;
    }

    pub fn code(&self) -> Option<&GeneratedCode> {
        return self.code.as_ref();
    }

    pub fn kind(&self) -> EntryKind {
        return self.kind;
    }
}
