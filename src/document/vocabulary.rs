//! Vocabulary list content

use crate::document::id::{IdAllocator, TermId};
use serde::{Deserialize, Serialize};

pub const DEFAULT_VOCAB_COLUMNS: u8 = 2;
pub const MAX_VOCAB_COLUMNS: u8 = 3;
pub const DEFAULT_FONT_SIZE: u8 = 12;

fn default_columns() -> u8 {
    DEFAULT_VOCAB_COLUMNS
}

fn default_font_size() -> u8 {
    DEFAULT_FONT_SIZE
}

/// Rule drawn under each term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Dashed,
    Solid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub id: TermId,
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub meaning: String,
}

impl Term {
    pub fn new(ids: &mut IdAllocator) -> Self {
        Self {
            id: ids.term(),
            term: String::new(),
            meaning: String::new(),
        }
    }
}

/// Which text field of a term to edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermField {
    Term,
    Meaning,
}

/// Vocabulary block payload. Always holds at least one term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyBlock {
    pub terms: Vec<Term>,
    #[serde(default = "default_columns")]
    pub columns: u8,
    #[serde(default)]
    pub line_style: LineStyle,
    #[serde(default = "default_font_size")]
    pub font_size: u8,
}

impl VocabularyBlock {
    pub fn new(ids: &mut IdAllocator) -> Self {
        Self {
            terms: vec![Term::new(ids)],
            columns: DEFAULT_VOCAB_COLUMNS,
            line_style: LineStyle::default(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }

    pub(crate) fn add_term(&mut self, ids: &mut IdAllocator) -> TermId {
        let term = Term::new(ids);
        let id = term.id;
        self.terms.push(term);
        id
    }

    /// Remove a term unless it is the last one
    pub(crate) fn remove_term(&mut self, id: TermId) -> bool {
        if self.terms.len() <= 1 {
            return false;
        }
        match self.terms.iter().position(|t| t.id == id) {
            Some(index) => {
                self.terms.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn update_term(&mut self, id: TermId, field: TermField, value: String) -> bool {
        let Some(term) = self.terms.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        let slot = match field {
            TermField::Term => &mut term.term,
            TermField::Meaning => &mut term.meaning,
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    pub(crate) fn refresh_ids(&mut self, ids: &mut IdAllocator) {
        for term in &mut self.terms {
            term.id = ids.term();
        }
    }
}

/// Clamp a requested column count into the supported range
pub fn clamp_columns(columns: u8) -> u8 {
    columns.clamp(1, MAX_VOCAB_COLUMNS)
}
