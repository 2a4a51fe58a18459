//! Block-level content: the discriminated union of worksheet rows

use crate::document::grid::GridBlock;
use crate::document::id::{BlockId, IdAllocator, StatementId};
use crate::document::sanitize::RichText;
use crate::document::vocabulary::{
    clamp_columns, LineStyle, VocabularyBlock, DEFAULT_FONT_SIZE,
};
use crate::error::{Result, SheetError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const MIN_FONT_SIZE: u8 = 8;
pub const MAX_FONT_SIZE: u8 = 24;

fn default_true() -> bool {
    true
}

fn default_font_size() -> u8 {
    DEFAULT_FONT_SIZE
}

/// The kind of block, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockKind {
    Header,
    Text,
    Grid,
    Vocabulary,
    MultipleChoice,
    TrueFalse,
    Matching,
    Cloze,
}

impl BlockKind {
    pub const ALL: [BlockKind; 8] = [
        BlockKind::Header,
        BlockKind::Text,
        BlockKind::Grid,
        BlockKind::Vocabulary,
        BlockKind::MultipleChoice,
        BlockKind::TrueFalse,
        BlockKind::Matching,
        BlockKind::Cloze,
    ];

    /// Default label shown in structural navigation
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Header => "Header",
            BlockKind::Text => "Text",
            BlockKind::Grid => "Grid",
            BlockKind::Vocabulary => "Vocabulary",
            BlockKind::MultipleChoice => "Multiple choice",
            BlockKind::TrueFalse => "True / false",
            BlockKind::Matching => "Matching",
            BlockKind::Cloze => "Cloze",
        }
    }

    /// Wire tag, as used in snapshots
    pub fn tag(&self) -> &'static str {
        match self {
            BlockKind::Header => "HEADER",
            BlockKind::Text => "TEXT",
            BlockKind::Grid => "GRID",
            BlockKind::Vocabulary => "VOCABULARY",
            BlockKind::MultipleChoice => "MULTIPLE_CHOICE",
            BlockKind::TrueFalse => "TRUE_FALSE",
            BlockKind::Matching => "MATCHING",
            BlockKind::Cloze => "CLOZE",
        }
    }

    /// Check if this is a question-style block
    pub fn is_question(&self) -> bool {
        !matches!(self, BlockKind::Header | BlockKind::Text)
    }
}

impl FromStr for BlockKind {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        BlockKind::ALL
            .into_iter()
            .find(|k| k.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| SheetError::InvalidSnapshot(format!("unknown block kind: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderBlock {
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_true")]
    pub show_name: bool,
    #[serde(default = "default_true")]
    pub show_date: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    #[serde(default)]
    pub content: RichText,
    #[serde(default = "default_font_size")]
    pub font_size: u8,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub alignment: Alignment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceBlock {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub id: StatementId,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_true")]
    pub correct: bool,
    #[serde(default)]
    pub show_reasoning: bool,
}

impl Statement {
    pub fn new(ids: &mut IdAllocator) -> Self {
        Self {
            id: ids.statement(),
            text: String::new(),
            correct: true,
            show_reasoning: true,
        }
    }
}

/// True/false block payload. Always holds at least one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrueFalseBlock {
    #[serde(default)]
    pub prompt: String,
    pub statements: Vec<Statement>,
}

impl TrueFalseBlock {
    pub(crate) fn add_statement(&mut self, ids: &mut IdAllocator) -> StatementId {
        let statement = Statement::new(ids);
        let id = statement.id;
        self.statements.push(statement);
        id
    }

    pub(crate) fn remove_statement(&mut self, id: StatementId) -> bool {
        if self.statements.len() <= 1 {
            return false;
        }
        match self.statements.iter().position(|s| s.id == id) {
            Some(index) => {
                self.statements.remove(index);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingBlock {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub pairs: Vec<MatchPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClozeBlock {
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub answers: Vec<String>,
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockContent {
    Header(HeaderBlock),
    Text(TextBlock),
    Grid(GridBlock),
    Vocabulary(VocabularyBlock),
    MultipleChoice(MultipleChoiceBlock),
    TrueFalse(TrueFalseBlock),
    Matching(MatchingBlock),
    Cloze(ClozeBlock),
}

impl BlockContent {
    /// Default payload for a new block of `kind`
    pub fn default_for(kind: BlockKind, ids: &mut IdAllocator) -> Self {
        match kind {
            BlockKind::Header => BlockContent::Header(HeaderBlock {
                title: String::new(),
                show_name: true,
                show_date: true,
            }),
            BlockKind::Text => BlockContent::Text(TextBlock {
                content: RichText::default(),
                font_size: DEFAULT_FONT_SIZE,
                bold: false,
                alignment: Alignment::Left,
            }),
            BlockKind::Grid => BlockContent::Grid(GridBlock::new(ids)),
            BlockKind::Vocabulary => BlockContent::Vocabulary(VocabularyBlock::new(ids)),
            BlockKind::MultipleChoice => BlockContent::MultipleChoice(MultipleChoiceBlock {
                prompt: String::new(),
                options: vec!["Option A".to_string(), "Option B".to_string()],
                correct_index: 0,
            }),
            BlockKind::TrueFalse => BlockContent::TrueFalse(TrueFalseBlock {
                prompt: String::new(),
                statements: vec![Statement::new(ids)],
            }),
            BlockKind::Matching => BlockContent::Matching(MatchingBlock {
                prompt: String::new(),
                pairs: (1..=3)
                    .map(|i| MatchPair {
                        left: format!("Term {}", i),
                        right: format!("Definition {}", i),
                    })
                    .collect(),
            }),
            BlockKind::Cloze => BlockContent::Cloze(ClozeBlock {
                template: String::new(),
                answers: Vec::new(),
            }),
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            BlockContent::Header(_) => BlockKind::Header,
            BlockContent::Text(_) => BlockKind::Text,
            BlockContent::Grid(_) => BlockKind::Grid,
            BlockContent::Vocabulary(_) => BlockKind::Vocabulary,
            BlockContent::MultipleChoice(_) => BlockKind::MultipleChoice,
            BlockContent::TrueFalse(_) => BlockKind::TrueFalse,
            BlockContent::Matching(_) => BlockKind::Matching,
            BlockContent::Cloze(_) => BlockKind::Cloze,
        }
    }
}

/// A single content unit of the worksheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    /// Position hint, kept equal to the index in the document
    #[serde(default)]
    pub order: u32,
    /// User label for the layers panel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub show_prompt_number: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_number: Option<u32>,
    #[serde(flatten)]
    pub content: BlockContent,
}

impl Block {
    /// Create a block of `kind` with its default payload
    pub fn new(ids: &mut IdAllocator, kind: BlockKind) -> Self {
        let id = ids.block();
        Self {
            id,
            order: 0,
            display_name: None,
            show_prompt_number: kind.is_question(),
            prompt_number: None,
            content: BlockContent::default_for(kind, ids),
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.content.kind()
    }

    /// Display name, falling back to the kind's name
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.kind().name())
    }

    pub fn as_grid(&self) -> Option<&GridBlock> {
        match &self.content {
            BlockContent::Grid(grid) => Some(grid),
            _ => None,
        }
    }

    pub(crate) fn as_grid_mut(&mut self) -> Option<&mut GridBlock> {
        match &mut self.content {
            BlockContent::Grid(grid) => Some(grid),
            _ => None,
        }
    }

    pub fn as_vocabulary(&self) -> Option<&VocabularyBlock> {
        match &self.content {
            BlockContent::Vocabulary(vocab) => Some(vocab),
            _ => None,
        }
    }

    pub(crate) fn as_vocabulary_mut(&mut self) -> Option<&mut VocabularyBlock> {
        match &mut self.content {
            BlockContent::Vocabulary(vocab) => Some(vocab),
            _ => None,
        }
    }

    pub(crate) fn as_true_false_mut(&mut self) -> Option<&mut TrueFalseBlock> {
        match &mut self.content {
            BlockContent::TrueFalse(tf) => Some(tf),
            _ => None,
        }
    }

    /// Deep copy with a fresh id for the block and every nested entity
    pub fn duplicate(&self, ids: &mut IdAllocator) -> Block {
        let mut clone = self.clone();
        clone.id = ids.block();
        match &mut clone.content {
            BlockContent::Grid(grid) => grid.refresh_ids(ids),
            BlockContent::Vocabulary(vocab) => vocab.refresh_ids(ids),
            BlockContent::TrueFalse(tf) => {
                for statement in &mut tf.statements {
                    statement.id = ids.statement();
                }
            }
            _ => {}
        }
        clone
    }

    /// Visit the raw value of every id owned by this block
    pub fn for_each_id(&self, mut f: impl FnMut(u64)) {
        f(self.id.0);
        match &self.content {
            BlockContent::Grid(grid) => {
                for section in &grid.sections {
                    f(section.id.0);
                    for b in &section.boxes {
                        f(b.id.0);
                    }
                }
            }
            BlockContent::Vocabulary(vocab) => {
                for term in &vocab.terms {
                    f(term.id.0);
                }
            }
            BlockContent::TrueFalse(tf) => {
                for statement in &tf.statements {
                    f(statement.id.0);
                }
            }
            _ => {}
        }
    }

    /// Check structural invariants of loaded content
    pub fn validate(&self) -> std::result::Result<(), String> {
        match &self.content {
            BlockContent::Grid(grid) => {
                if grid.sections.is_empty() {
                    return Err(format!("grid block {} has no sections", self.id));
                }
                if let Some(section) = grid.sections.iter().find(|s| s.boxes.is_empty()) {
                    return Err(format!("section {} of block {} has no boxes", section.id, self.id));
                }
            }
            BlockContent::Vocabulary(vocab) if vocab.terms.is_empty() => {
                return Err(format!("vocabulary block {} has no terms", self.id));
            }
            BlockContent::TrueFalse(tf) if tf.statements.is_empty() => {
                return Err(format!("true/false block {} has no statements", self.id));
            }
            _ => {}
        }
        Ok(())
    }

    /// Apply the fields of `patch` that make sense for this kind
    pub fn apply_patch(&mut self, patch: &BlockPatch) -> bool {
        let mut changed = false;

        if let Some(name) = &patch.display_name {
            let name = Some(name.trim().to_string()).filter(|n| !n.is_empty());
            changed |= set(&mut self.display_name, Some(name));
        }
        changed |= set(&mut self.show_prompt_number, patch.show_prompt_number);

        let font_size = patch
            .font_size
            .map(|s| s.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE));

        match &mut self.content {
            BlockContent::Header(header) => {
                changed |= set(&mut header.title, patch.title.clone());
                changed |= set(&mut header.show_name, patch.show_name);
                changed |= set(&mut header.show_date, patch.show_date);
            }
            BlockContent::Text(text) => {
                changed |= set(&mut text.content, patch.content.as_deref().map(RichText::new));
                changed |= set(&mut text.font_size, font_size);
                changed |= set(&mut text.bold, patch.bold);
                changed |= set(&mut text.alignment, patch.alignment);
            }
            BlockContent::Grid(_) => {}
            BlockContent::Vocabulary(vocab) => {
                changed |= set(&mut vocab.columns, patch.columns.map(clamp_columns));
                changed |= set(&mut vocab.line_style, patch.line_style);
                changed |= set(&mut vocab.font_size, font_size);
            }
            BlockContent::MultipleChoice(mc) => {
                changed |= set(&mut mc.prompt, patch.prompt.clone());
                changed |= set(&mut mc.options, patch.options.clone());
                let correct = patch.correct_index.filter(|i| *i < mc.options.len());
                changed |= set(&mut mc.correct_index, correct);
                if mc.correct_index >= mc.options.len() && mc.correct_index != 0 {
                    mc.correct_index = 0;
                    changed = true;
                }
            }
            BlockContent::TrueFalse(tf) => {
                changed |= set(&mut tf.prompt, patch.prompt.clone());
            }
            BlockContent::Matching(matching) => {
                changed |= set(&mut matching.prompt, patch.prompt.clone());
                changed |= set(&mut matching.pairs, patch.pairs.clone());
            }
            BlockContent::Cloze(cloze) => {
                changed |= set(&mut cloze.template, patch.prompt.clone());
                changed |= set(&mut cloze.answers, patch.answers.clone());
            }
        }

        changed
    }
}

/// Store `value` into `slot` if present and different
fn set<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(v) if *slot != v => {
            *slot = v;
            true
        }
        _ => false,
    }
}

/// Partial update of a block's scalar fields.
///
/// Fields that don't apply to the target kind are ignored. `prompt` is the
/// question prompt for question kinds and the template for cloze blocks. An
/// empty `display_name` clears the label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockPatch {
    pub display_name: Option<String>,
    pub show_prompt_number: Option<bool>,
    pub title: Option<String>,
    pub show_name: Option<bool>,
    pub show_date: Option<bool>,
    pub content: Option<String>,
    pub font_size: Option<u8>,
    pub bold: Option<bool>,
    pub alignment: Option<Alignment>,
    pub columns: Option<u8>,
    pub line_style: Option<LineStyle>,
    pub prompt: Option<String>,
    pub options: Option<Vec<String>>,
    pub correct_index: Option<usize>,
    pub pairs: Option<Vec<MatchPair>>,
    pub answers: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_block_kind() {
        assert!(!BlockKind::Header.is_question());
        assert!(!BlockKind::Text.is_question());
        assert!(BlockKind::Grid.is_question());
        assert_eq!("grid".parse::<BlockKind>().unwrap(), BlockKind::Grid);
        assert_eq!("TRUE_FALSE".parse::<BlockKind>().unwrap(), BlockKind::TrueFalse);
        assert!("CHART".parse::<BlockKind>().is_err());
    }

    #[test]
    fn test_defaults_per_kind() {
        let mut ids = IdAllocator::new();
        for kind in BlockKind::ALL {
            let block = Block::new(&mut ids, kind);
            assert_eq!(block.kind(), kind);
            assert!(block.validate().is_ok());
            assert_eq!(block.show_prompt_number, kind.is_question());
        }

        let vocab = Block::new(&mut ids, BlockKind::Vocabulary);
        assert_eq!(vocab.as_vocabulary().map(|v| v.terms.len()), Some(1));
    }

    #[test]
    fn test_duplicate_assigns_fresh_ids() {
        let mut ids = IdAllocator::new();
        let original = Block::new(&mut ids, BlockKind::Grid);
        let copy = original.duplicate(&mut ids);

        let mut seen = FxHashSet::default();
        original.for_each_id(|id| {
            seen.insert(id);
        });
        copy.for_each_id(|id| {
            assert!(seen.insert(id), "id {} reused by duplicate", id);
        });

        let grid = copy.as_grid().unwrap();
        assert_eq!(grid.box_count(), original.as_grid().unwrap().box_count());
    }

    #[test]
    fn test_label_falls_back_to_kind() {
        let mut ids = IdAllocator::new();
        let mut block = Block::new(&mut ids, BlockKind::Vocabulary);
        assert_eq!(block.label(), "Vocabulary");

        let patch = BlockPatch {
            display_name: Some("Lesson 3 words".into()),
            ..Default::default()
        };
        assert!(block.apply_patch(&patch));
        assert_eq!(block.label(), "Lesson 3 words");

        let clear = BlockPatch {
            display_name: Some("  ".into()),
            ..Default::default()
        };
        assert!(block.apply_patch(&clear));
        assert_eq!(block.display_name, None);
    }

    #[test]
    fn test_patch_sanitizes_text_and_ignores_foreign_fields() {
        let mut ids = IdAllocator::new();
        let mut text = Block::new(&mut ids, BlockKind::Text);
        let patch = BlockPatch {
            content: Some("<b>Read</b><script>x()</script>".into()),
            font_size: Some(40),
            columns: Some(3),
            ..Default::default()
        };
        assert!(text.apply_patch(&patch));
        match &text.content {
            BlockContent::Text(t) => {
                assert_eq!(t.content.as_str(), "<b>Read</b>");
                assert_eq!(t.font_size, MAX_FONT_SIZE);
            }
            other => panic!("unexpected content {:?}", other),
        }

        let unchanged = text.clone();
        assert!(!text.apply_patch(&BlockPatch {
            columns: Some(1),
            ..Default::default()
        }));
        assert_eq!(text, unchanged);
    }

    #[test]
    fn test_block_json_shape() {
        let mut ids = IdAllocator::new();
        let block = Block::new(&mut ids, BlockKind::Header);
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "HEADER");
        assert_eq!(json["showName"], true);
        assert!(json.get("displayName").is_none());

        let back: Block = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }
}
