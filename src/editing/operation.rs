//! Edit operations and results

use crate::document::{
    BlockId, BlockKind, BlockPatch, BoxField, BoxId, SectionId, SectionPosition, StatementId,
    TermField, TermId,
};
use crate::layout::BoxSize;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// An atomic mutation of the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EditOp {
    AddBlock {
        kind: BlockKind,
        #[serde(default)]
        after: Option<BlockId>,
    },
    DeleteBlock {
        id: BlockId,
    },
    /// Move `source` into the slot `destination` occupied
    ReorderBlocks {
        source: BlockId,
        destination: BlockId,
    },
    DuplicateBlock {
        id: BlockId,
    },
    UpdateBlock {
        id: BlockId,
        patch: BlockPatch,
    },
    AddSection {
        block: BlockId,
        position: SectionPosition,
        #[serde(default)]
        anchor: Option<SectionId>,
    },
    DeleteSection {
        block: BlockId,
        section: SectionId,
    },
    ChangeBoxSize {
        block: BlockId,
        section: SectionId,
        size: BoxSize,
    },
    SetSectionGuides {
        block: BlockId,
        section: SectionId,
        show: bool,
    },
    ModifyBoxCount {
        block: BlockId,
        section: SectionId,
        delta: i32,
    },
    ReorderSections {
        block: BlockId,
        source: SectionId,
        destination: SectionId,
    },
    /// Break a section in two before box `at`
    SplitSection {
        block: BlockId,
        section: SectionId,
        at: usize,
    },
    /// Insert one box per grapheme of `text` at `at`
    InsertGlyphs {
        block: BlockId,
        section: SectionId,
        at: usize,
        text: String,
    },
    UpdateBox {
        block: BlockId,
        section: SectionId,
        box_id: BoxId,
        field: BoxField,
        value: String,
    },
    AddTerm {
        block: BlockId,
    },
    RemoveTerm {
        block: BlockId,
        term: TermId,
    },
    UpdateTerm {
        block: BlockId,
        term: TermId,
        field: TermField,
        value: String,
    },
    AddStatement {
        block: BlockId,
    },
    RemoveStatement {
        block: BlockId,
        statement: StatementId,
    },
    UpdateMetadata {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        subject: Option<String>,
    },
}

impl EditOp {
    /// Short name for logs and undo descriptions
    pub fn name(&self) -> &'static str {
        match self {
            EditOp::AddBlock { .. } => "add block",
            EditOp::DeleteBlock { .. } => "delete block",
            EditOp::ReorderBlocks { .. } => "reorder blocks",
            EditOp::DuplicateBlock { .. } => "duplicate block",
            EditOp::UpdateBlock { .. } => "update block",
            EditOp::AddSection { .. } => "add section",
            EditOp::DeleteSection { .. } => "delete section",
            EditOp::ChangeBoxSize { .. } => "change box size",
            EditOp::SetSectionGuides { .. } => "toggle guides",
            EditOp::ModifyBoxCount { .. } => "change box count",
            EditOp::ReorderSections { .. } => "reorder sections",
            EditOp::SplitSection { .. } => "split section",
            EditOp::InsertGlyphs { .. } => "insert glyphs",
            EditOp::UpdateBox { .. } => "edit box",
            EditOp::AddTerm { .. } => "add term",
            EditOp::RemoveTerm { .. } => "remove term",
            EditOp::UpdateTerm { .. } => "edit term",
            EditOp::AddStatement { .. } => "add statement",
            EditOp::RemoveStatement { .. } => "remove statement",
            EditOp::UpdateMetadata { .. } => "update metadata",
        }
    }

    /// Whether this op changes the block list itself
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            EditOp::AddBlock { .. }
                | EditOp::DeleteBlock { .. }
                | EditOp::ReorderBlocks { .. }
                | EditOp::DuplicateBlock { .. }
        )
    }
}

/// What the editor should select after an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Block(BlockId),
    Section(BlockId, SectionId),
}

/// Result of applying an edit operation
#[derive(Debug, Clone, Default)]
pub struct EditResult {
    /// Document version after this edit
    pub version: u64,
    /// Blocks whose content changed
    pub affected_blocks: SmallVec<[BlockId; 4]>,
    /// Blocks that were created
    pub created_blocks: SmallVec<[BlockId; 2]>,
    /// Blocks that were deleted
    pub deleted_blocks: SmallVec<[BlockId; 2]>,
    /// Block order changed
    pub reordered: bool,
    /// Document metadata changed
    pub metadata_changed: bool,
    /// Selection requested by the edit
    pub focus: Option<Focus>,
}

impl EditResult {
    /// Check if the edit changed anything
    pub fn has_changes(&self) -> bool {
        !self.affected_blocks.is_empty()
            || !self.created_blocks.is_empty()
            || !self.deleted_blocks.is_empty()
            || self.reordered
            || self.metadata_changed
    }

    /// Whether page assignment may have changed
    pub fn needs_repagination(&self) -> bool {
        !self.affected_blocks.is_empty()
            || !self.created_blocks.is_empty()
            || !self.deleted_blocks.is_empty()
            || self.reordered
    }

    /// Blocks that need to be measured again
    pub fn blocks_to_measure(&self) -> impl Iterator<Item = &BlockId> {
        self.affected_blocks.iter().chain(self.created_blocks.iter())
    }
}
