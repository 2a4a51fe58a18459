//! Document model: the ordered block list and its mutation layer

mod block;
mod grid;
mod id;
mod sanitize;
mod snapshot;
mod vocabulary;

pub use block::{
    Alignment, Block, BlockContent, BlockKind, BlockPatch, ClozeBlock, HeaderBlock, MatchPair,
    MatchingBlock, MultipleChoiceBlock, Statement, TextBlock, TrueFalseBlock, MAX_FONT_SIZE,
    MIN_FONT_SIZE,
};
pub use grid::{
    BoxField, CharacterBox, GridBlock, Section, SectionPosition, DEFAULT_GRID_BOX_COUNT,
    MAX_SECTION_BOXES,
};
pub use id::{BlockId, BoxId, IdAllocator, SectionId, StatementId, TermId, MAX_ID};
pub use sanitize::{sanitize_html, sanitize_paste, strip_tags, RichText};
pub use snapshot::{
    snapshot_from_json, snapshot_to_json, DocumentSnapshot, MemoryStore, Metadata, SnapshotStore,
    SNAPSHOT_VERSION,
};
pub use vocabulary::{LineStyle, Term, TermField, VocabularyBlock};

use crate::editing::{EditOp, EditResult, Focus};
use crate::error::{Result, SheetError};
use log::debug;
use rustc_hash::FxHashSet;

/// Splice-remove `from`, then splice-insert at `to`
pub(crate) fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
}

/// The worksheet document
#[derive(Debug, Clone)]
pub struct Document {
    /// Blocks in document order
    blocks: Vec<Block>,
    metadata: Metadata,
    ids: IdAllocator,
    /// Monotonic version counter
    version: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            metadata: Metadata::default(),
            ids: IdAllocator::new(),
            version: 0,
        }
    }

    /// Build a document from a snapshot, validating its invariants
    pub fn from_snapshot(snapshot: DocumentSnapshot) -> Result<Self> {
        let mut seen = FxHashSet::default();
        let mut max_id = 0;
        let mut duplicate = None;

        for block in &snapshot.blocks {
            block.validate().map_err(SheetError::InvalidSnapshot)?;
            block.for_each_id(|id| {
                max_id = max_id.max(id);
                if !seen.insert(id) && duplicate.is_none() {
                    duplicate = Some(id);
                }
            });
        }
        if let Some(id) = duplicate {
            return Err(SheetError::InvalidSnapshot(format!("duplicate id {}", id)));
        }
        if max_id >= MAX_ID {
            return Err(SheetError::InvalidSnapshot(format!(
                "id {} is not below {}",
                max_id, MAX_ID
            )));
        }

        let mut doc = Self {
            blocks: snapshot.blocks,
            metadata: snapshot.metadata,
            ids: IdAllocator::starting_after(max_id),
            version: 0,
        };
        doc.reindex();
        doc.renumber_prompts();
        Ok(doc)
    }

    /// Capture the current state for persistence
    pub fn to_snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            metadata: self.metadata.clone(),
            blocks: self.blocks.clone(),
        }
    }

    /// Get the document version
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn block_index(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    /// Block ids in document order
    pub fn block_order(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.iter().map(|b| b.id)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.block(id).is_some()
    }

    /// Whether `section` still exists inside grid block `block`
    pub fn has_section(&self, block: BlockId, section: SectionId) -> bool {
        self.block(block)
            .and_then(Block::as_grid)
            .is_some_and(|g| g.section(section).is_some())
    }

    /// Next id the allocator will hand out
    pub(crate) fn next_id(&self) -> u64 {
        self.ids.peek()
    }

    /// Keep ids from a previous document out of circulation
    pub(crate) fn reserve_ids_below(&mut self, next: u64) {
        self.ids.reserve_through(next.saturating_sub(1));
    }

    /// Record creation and modification times in the metadata
    pub(crate) fn stamp(&mut self, now_ms: f64) {
        if self.metadata.created_at <= 0.0 {
            self.metadata.created_at = now_ms;
        }
        self.metadata.updated_at = now_ms;
    }

    /// Replace blocks and metadata wholesale (undo/redo)
    pub(crate) fn restore(&mut self, blocks: Vec<Block>, metadata: Metadata) {
        for block in &blocks {
            block.for_each_id(|id| self.ids.reserve_through(id));
        }
        self.blocks = blocks;
        self.metadata = metadata;
        self.version += 1;
        self.reindex();
        self.renumber_prompts();
    }

    /// Apply an edit operation.
    ///
    /// Guards and unknown ids make the op a no-op: the result reports no
    /// changes and the version is not bumped.
    pub fn apply_edit(&mut self, op: EditOp) -> EditResult {
        let name = op.name();
        let mut result = EditResult::default();

        match op {
            EditOp::AddBlock { kind, after } => {
                let block = Block::new(&mut self.ids, kind);
                let id = block.id;
                let index = after
                    .and_then(|a| self.block_index(a))
                    .map(|i| i + 1)
                    .unwrap_or(self.blocks.len());
                self.blocks.insert(index, block);
                result.created_blocks.push(id);
                result.focus = Some(Focus::Block(id));
            }
            EditOp::DeleteBlock { id } => {
                if let Some(index) = self.block_index(id) {
                    self.blocks.remove(index);
                    result.deleted_blocks.push(id);
                }
            }
            EditOp::ReorderBlocks {
                source,
                destination,
            } => {
                if source != destination {
                    if let (Some(from), Some(to)) =
                        (self.block_index(source), self.block_index(destination))
                    {
                        move_item(&mut self.blocks, from, to);
                        result.reordered = true;
                    }
                }
            }
            EditOp::DuplicateBlock { id } => {
                if let Some(index) = self.block_index(id) {
                    let copy = self.blocks[index].duplicate(&mut self.ids);
                    let copy_id = copy.id;
                    self.blocks.insert(index + 1, copy);
                    result.created_blocks.push(copy_id);
                    result.focus = Some(Focus::Block(copy_id));
                }
            }
            EditOp::UpdateBlock { id, patch } => {
                if self.block_mut(id).is_some_and(|b| b.apply_patch(&patch)) {
                    result.affected_blocks.push(id);
                }
            }
            EditOp::AddSection {
                block,
                position,
                anchor,
            } => {
                let ids = &mut self.ids;
                if let Some(grid) = self
                    .blocks
                    .iter_mut()
                    .find(|b| b.id == block)
                    .and_then(Block::as_grid_mut)
                {
                    let section = grid.add_section(ids, position, anchor);
                    result.affected_blocks.push(block);
                    result.focus = Some(Focus::Section(block, section));
                }
            }
            EditOp::DeleteSection { block, section } => {
                self.edit_grid(block, &mut result, |grid, _| grid.delete_section(section));
            }
            EditOp::ChangeBoxSize {
                block,
                section,
                size,
            } => {
                self.edit_grid(block, &mut result, |grid, _| {
                    grid.change_box_size(section, size)
                });
            }
            EditOp::SetSectionGuides {
                block,
                section,
                show,
            } => {
                self.edit_grid(block, &mut result, |grid, _| grid.set_guides(section, show));
            }
            EditOp::ModifyBoxCount {
                block,
                section,
                delta,
            } => {
                self.edit_grid(block, &mut result, |grid, ids| {
                    grid.modify_box_count(ids, section, delta)
                });
            }
            EditOp::ReorderSections {
                block,
                source,
                destination,
            } => {
                self.edit_grid(block, &mut result, |grid, _| {
                    grid.reorder_sections(source, destination)
                });
            }
            EditOp::SplitSection { block, section, at } => {
                let mut created = None;
                self.edit_grid(block, &mut result, |grid, ids| {
                    created = grid.split_section(ids, section, at);
                    created.is_some()
                });
                if let Some(new_section) = created {
                    result.focus = Some(Focus::Section(block, new_section));
                }
            }
            EditOp::InsertGlyphs {
                block,
                section,
                at,
                text,
            } => {
                self.edit_grid(block, &mut result, |grid, ids| {
                    grid.insert_glyphs(ids, section, at, &text)
                });
            }
            EditOp::UpdateBox {
                block,
                section,
                box_id,
                field,
                value,
            } => {
                self.edit_grid(block, &mut result, |grid, _| {
                    grid.update_box(section, box_id, field, value)
                });
            }
            EditOp::AddTerm { block } => {
                let ids = &mut self.ids;
                if let Some(vocab) = self
                    .blocks
                    .iter_mut()
                    .find(|b| b.id == block)
                    .and_then(Block::as_vocabulary_mut)
                {
                    vocab.add_term(ids);
                    result.affected_blocks.push(block);
                }
            }
            EditOp::RemoveTerm { block, term } => {
                let removed = self
                    .block_mut(block)
                    .and_then(Block::as_vocabulary_mut)
                    .is_some_and(|v| v.remove_term(term));
                if removed {
                    result.affected_blocks.push(block);
                }
            }
            EditOp::UpdateTerm {
                block,
                term,
                field,
                value,
            } => {
                let updated = self
                    .block_mut(block)
                    .and_then(Block::as_vocabulary_mut)
                    .is_some_and(|v| v.update_term(term, field, value));
                if updated {
                    result.affected_blocks.push(block);
                }
            }
            EditOp::AddStatement { block } => {
                let ids = &mut self.ids;
                if let Some(tf) = self
                    .blocks
                    .iter_mut()
                    .find(|b| b.id == block)
                    .and_then(Block::as_true_false_mut)
                {
                    tf.add_statement(ids);
                    result.affected_blocks.push(block);
                }
            }
            EditOp::RemoveStatement { block, statement } => {
                let removed = self
                    .block_mut(block)
                    .and_then(Block::as_true_false_mut)
                    .is_some_and(|tf| tf.remove_statement(statement));
                if removed {
                    result.affected_blocks.push(block);
                }
            }
            EditOp::UpdateMetadata { title, subject } => {
                if let Some(title) = title.filter(|t| *t != self.metadata.title) {
                    self.metadata.title = title;
                    result.metadata_changed = true;
                }
                if let Some(subject) = subject.filter(|s| *s != self.metadata.subject) {
                    self.metadata.subject = subject;
                    result.metadata_changed = true;
                }
            }
        }

        if result.has_changes() {
            self.version += 1;
            self.reindex();
            self.renumber_prompts();
            debug!("applied {} (version {})", name, self.version);
        }
        result.version = self.version;
        result
    }

    /// Run a grid edit, recording the block as affected when it reports a change
    fn edit_grid(
        &mut self,
        block: BlockId,
        result: &mut EditResult,
        edit: impl FnOnce(&mut GridBlock, &mut IdAllocator) -> bool,
    ) {
        let ids = &mut self.ids;
        let changed = self
            .blocks
            .iter_mut()
            .find(|b| b.id == block)
            .and_then(Block::as_grid_mut)
            .is_some_and(|grid| edit(grid, ids));
        if changed {
            result.affected_blocks.push(block);
        }
    }

    /// Keep `order` equal to array position
    fn reindex(&mut self) {
        for (index, block) in self.blocks.iter_mut().enumerate() {
            block.order = index as u32;
        }
    }

    /// Number prompt-numbered blocks consecutively in document order
    fn renumber_prompts(&mut self) {
        let mut next = 1;
        for block in &mut self.blocks {
            if block.show_prompt_number {
                block.prompt_number = Some(next);
                next += 1;
            } else {
                block.prompt_number = None;
            }
        }
    }
}
