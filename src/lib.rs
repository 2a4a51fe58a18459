//! Mini-Sheet: worksheet pagination and layout core
//!
//! This crate provides the editing engine behind a printable worksheet editor:
//! - Block document model with sanitized rich text and stable ids
//! - Greedy order-preserving pagination over measured block heights
//! - Line wrapping of character-box sections inside grid blocks
//! - Debounced recalculation driven by caller timestamps
//! - Snapshot undo/redo and a page-level render diff

pub mod document;
pub mod editing;
pub mod error;
pub mod layout;
pub mod render;
pub mod undo;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmWorksheet;

// Re-export primary types
pub use document::{
    Block, BlockContent, BlockId, BlockKind, BlockPatch, Document, DocumentSnapshot, MemoryStore,
    SectionId, SnapshotStore,
};
pub use editing::{EditOp, EditResult, Focus, Selection};
pub use error::{Result, SheetError};
pub use layout::{
    compute_pages, pack_lines, BoxSize, HeightCache, LayoutConfig, LayoutState, Line, Page,
    PageGeometry,
};
pub use render::{RenderDiff, RenderPatch};
pub use undo::UndoManager;

use crate::document::{BoxField, BoxId, SectionPosition, StatementId, TermField, TermId};
use log::{debug, warn};

/// Undo history depth
pub const UNDO_DEPTH: usize = 100;

/// The main worksheet state combining all components
#[derive(Debug, Clone)]
pub struct Worksheet {
    document: Document,
    selection: Selection,
    layout: LayoutState,
    undo_manager: UndoManager,
}

impl Worksheet {
    /// Create an empty worksheet. Fails if the page geometry has no usable area.
    pub fn new(config: LayoutConfig) -> Result<Self> {
        Ok(Self {
            document: Document::new(),
            selection: Selection::default(),
            layout: LayoutState::new(&config)?,
            undo_manager: UndoManager::new(UNDO_DEPTH),
        })
    }

    /// Create a worksheet from a snapshot
    pub fn with_snapshot(snapshot: DocumentSnapshot, config: LayoutConfig) -> Result<Self> {
        let mut sheet = Self::new(config)?;
        sheet.load(snapshot)?;
        Ok(sheet)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn layout(&self) -> &LayoutState {
        &self.layout
    }

    pub fn undo_manager(&self) -> &UndoManager {
        &self.undo_manager
    }

    /// Select a block, or clear the selection with `None`
    pub fn select(&mut self, block: Option<BlockId>) {
        self.selection = match block.filter(|id| self.document.contains(*id)) {
            Some(id) => Selection::block(id),
            None => Selection::default(),
        };
    }

    /// Apply an edit as one undoable step
    pub fn apply(&mut self, op: EditOp) -> EditResult {
        self.undo_manager
            .begin_transaction(op.name(), &self.document, &self.selection);

        let result = self.document.apply_edit(op);
        if !result.has_changes() {
            self.undo_manager.cancel();
            return result;
        }

        let document = &self.document;
        self.selection
            .follow(&result, |block, section| document.has_section(block, section));
        self.undo_manager.commit(&self.document, &self.selection);
        self.layout.invalidate(&result);
        result
    }

    /// Add a block after `after` (or at the end) and select it
    pub fn add_block(&mut self, kind: BlockKind, after: Option<BlockId>) -> BlockId {
        let result = self.apply(EditOp::AddBlock { kind, after });
        // AddBlock always creates exactly one block
        result.created_blocks[0]
    }

    pub fn delete_block(&mut self, id: BlockId) -> EditResult {
        self.apply(EditOp::DeleteBlock { id })
    }

    pub fn reorder_blocks(&mut self, source: BlockId, destination: BlockId) -> EditResult {
        self.apply(EditOp::ReorderBlocks {
            source,
            destination,
        })
    }

    /// Duplicate a block, returning the copy's id
    pub fn duplicate_block(&mut self, id: BlockId) -> Option<BlockId> {
        self.apply(EditOp::DuplicateBlock { id })
            .created_blocks
            .first()
            .copied()
    }

    pub fn update_block(&mut self, id: BlockId, patch: BlockPatch) -> EditResult {
        self.apply(EditOp::UpdateBlock { id, patch })
    }

    /// Add a section to a grid block, returning its id
    pub fn add_section(
        &mut self,
        block: BlockId,
        position: SectionPosition,
        anchor: Option<SectionId>,
    ) -> Option<SectionId> {
        let result = self.apply(EditOp::AddSection {
            block,
            position,
            anchor,
        });
        match result.focus {
            Some(Focus::Section(_, section)) => Some(section),
            _ => None,
        }
    }

    pub fn delete_section(&mut self, block: BlockId, section: SectionId) -> EditResult {
        self.apply(EditOp::DeleteSection { block, section })
    }

    pub fn change_box_size(&mut self, block: BlockId, section: SectionId, size: BoxSize) -> EditResult {
        self.apply(EditOp::ChangeBoxSize {
            block,
            section,
            size,
        })
    }

    pub fn set_section_guides(&mut self, block: BlockId, section: SectionId, show: bool) -> EditResult {
        self.apply(EditOp::SetSectionGuides {
            block,
            section,
            show,
        })
    }

    pub fn modify_box_count(&mut self, block: BlockId, section: SectionId, delta: i32) -> EditResult {
        self.apply(EditOp::ModifyBoxCount {
            block,
            section,
            delta,
        })
    }

    pub fn reorder_sections(
        &mut self,
        block: BlockId,
        source: SectionId,
        destination: SectionId,
    ) -> EditResult {
        self.apply(EditOp::ReorderSections {
            block,
            source,
            destination,
        })
    }

    pub fn split_section(&mut self, block: BlockId, section: SectionId, at: usize) -> EditResult {
        self.apply(EditOp::SplitSection { block, section, at })
    }

    pub fn insert_glyphs(
        &mut self,
        block: BlockId,
        section: SectionId,
        at: usize,
        text: &str,
    ) -> EditResult {
        self.apply(EditOp::InsertGlyphs {
            block,
            section,
            at,
            text: text.to_string(),
        })
    }

    pub fn update_box(
        &mut self,
        block: BlockId,
        section: SectionId,
        box_id: BoxId,
        field: BoxField,
        value: &str,
    ) -> EditResult {
        self.apply(EditOp::UpdateBox {
            block,
            section,
            box_id,
            field,
            value: value.to_string(),
        })
    }

    pub fn add_term(&mut self, block: BlockId) -> EditResult {
        self.apply(EditOp::AddTerm { block })
    }

    pub fn remove_term(&mut self, block: BlockId, term: TermId) -> EditResult {
        self.apply(EditOp::RemoveTerm { block, term })
    }

    pub fn update_term(&mut self, block: BlockId, term: TermId, field: TermField, value: &str) -> EditResult {
        self.apply(EditOp::UpdateTerm {
            block,
            term,
            field,
            value: value.to_string(),
        })
    }

    pub fn add_statement(&mut self, block: BlockId) -> EditResult {
        self.apply(EditOp::AddStatement { block })
    }

    pub fn remove_statement(&mut self, block: BlockId, statement: StatementId) -> EditResult {
        self.apply(EditOp::RemoveStatement { block, statement })
    }

    pub fn update_metadata(&mut self, title: Option<String>, subject: Option<String>) -> EditResult {
        self.apply(EditOp::UpdateMetadata { title, subject })
    }

    /// Record a rendered height. Heights for unknown blocks are ignored.
    pub fn report_height(&mut self, id: BlockId, height: f32, now_ms: f64) -> bool {
        if !self.document.contains(id) {
            return false;
        }
        self.layout.report_height(id, height, now_ms)
    }

    /// Recalculate pages if the layout is dirty and measurements have settled
    pub fn tick(&mut self, now_ms: f64) -> Result<Option<RenderDiff>> {
        if !self.layout.is_due(now_ms) {
            return Ok(None);
        }
        self.layout.relayout(&self.document).map(Some)
    }

    /// Recalculate pages now if anything changed since the last pass
    pub fn update_layout(&mut self) -> Result<Option<RenderDiff>> {
        if !self.layout.is_dirty() {
            return Ok(None);
        }
        self.layout.relayout(&self.document).map(Some)
    }

    pub fn pages(&self) -> &[Page] {
        self.layout.pages()
    }

    pub fn page_count(&self) -> usize {
        self.layout.page_count()
    }

    pub fn block_count(&self) -> usize {
        self.document.len()
    }

    /// Page number currently holding `id`
    pub fn page_of(&self, id: BlockId) -> Option<u32> {
        layout::page_of(self.layout.pages(), id)
    }

    /// Line layout of a grid block's sections
    pub fn grid_lines(&self, id: BlockId) -> Result<Option<Vec<Line>>> {
        let width = self.layout.geometry().content_width_px();
        self.document
            .block(id)
            .and_then(Block::as_grid)
            .map(|grid| grid.lines(width))
            .transpose()
    }

    /// Undo the last operation
    pub fn undo(&mut self) -> bool {
        match self.undo_manager.undo(&mut self.document) {
            Some(selection) => {
                self.selection = selection;
                self.layout.invalidate_all(&self.document);
                true
            }
            None => false,
        }
    }

    /// Redo the last undone operation
    pub fn redo(&mut self) -> bool {
        match self.undo_manager.redo(&mut self.document) {
            Some(selection) => {
                self.selection = selection;
                self.layout.invalidate_all(&self.document);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.undo_manager.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo_manager.can_redo()
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        self.document.to_snapshot()
    }

    /// Replace the document. On error nothing changes.
    pub fn load(&mut self, snapshot: DocumentSnapshot) -> Result<()> {
        let mut document = match Document::from_snapshot(snapshot) {
            Ok(document) => document,
            Err(err) => {
                warn!("rejected snapshot: {}", err);
                return Err(err);
            }
        };
        document.reserve_ids_below(self.document.next_id());
        debug!("loaded {} blocks", document.len());

        self.document = document;
        self.selection.clear();
        self.undo_manager.clear();
        self.layout.reset();
        Ok(())
    }

    pub fn load_from(&mut self, store: &dyn SnapshotStore) -> Result<()> {
        let snapshot = store.load()?;
        self.load(snapshot)
    }

    /// Stamp the metadata and hand a snapshot to `store`
    pub fn save_to(&mut self, store: &mut dyn SnapshotStore) -> Result<()> {
        self.document.stamp(undo::current_timestamp() as f64);
        store.save(&self.document.to_snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::snapshot_to_json;

    fn sheet() -> Worksheet {
        Worksheet::new(LayoutConfig::default()).unwrap()
    }

    fn page_ids(sheet: &Worksheet) -> Vec<Vec<BlockId>> {
        sheet.pages().iter().map(|p| p.block_ids.clone()).collect()
    }

    #[test]
    fn test_create_worksheet() {
        let sheet = sheet();
        assert_eq!(sheet.block_count(), 0);
        assert_eq!(sheet.page_count(), 1);
        assert!(sheet.selection().is_empty());
    }

    #[test]
    fn test_rejects_bad_config() {
        let config = LayoutConfig {
            page_height_mm: 10.0,
            ..Default::default()
        };
        assert!(matches!(
            Worksheet::new(config),
            Err(SheetError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_add_selects_and_delete_clears() {
        let mut sheet = sheet();
        let a = sheet.add_block(BlockKind::Grid, None);
        assert_eq!(sheet.selection().block, Some(a));

        sheet.delete_block(a);
        assert!(sheet.selection().is_empty());
        assert_eq!(sheet.block_count(), 0);
    }

    #[test]
    fn test_structural_edit_repaginates_on_next_tick() {
        let mut sheet = sheet();
        let a = sheet.add_block(BlockKind::Text, None);
        let diff = sheet.tick(0.0).unwrap().unwrap();
        assert_eq!(diff.patch_count(), 1);
        assert_eq!(page_ids(&sheet), vec![vec![a]]);
        assert!(sheet.tick(1.0).unwrap().is_none());
    }

    #[test]
    fn test_measurements_are_debounced() {
        let mut sheet = sheet();
        let ids: Vec<_> = (0..3).map(|_| sheet.add_block(BlockKind::Text, None)).collect();
        sheet.tick(0.0).unwrap();

        for id in &ids {
            sheet.report_height(*id, 400.0, 1_000.0);
        }
        assert!(sheet.tick(1_050.0).unwrap().is_none());
        assert_eq!(sheet.page_count(), 1);

        assert!(sheet.tick(1_100.0).unwrap().is_some());
        assert_eq!(page_ids(&sheet), vec![vec![ids[0], ids[1]], vec![ids[2]]]);
        assert_eq!(sheet.page_of(ids[2]), Some(2));
    }

    #[test]
    fn test_edit_inside_window_is_not_lost() {
        let mut sheet = sheet();
        let a = sheet.add_block(BlockKind::Text, None);
        sheet.report_height(a, 300.0, 0.0);
        let b = sheet.add_block(BlockKind::Text, None);

        assert!(sheet.tick(40.0).unwrap().is_none());
        sheet.tick(120.0).unwrap();
        assert_eq!(page_ids(&sheet), vec![vec![a, b]]);
    }

    #[test]
    fn test_report_for_unknown_block_ignored() {
        let mut sheet = sheet();
        assert!(!sheet.report_height(BlockId(99), 10.0, 0.0));
        assert!(sheet.update_layout().unwrap().is_none());
    }

    #[test]
    fn test_update_layout_forces_recalculation() {
        let mut sheet = sheet();
        let a = sheet.add_block(BlockKind::Vocabulary, None);
        sheet.report_height(a, 2_000.0, 0.0);
        assert!(sheet.update_layout().unwrap().is_some());
        assert_eq!(sheet.pages()[0].used_height, 2_000.0);
        assert!(sheet.update_layout().unwrap().is_none());
    }

    #[test]
    fn test_undo_redo() {
        let mut sheet = sheet();
        let a = sheet.add_block(BlockKind::Header, None);
        let b = sheet.add_block(BlockKind::Grid, None);
        sheet.reorder_blocks(b, a);
        assert_eq!(sheet.document().block_order().collect::<Vec<_>>(), vec![b, a]);

        assert!(sheet.undo());
        assert_eq!(sheet.document().block_order().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(sheet.selection().block, Some(b));

        assert!(sheet.redo());
        assert_eq!(sheet.document().block_order().collect::<Vec<_>>(), vec![b, a]);
        assert!(!sheet.redo());

        sheet.update_layout().unwrap();
        assert_eq!(page_ids(&sheet), vec![vec![b, a]]);
    }

    #[test]
    fn test_grid_workflow() {
        let mut sheet = sheet();
        let grid = sheet.add_block(BlockKind::Grid, None);
        let first = sheet.document().block(grid).and_then(Block::as_grid).unwrap().sections[0].id;

        let second = sheet
            .add_section(grid, SectionPosition::Right, Some(first))
            .unwrap();
        assert_eq!(sheet.selection().section, Some(second));

        let lines = sheet.grid_lines(grid).unwrap().unwrap();
        assert_eq!(lines.len(), 2);

        sheet.modify_box_count(grid, first, -7);
        sheet.modify_box_count(grid, second, -7);
        let lines = sheet.grid_lines(grid).unwrap().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].section_ids.as_slice(), &[first, second]);

        sheet.delete_section(grid, second);
        assert_eq!(sheet.selection().section, None);
        assert!(!sheet.delete_section(grid, first).has_changes());
        assert!(sheet.grid_lines(BlockId(12345)).unwrap().is_none());
    }

    #[test]
    fn test_load_and_save() {
        let mut sheet = sheet();
        let a = sheet.add_block(BlockKind::Vocabulary, None);
        sheet.update_metadata(Some("Lesson 4".into()), None);

        let mut store = MemoryStore::new();
        sheet.save_to(&mut store).unwrap();
        let saved = sheet.snapshot();
        assert!(saved.metadata.updated_at > 0.0);

        let mut other = Worksheet::new(LayoutConfig::default()).unwrap();
        other.add_block(BlockKind::Text, None);
        other.load_from(&store).unwrap();
        assert_eq!(other.snapshot(), saved);
        assert!(!other.can_undo());
        assert!(other.document().contains(a));

        let fresh = other.add_block(BlockKind::Text, None);
        assert_ne!(fresh, a);
    }

    #[test]
    fn test_failed_load_leaves_state_untouched() {
        let mut sheet = sheet();
        let a = sheet.add_block(BlockKind::Grid, None);
        sheet.update_layout().unwrap();
        let before = sheet.snapshot();

        let mut bad = before.clone();
        bad.blocks.push(bad.blocks[0].clone());
        assert!(sheet.load(bad).is_err());

        let store = MemoryStore::with_json("{\"blocks\": 3}");
        assert!(sheet.load_from(&store).is_err());

        assert_eq!(sheet.snapshot(), before);
        assert_eq!(sheet.selection().block, Some(a));
        assert!(sheet.can_undo());
        assert_eq!(page_ids(&sheet), vec![vec![a]]);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut sheet = sheet();
        sheet.add_block(BlockKind::Header, None);
        let grid = sheet.add_block(BlockKind::Grid, None);
        let section = sheet.document().block(grid).and_then(Block::as_grid).unwrap().sections[0].id;
        sheet.insert_glyphs(grid, section, 0, "ねこ");
        sheet.add_block(BlockKind::TrueFalse, None);

        let json = snapshot_to_json(&sheet.snapshot()).unwrap();
        let parsed = document::snapshot_from_json(&json).unwrap();
        let loaded = Worksheet::with_snapshot(parsed, LayoutConfig::default()).unwrap();
        assert_eq!(loaded.snapshot(), sheet.snapshot());
    }
}
