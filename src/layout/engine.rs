//! Layout state with debounced repagination

use crate::document::{BlockId, Document};
use crate::editing::EditResult;
use crate::error::Result;
use crate::layout::measure::{Debouncer, HeightCache};
use crate::layout::pagination::{compute_pages, Page};
use crate::layout::units::{LayoutConfig, PageGeometry};
use crate::render::RenderDiff;
use log::debug;

/// Pages, measurements and the recalculation trigger for one document
#[derive(Debug, Clone)]
pub struct LayoutState {
    geometry: PageGeometry,
    heights: HeightCache,
    debouncer: Debouncer,
    /// Last computed pages, never empty
    pages: Vec<Page>,
    /// Version of document the pages correspond to
    layout_version: u64,
}

impl LayoutState {
    /// Create layout state, rejecting geometry without a usable area
    pub fn new(config: &LayoutConfig) -> Result<Self> {
        let geometry = config.geometry();
        geometry.validate()?;
        Ok(Self {
            geometry,
            heights: HeightCache::new(),
            debouncer: Debouncer::new(config.debounce_ms, config.max_wait_ms),
            pages: compute_pages(&[], &HeightCache::new(), geometry.content_height_px())?,
            layout_version: 0,
        })
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn heights(&self) -> &HeightCache {
        &self.heights
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    /// Whether pages are behind the document
    pub fn is_dirty(&self) -> bool {
        self.debouncer.is_dirty()
    }

    /// Mark the layout stale after an edit
    pub fn invalidate(&mut self, edit_result: &EditResult) {
        for id in &edit_result.deleted_blocks {
            self.heights.remove(*id);
        }
        if edit_result.needs_repagination() {
            self.debouncer.mark_dirty();
        }
    }

    /// Mark everything stale, dropping measurements of blocks no longer present
    pub fn invalidate_all(&mut self, document: &Document) {
        self.heights.retain(|id| document.contains(id));
        self.debouncer.mark_dirty();
    }

    /// Forget every measurement (a new document was loaded)
    pub fn reset(&mut self) {
        self.heights.clear();
        self.debouncer.mark_dirty();
    }

    /// Record a measured height at `now_ms`
    pub fn report_height(&mut self, id: BlockId, height: f32, now_ms: f64) -> bool {
        let changed = self.heights.record(id, height);
        if changed {
            self.debouncer.note_report(now_ms);
        }
        changed
    }

    /// Whether a debounced recalculation should run at `now_ms`
    pub fn is_due(&self, now_ms: f64) -> bool {
        self.debouncer.is_due(now_ms)
    }

    /// Recompute pages and return what changed
    pub fn relayout(&mut self, document: &Document) -> Result<RenderDiff> {
        let pages = compute_pages(
            document.blocks(),
            &self.heights,
            self.geometry.content_height_px(),
        )?;
        let diff = RenderDiff::between(document.version(), &self.pages, &pages);
        debug!(
            "repaginated {} blocks into {} pages ({} patches)",
            document.len(),
            pages.len(),
            diff.patch_count()
        );

        self.pages = pages;
        self.layout_version = document.version();
        self.debouncer.settle();
        Ok(diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BlockKind;
    use crate::editing::EditOp;

    fn setup(count: usize) -> (Document, LayoutState, Vec<BlockId>) {
        let mut doc = Document::new();
        let mut layout = LayoutState::new(&LayoutConfig::default()).unwrap();
        let mut ids = Vec::new();
        for _ in 0..count {
            let result = doc.apply_edit(EditOp::AddBlock {
                kind: BlockKind::Text,
                after: None,
            });
            layout.invalidate(&result);
            ids.push(result.created_blocks[0]);
        }
        (doc, layout, ids)
    }

    #[test]
    fn test_new_state_has_one_empty_page() {
        let layout = LayoutState::new(&LayoutConfig::default()).unwrap();
        assert_eq!(layout.page_count(), 1);
        assert!(layout.pages()[0].is_empty());
        assert!(!layout.is_dirty());
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let config = LayoutConfig {
            margin_mm: 150.0,
            ..Default::default()
        };
        assert!(LayoutState::new(&config).is_err());
    }

    #[test]
    fn test_measurement_moves_block_to_next_page() {
        let (doc, mut layout, ids) = setup(3);
        layout.relayout(&doc).unwrap();
        assert_eq!(layout.page_count(), 1);

        for id in &ids {
            layout.report_height(*id, 400.0, 0.0);
        }
        assert!(!layout.is_due(50.0));
        assert!(layout.is_due(100.0));

        let diff = layout.relayout(&doc).unwrap();
        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.pages()[1].block_ids, vec![ids[2]]);
        assert_eq!(diff.patch_count(), 2);
        assert!(!layout.is_dirty());
    }

    #[test]
    fn test_delete_prunes_height() {
        let (mut doc, mut layout, ids) = setup(2);
        layout.report_height(ids[0], 300.0, 0.0);
        let result = doc.apply_edit(EditOp::DeleteBlock { id: ids[0] });
        layout.invalidate(&result);
        assert!(layout.heights().get(ids[0]).is_none());
        assert!(layout.is_dirty());
    }

    #[test]
    fn test_metadata_edit_does_not_dirty_layout() {
        let (mut doc, mut layout, _) = setup(1);
        layout.relayout(&doc).unwrap();
        let result = doc.apply_edit(EditOp::UpdateMetadata {
            title: Some("Week 2".into()),
            subject: None,
        });
        layout.invalidate(&result);
        assert!(!layout.is_dirty());
    }

    #[test]
    fn test_relayout_is_idempotent() {
        let (doc, mut layout, ids) = setup(4);
        for (i, id) in ids.iter().enumerate() {
            layout.report_height(*id, 250.0 + i as f32 * 100.0, 0.0);
        }
        layout.relayout(&doc).unwrap();
        let pages = layout.pages().to_vec();
        let diff = layout.relayout(&doc).unwrap();
        assert!(!diff.has_patches());
        assert_eq!(layout.pages(), pages.as_slice());
    }
}
