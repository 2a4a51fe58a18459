//! Page-level render diff protocol

use crate::layout::Page;
use serde::Serialize;

/// A single patch operation for the render surface
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RenderPatch {
    /// A page that did not exist before
    InsertPage { page: Page },
    /// A page past the end of the new page list
    RemovePage { page_number: u32 },
    /// A page whose blocks or used height changed
    UpdatePage { page: Page },
}

/// Complete render diff to send to the renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderDiff {
    pub version: u64,
    pub patches: Vec<RenderPatch>,
}

impl RenderDiff {
    /// Create empty diff
    pub fn new(version: u64) -> Self {
        Self {
            version,
            patches: Vec::new(),
        }
    }

    /// Compare two page lists. Pages that did not change produce no patch.
    pub fn between(version: u64, previous: &[Page], current: &[Page]) -> Self {
        let mut diff = Self::new(version);

        for (index, page) in current.iter().enumerate() {
            match previous.get(index) {
                Some(old) if old == page => {}
                Some(_) => diff.add_patch(RenderPatch::UpdatePage { page: page.clone() }),
                None => diff.add_patch(RenderPatch::InsertPage { page: page.clone() }),
            }
        }

        for old in previous.iter().skip(current.len()) {
            diff.add_patch(RenderPatch::RemovePage {
                page_number: old.page_number,
            });
        }

        diff
    }

    pub fn add_patch(&mut self, patch: RenderPatch) {
        self.patches.push(patch);
    }

    pub fn has_patches(&self) -> bool {
        !self.patches.is_empty()
    }

    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BlockId;
    use crate::layout::paginate;

    fn pages(heights: &[f32]) -> Vec<Page> {
        let items = heights
            .iter()
            .enumerate()
            .map(|(i, h)| (BlockId(i as u64 + 1), Some(*h)));
        paginate(items, 1000.0).unwrap()
    }

    #[test]
    fn test_unchanged_pages_produce_no_patches() {
        let a = pages(&[400.0, 400.0, 400.0]);
        let diff = RenderDiff::between(3, &a, &a);
        assert!(!diff.has_patches());
        assert_eq!(diff.version, 3);
    }

    #[test]
    fn test_growth_updates_and_inserts() {
        let before = pages(&[400.0, 400.0, 400.0]);
        let after = pages(&[400.0, 700.0, 400.0]);
        let diff = RenderDiff::between(4, &before, &after);

        assert_eq!(diff.patch_count(), 3);
        assert!(matches!(&diff.patches[0], RenderPatch::UpdatePage { page } if page.page_number == 1));
        assert!(matches!(&diff.patches[1], RenderPatch::UpdatePage { page } if page.page_number == 2));
        assert!(matches!(&diff.patches[2], RenderPatch::InsertPage { page } if page.page_number == 3));
    }

    #[test]
    fn test_shrink_removes_trailing_pages() {
        let before = pages(&[600.0, 600.0, 600.0]);
        let after = pages(&[600.0]);
        let diff = RenderDiff::between(5, &before, &after);
        assert_eq!(
            diff.patches,
            vec![
                RenderPatch::RemovePage { page_number: 2 },
                RenderPatch::RemovePage { page_number: 3 },
            ]
        );
    }

    #[test]
    fn test_patch_json_shape() {
        let patch = RenderPatch::RemovePage { page_number: 2 };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["kind"], "removePage");
        assert_eq!(json["pageNumber"], 2);
    }
}
