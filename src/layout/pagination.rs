//! Pagination of the block list into printable pages

use crate::document::{Block, BlockId};
use crate::error::{Result, SheetError};
use crate::layout::measure::HeightCache;
use serde::Serialize;

/// A computed group of blocks that fits one printable page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 1-based
    pub page_number: u32,
    pub block_ids: Vec<BlockId>,
    /// Sum of the measured heights of the blocks on this page
    pub used_height: f32,
}

impl Page {
    fn new(page_number: u32) -> Self {
        Self {
            page_number,
            block_ids: Vec::new(),
            used_height: 0.0,
        }
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.block_ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.block_ids.is_empty()
    }
}

/// Assign blocks to pages in document order.
///
/// Unmeasured blocks count as zero height and stay on the current page until
/// a measurement says otherwise. A block taller than `usable_height` gets a
/// page to itself. An empty document still yields one empty page.
pub fn compute_pages(blocks: &[Block], heights: &HeightCache, usable_height: f32) -> Result<Vec<Page>> {
    paginate(
        blocks.iter().map(|b| (b.id, heights.get(b.id))),
        usable_height,
    )
}

/// Core packing loop over `(id, measured height)` pairs
pub fn paginate(
    items: impl IntoIterator<Item = (BlockId, Option<f32>)>,
    usable_height: f32,
) -> Result<Vec<Page>> {
    if !usable_height.is_finite() || usable_height <= 0.0 {
        return Err(SheetError::InvalidUsableHeight(usable_height));
    }

    let mut pages = Vec::new();
    let mut current = Page::new(1);

    for (id, height) in items {
        let Some(height) = height else {
            current.block_ids.push(id);
            continue;
        };
        let height = if height.is_finite() { height.max(0.0) } else { 0.0 };

        if current.used_height + height <= usable_height {
            current.block_ids.push(id);
            current.used_height += height;
        } else {
            let next_number = if current.is_empty() {
                current.page_number
            } else {
                current.page_number + 1
            };
            if !current.is_empty() {
                pages.push(current);
            }
            current = Page::new(next_number);
            current.block_ids.push(id);
            current.used_height = height;
        }
    }

    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    Ok(pages)
}

/// Page number holding `id`
pub fn page_of(pages: &[Page], id: BlockId) -> Option<u32> {
    pages.iter().find(|p| p.contains(id)).map(|p| p.page_number)
}
