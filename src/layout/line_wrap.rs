//! Greedy line wrapping of grid sections

use crate::document::{Section, SectionId};
use crate::error::{Result, SheetError};
use crate::layout::units::{
    BoxSize, BOX_BORDER_PX, BOX_MARGIN_PX, SECTION_GAP_PX, SECTION_PADDING_PX,
};
use serde::Serialize;
use smallvec::SmallVec;

/// A visual row of sections inside a grid block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub section_ids: SmallVec<[SectionId; 4]>,
    /// Sum of section widths plus the gaps between them
    pub total_width: f32,
}

impl Line {
    fn start(id: SectionId, width: f32) -> Self {
        let mut section_ids = SmallVec::new();
        section_ids.push(id);
        Self {
            section_ids,
            total_width: width,
        }
    }

    pub fn len(&self) -> usize {
        self.section_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.section_ids.is_empty()
    }
}

/// Rendered width of a section in pixels
pub fn section_width(box_count: usize, box_size: BoxSize) -> f32 {
    if box_count == 0 {
        return 2.0 * BOX_BORDER_PX + SECTION_PADDING_PX;
    }
    let n = box_count as f32;
    n * box_size.px() + (n - 1.0) * BOX_MARGIN_PX + 2.0 * BOX_BORDER_PX + SECTION_PADDING_PX
}

/// Pack pre-measured items into lines, first-fit and order-preserving.
///
/// The gap is only counted between items on the same line. An item wider
/// than `usable_width` gets a line to itself.
pub fn pack_widths(items: &[(SectionId, f32)], usable_width: f32, gap: f32) -> Result<Vec<Line>> {
    if !usable_width.is_finite() || usable_width <= 0.0 {
        return Err(SheetError::InvalidUsableWidth(usable_width));
    }

    let mut lines = Vec::new();
    let mut current: Option<Line> = None;

    for &(id, width) in items {
        let width = width.max(0.0);
        match current.as_mut() {
            Some(line) if line.total_width + gap + width <= usable_width => {
                line.section_ids.push(id);
                line.total_width += gap + width;
            }
            _ => {
                if let Some(line) = current.take() {
                    lines.push(line);
                }
                current = Some(Line::start(id, width));
            }
        }
    }

    lines.extend(current);
    Ok(lines)
}

/// Arrange grid sections into lines
pub fn pack_lines(sections: &[Section], usable_width: f32) -> Result<Vec<Line>> {
    let widths: Vec<(SectionId, f32)> = sections.iter().map(|s| (s.id, s.width_px())).collect();
    pack_widths(&widths, usable_width, SECTION_GAP_PX)
}

/// Width left on a line
pub fn remaining_width(line_width: f32, usable_width: f32) -> f32 {
    (usable_width - line_width).max(0.0)
}

/// Index of the line holding `section`
pub fn line_index_of(lines: &[Line], section: SectionId) -> Option<usize> {
    lines.iter().position(|l| l.section_ids.contains(&section))
}
