//! Character-box grid content: sections and boxes

use crate::document::id::{BoxId, IdAllocator, SectionId};
use crate::document::move_item;
use crate::error::Result;
use crate::layout::{pack_lines, section_width, BoxSize, Line};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Boxes in a freshly created section
pub const DEFAULT_GRID_BOX_COUNT: usize = 10;

/// Most boxes a section may hold: ten full lines of the smallest box size
pub const MAX_SECTION_BOXES: usize = 10 * 23;

fn default_true() -> bool {
    true
}

/// A single character box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterBox {
    pub id: BoxId,
    /// Primary glyph
    #[serde(default)]
    pub text: String,
    /// Reading aid shown above the glyph (furigana)
    #[serde(default)]
    pub annotation: String,
}

impl CharacterBox {
    pub fn new(ids: &mut IdAllocator) -> Self {
        Self::with_text(ids, String::new())
    }

    pub fn with_text(ids: &mut IdAllocator, text: String) -> Self {
        Self {
            id: ids.boxed(),
            text,
            annotation: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.annotation.is_empty()
    }
}

/// Which text field of a box to edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxField {
    Text,
    Annotation,
}

/// Where a new section goes relative to its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionPosition {
    Left,
    Right,
}

/// A run of equally sized boxes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    #[serde(default)]
    pub box_size: BoxSize,
    pub boxes: Vec<CharacterBox>,
    #[serde(default = "default_true")]
    pub show_guides: bool,
}

impl Section {
    pub fn new(ids: &mut IdAllocator, box_count: usize) -> Self {
        let id = ids.section();
        Self {
            id,
            box_size: BoxSize::default(),
            boxes: (0..box_count.max(1)).map(|_| CharacterBox::new(ids)).collect(),
            show_guides: true,
        }
    }

    /// Rendered width in pixels
    pub fn width_px(&self) -> f32 {
        section_width(self.boxes.len(), self.box_size)
    }

    /// Give this section and every box a fresh id
    pub(crate) fn refresh_ids(&mut self, ids: &mut IdAllocator) {
        self.id = ids.section();
        for b in &mut self.boxes {
            b.id = ids.boxed();
        }
    }
}

/// Grid block payload. Always holds at least one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridBlock {
    pub sections: Vec<Section>,
}

impl GridBlock {
    pub fn new(ids: &mut IdAllocator) -> Self {
        Self {
            sections: vec![Section::new(ids, DEFAULT_GRID_BOX_COUNT)],
        }
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    fn section_index(&self, id: SectionId) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    fn section_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    /// Total boxes across all sections
    pub fn box_count(&self) -> usize {
        self.sections.iter().map(|s| s.boxes.len()).sum()
    }

    /// Arrange sections into lines for the given usable width
    pub fn lines(&self, usable_width_px: f32) -> Result<Vec<Line>> {
        pack_lines(&self.sections, usable_width_px)
    }

    /// Insert a default section beside `anchor`, or append when there is none
    pub(crate) fn add_section(
        &mut self,
        ids: &mut IdAllocator,
        position: SectionPosition,
        anchor: Option<SectionId>,
    ) -> SectionId {
        let section = Section::new(ids, DEFAULT_GRID_BOX_COUNT);
        let id = section.id;

        let index = anchor
            .and_then(|a| self.section_index(a))
            .map(|i| match position {
                SectionPosition::Left => i,
                SectionPosition::Right => i + 1,
            })
            .unwrap_or(self.sections.len());

        self.sections.insert(index, section);
        id
    }

    /// Remove a section unless it is the last one
    pub(crate) fn delete_section(&mut self, id: SectionId) -> bool {
        if self.sections.len() <= 1 {
            return false;
        }
        match self.section_index(id) {
            Some(index) => {
                self.sections.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn change_box_size(&mut self, id: SectionId, size: BoxSize) -> bool {
        match self.section_mut(id) {
            Some(section) if section.box_size != size => {
                section.box_size = size;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn set_guides(&mut self, id: SectionId, show: bool) -> bool {
        match self.section_mut(id) {
            Some(section) if section.show_guides != show => {
                section.show_guides = show;
                true
            }
            _ => false,
        }
    }

    /// Grow or shrink a section from its end. Never below one box.
    pub(crate) fn modify_box_count(
        &mut self,
        ids: &mut IdAllocator,
        id: SectionId,
        delta: i32,
    ) -> bool {
        let Some(section) = self.section_mut(id) else {
            return false;
        };

        let new_count = section.boxes.len() as i64 + delta as i64;
        if delta == 0 || new_count < 1 || new_count > MAX_SECTION_BOXES as i64 {
            return false;
        }

        if delta > 0 {
            for _ in 0..delta {
                section.boxes.push(CharacterBox::new(ids));
            }
        } else {
            section.boxes.truncate(new_count as usize);
        }
        true
    }

    pub(crate) fn reorder_sections(&mut self, source: SectionId, destination: SectionId) -> bool {
        if source == destination {
            return false;
        }
        match (self.section_index(source), self.section_index(destination)) {
            (Some(from), Some(to)) => {
                move_item(&mut self.sections, from, to);
                true
            }
            _ => false,
        }
    }

    /// Move boxes `[at..]` into a new section placed right after this one
    pub(crate) fn split_section(
        &mut self,
        ids: &mut IdAllocator,
        id: SectionId,
        at: usize,
    ) -> Option<SectionId> {
        let index = self.section_index(id)?;
        let section = &mut self.sections[index];
        if at == 0 || at >= section.boxes.len() {
            return None;
        }

        let tail = section.boxes.split_off(at);
        let new_section = Section {
            id: ids.section(),
            box_size: section.box_size,
            boxes: tail,
            show_guides: section.show_guides,
        };
        let new_id = new_section.id;
        self.sections.insert(index + 1, new_section);
        Some(new_id)
    }

    /// Insert one box per grapheme cluster of `text`, pushing later boxes right
    pub(crate) fn insert_glyphs(
        &mut self,
        ids: &mut IdAllocator,
        id: SectionId,
        at: usize,
        text: &str,
    ) -> bool {
        let Some(section) = self.section_mut(id) else {
            return false;
        };

        let at = at.min(section.boxes.len());
        let inserted: Vec<CharacterBox> = text
            .graphemes(true)
            .filter(|g| !g.chars().all(char::is_whitespace))
            .map(|g| CharacterBox::with_text(ids, g.to_string()))
            .collect();
        if inserted.is_empty() || section.boxes.len() + inserted.len() > MAX_SECTION_BOXES {
            return false;
        }

        section.boxes.splice(at..at, inserted);
        true
    }

    pub(crate) fn update_box(
        &mut self,
        section: SectionId,
        box_id: BoxId,
        field: BoxField,
        value: String,
    ) -> bool {
        let Some(target) = self
            .section_mut(section)
            .and_then(|s| s.boxes.iter_mut().find(|b| b.id == box_id))
        else {
            return false;
        };

        let slot = match field {
            BoxField::Text => &mut target.text,
            BoxField::Annotation => &mut target.annotation,
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    pub(crate) fn refresh_ids(&mut self, ids: &mut IdAllocator) {
        for section in &mut self.sections {
            section.refresh_ids(ids);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> (IdAllocator, GridBlock) {
        let mut ids = IdAllocator::new();
        let grid = GridBlock::new(&mut ids);
        (ids, grid)
    }

    #[test]
    fn test_default_grid() {
        let (_, grid) = grid();
        assert_eq!(grid.sections.len(), 1);
        assert_eq!(grid.sections[0].boxes.len(), DEFAULT_GRID_BOX_COUNT);
        assert_eq!(grid.sections[0].box_size, BoxSize::Size10mm);
        assert!(grid.sections[0].show_guides);
    }

    #[test]
    fn test_add_section_left_and_right() {
        let (mut ids, mut grid) = grid();
        let first = grid.sections[0].id;

        let right = grid.add_section(&mut ids, SectionPosition::Right, Some(first));
        let left = grid.add_section(&mut ids, SectionPosition::Left, Some(first));
        let order: Vec<_> = grid.sections.iter().map(|s| s.id).collect();
        assert_eq!(order, vec![left, first, right]);

        let appended = grid.add_section(&mut ids, SectionPosition::Left, None);
        assert_eq!(grid.sections.last().map(|s| s.id), Some(appended));
    }

    #[test]
    fn test_box_count_is_capped() {
        let (mut ids, mut grid) = grid();
        let section = grid.sections[0].id;
        let before = grid.clone();

        assert!(!grid.modify_box_count(&mut ids, section, i32::MAX));
        assert!(!grid.insert_glyphs(&mut ids, section, 0, &"x".repeat(MAX_SECTION_BOXES)));
        assert_eq!(grid, before);

        let room = (MAX_SECTION_BOXES - DEFAULT_GRID_BOX_COUNT) as i32;
        assert!(grid.modify_box_count(&mut ids, section, room));
        assert_eq!(grid.sections[0].boxes.len(), MAX_SECTION_BOXES);
        assert!(!grid.modify_box_count(&mut ids, section, 1));
    }

    #[test]
    fn test_last_section_cannot_be_deleted() {
        let (_, mut grid) = grid();
        let only = grid.sections[0].id;
        let before = grid.clone();
        assert!(!grid.delete_section(only));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_modify_box_count_floor() {
        let (mut ids, mut grid) = grid();
        let id = grid.sections[0].id;

        assert!(grid.modify_box_count(&mut ids, id, 2));
        assert_eq!(grid.sections[0].boxes.len(), 12);
        assert!(grid.modify_box_count(&mut ids, id, -11));
        assert_eq!(grid.sections[0].boxes.len(), 1);

        let before = grid.clone();
        assert!(!grid.modify_box_count(&mut ids, id, -1));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_split_section() {
        let (mut ids, mut grid) = grid();
        let id = grid.sections[0].id;
        let moved = grid.sections[0].boxes[4].id;

        let new_id = grid.split_section(&mut ids, id, 4).unwrap();
        assert_eq!(grid.sections.len(), 2);
        assert_eq!(grid.sections[0].boxes.len(), 4);
        assert_eq!(grid.sections[1].id, new_id);
        assert_eq!(grid.sections[1].boxes[0].id, moved);

        assert!(grid.split_section(&mut ids, id, 0).is_none());
        assert!(grid.split_section(&mut ids, id, 4).is_none());
    }

    #[test]
    fn test_insert_glyphs_pushes_boxes() {
        let (mut ids, mut grid) = grid();
        let id = grid.sections[0].id;
        let first = grid.sections[0].boxes[0].id;

        assert!(grid.insert_glyphs(&mut ids, id, 0, "日本語"));
        let section = &grid.sections[0];
        assert_eq!(section.boxes.len(), 13);
        let texts: Vec<_> = section.boxes[..3].iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["日", "本", "語"]);
        assert_eq!(section.boxes[3].id, first);
    }

    #[test]
    fn test_insert_glyphs_keeps_clusters_together() {
        let (mut ids, mut grid) = grid();
        let id = grid.sections[0].id;
        // e + combining acute is one cluster
        assert!(grid.insert_glyphs(&mut ids, id, 99, "e\u{301}a"));
        let section = &grid.sections[0];
        assert_eq!(section.boxes.len(), 12);
        assert_eq!(section.boxes[10].text, "e\u{301}");
        assert_eq!(section.boxes[11].text, "a");

        assert!(!grid.insert_glyphs(&mut ids, id, 0, "  "));
    }

    #[test]
    fn test_update_box() {
        let (_, mut grid) = grid();
        let section = grid.sections[0].id;
        let target = grid.sections[0].boxes[2].id;

        assert!(grid.update_box(section, target, BoxField::Annotation, "か".into()));
        assert_eq!(grid.sections[0].boxes[2].annotation, "か");
        assert!(!grid.update_box(section, target, BoxField::Annotation, "か".into()));
        assert!(!grid.update_box(section, BoxId(9999), BoxField::Text, "x".into()));
    }

    #[test]
    fn test_reorder_sections() {
        let (mut ids, mut grid) = grid();
        let a = grid.sections[0].id;
        let b = grid.add_section(&mut ids, SectionPosition::Right, Some(a));
        let c = grid.add_section(&mut ids, SectionPosition::Right, Some(b));

        assert!(grid.reorder_sections(a, c));
        let order: Vec<_> = grid.sections.iter().map(|s| s.id).collect();
        assert_eq!(order, vec![b, c, a]);
        assert!(!grid.reorder_sections(a, a));
    }
}
