//! Block and element selection

use crate::document::{BlockId, SectionId};
use crate::editing::{EditResult, Focus};

/// The currently selected block and, optionally, a section inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub block: Option<BlockId>,
    pub section: Option<SectionId>,
}

impl Selection {
    /// Select a whole block
    pub fn block(id: BlockId) -> Self {
        Self {
            block: Some(id),
            section: None,
        }
    }

    /// Select a section inside a grid block
    pub fn section(block: BlockId, section: SectionId) -> Self {
        Self {
            block: Some(block),
            section: Some(section),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.block.is_none()
    }

    /// Update selection after an edit: follow the requested focus, and drop
    /// anything that no longer exists
    pub fn follow(&mut self, result: &EditResult, section_exists: impl Fn(BlockId, SectionId) -> bool) {
        if let Some(block) = self.block {
            if result.deleted_blocks.contains(&block) {
                self.clear();
            }
        }

        if let (Some(block), Some(section)) = (self.block, self.section) {
            if !section_exists(block, section) {
                self.section = None;
            }
        }

        match result.focus {
            Some(Focus::Block(id)) => *self = Self::block(id),
            Some(Focus::Section(block, section)) => *self = Self::section(block, section),
            None => {}
        }
    }
}
