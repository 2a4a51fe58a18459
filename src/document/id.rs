//! Stable identifiers for blocks and their sub-entities

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a top-level block
    BlockId
);
define_id!(
    /// Identifier of a grid section
    SectionId
);
define_id!(
    /// Identifier of a character box
    BoxId
);
define_id!(
    /// Identifier of a vocabulary term
    TermId
);
define_id!(
    /// Identifier of a true/false statement
    StatementId
);

/// Upper bound (exclusive) on document ids. Ids cross the WASM boundary as JS
/// numbers, which are exact only up to 2^53.
pub const MAX_ID: u64 = 1 << 53;

/// Monotonic id source shared by every entity kind in a document.
///
/// Values are never handed out twice, so a clone can never collide with a
/// live entity, and an id freed by deletion is never reused.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocator that resumes after the largest id already in use
    pub fn starting_after(max_used: u64) -> Self {
        Self {
            next: max_used.saturating_add(1),
        }
    }

    fn take(&mut self) -> u64 {
        let id = self.next;
        // Loaded ids are bounded by MAX_ID, far below u64::MAX
        self.next = id.checked_add(1).unwrap_or(u64::MAX);
        id
    }

    pub fn block(&mut self) -> BlockId {
        BlockId(self.take())
    }

    pub fn section(&mut self) -> SectionId {
        SectionId(self.take())
    }

    pub fn boxed(&mut self) -> BoxId {
        BoxId(self.take())
    }

    pub fn term(&mut self) -> TermId {
        TermId(self.take())
    }

    pub fn statement(&mut self) -> StatementId {
        StatementId(self.take())
    }

    /// Raise the floor so the next id is above `max_used`
    pub fn reserve_through(&mut self, max_used: u64) {
        if self.next <= max_used {
            self.next = max_used.saturating_add(1);
        }
    }

    /// Next value that will be handed out
    pub fn peek(&self) -> u64 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_across_kinds() {
        let mut ids = IdAllocator::new();
        let block = ids.block();
        let section = ids.section();
        let term = ids.term();
        assert_ne!(block.0, section.0);
        assert_ne!(section.0, term.0);
    }

    #[test]
    fn test_reserve_through_never_goes_backwards() {
        let mut ids = IdAllocator::starting_after(10);
        assert_eq!(ids.block(), BlockId(11));
        ids.reserve_through(5);
        assert_eq!(ids.peek(), 12);
        ids.reserve_through(40);
        assert_eq!(ids.section(), SectionId(41));
    }

    #[test]
    fn test_take_does_not_overflow() {
        let mut ids = IdAllocator::starting_after(u64::MAX - 1);
        assert_eq!(ids.block(), BlockId(u64::MAX));
        assert_eq!(ids.peek(), u64::MAX);
    }

    #[test]
    fn test_id_serializes_as_number() {
        assert_eq!(serde_json::to_string(&BlockId(7)).unwrap(), "7");
        let id: TermId = serde_json::from_str("12").unwrap();
        assert_eq!(id, TermId(12));
    }
}
