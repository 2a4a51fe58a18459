//! Undo/Redo system with snapshot transactions

use crate::document::{Block, Document, Metadata};
use crate::editing::Selection;

/// Editor state captured on one side of a transaction
#[derive(Debug, Clone)]
struct State {
    blocks: Vec<Block>,
    metadata: Metadata,
    selection: Selection,
}

impl State {
    fn capture(document: &Document, selection: &Selection) -> Self {
        Self {
            blocks: document.blocks().to_vec(),
            metadata: document.metadata().clone(),
            selection: *selection,
        }
    }

    fn restore(&self, document: &mut Document) -> Selection {
        document.restore(self.blocks.clone(), self.metadata.clone());
        self.selection
    }
}

/// A single transaction that can be undone/redone
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Description of the operation
    pub description: String,
    /// Timestamp of the commit (milliseconds)
    pub timestamp: u64,
    before: State,
    after: State,
}

/// A pending transaction: only the before state is known
#[derive(Debug, Clone)]
struct Pending {
    description: String,
    before: State,
}

/// Undo/Redo manager
#[derive(Debug, Clone)]
pub struct UndoManager {
    /// Stack of undoable transactions
    undo_stack: Vec<Transaction>,
    /// Stack of redoable transactions
    redo_stack: Vec<Transaction>,
    /// Maximum history depth
    max_depth: usize,
    /// Current transaction being built
    pending: Option<Pending>,
}

impl UndoManager {
    /// Create a new undo manager
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            pending: None,
        }
    }

    /// Begin a new transaction from the current state
    pub fn begin_transaction(&mut self, description: &str, document: &Document, selection: &Selection) {
        self.pending = Some(Pending {
            description: description.to_string(),
            before: State::capture(document, selection),
        });
    }

    /// Commit the current transaction with the state after the edit
    pub fn commit(&mut self, document: &Document, selection: &Selection) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        // Clear redo stack on new edit
        self.redo_stack.clear();
        self.undo_stack.push(Transaction {
            description: pending.description,
            timestamp: current_timestamp(),
            before: pending.before,
            after: State::capture(document, selection),
        });

        // Enforce depth limit
        if self.undo_stack.len() > self.max_depth {
            let excess = self.undo_stack.len() - self.max_depth;
            self.undo_stack.drain(..excess);
        }
    }

    /// Drop the pending transaction (the edit changed nothing)
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Undo the last transaction, returning the selection to restore
    pub fn undo(&mut self, document: &mut Document) -> Option<Selection> {
        let txn = self.undo_stack.pop()?;
        let selection = txn.before.restore(document);
        self.redo_stack.push(txn);
        Some(selection)
    }

    /// Redo the last undone transaction, returning the selection to restore
    pub fn redo(&mut self, document: &mut Document) -> Option<Selection> {
        let txn = self.redo_stack.pop()?;
        let selection = txn.after.restore(document);
        self.undo_stack.push(txn);
        Some(selection)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Committed transactions, oldest first
    pub fn history(&self) -> impl Iterator<Item = &Transaction> {
        self.undo_stack.iter()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.pending = None;
    }
}

/// Get current timestamp in milliseconds
pub(crate) fn current_timestamp() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BlockId, BlockKind};
    use crate::editing::EditOp;

    fn edit(manager: &mut UndoManager, doc: &mut Document, op: EditOp) -> Option<BlockId> {
        let selection = Selection::default();
        manager.begin_transaction(op.name(), doc, &selection);
        let result = doc.apply_edit(op);
        if result.has_changes() {
            manager.commit(doc, &selection);
        } else {
            manager.cancel();
        }
        result.created_blocks.first().copied()
    }

    fn add(manager: &mut UndoManager, doc: &mut Document) -> BlockId {
        let op = EditOp::AddBlock {
            kind: BlockKind::Text,
            after: None,
        };
        edit(manager, doc, op).unwrap()
    }

    #[test]
    fn test_undo_manager_creation() {
        let manager = UndoManager::new(100);
        assert!(!manager.can_undo());
        assert!(!manager.can_redo());
    }

    #[test]
    fn test_undo_redo_block_order() {
        let mut manager = UndoManager::new(100);
        let mut doc = Document::new();
        let a = add(&mut manager, &mut doc);
        let b = add(&mut manager, &mut doc);
        let c = add(&mut manager, &mut doc);

        edit(
            &mut manager,
            &mut doc,
            EditOp::ReorderBlocks {
                source: c,
                destination: a,
            },
        );
        assert_eq!(doc.block_order().collect::<Vec<_>>(), vec![c, a, b]);

        manager.undo(&mut doc);
        assert_eq!(doc.block_order().collect::<Vec<_>>(), vec![a, b, c]);
        assert!(manager.can_redo());

        manager.redo(&mut doc);
        assert_eq!(doc.block_order().collect::<Vec<_>>(), vec![c, a, b]);
        assert_eq!(doc.block(c).map(|blk| blk.order), Some(0));
    }

    #[test]
    fn test_noop_edit_not_recorded() {
        let mut manager = UndoManager::new(100);
        let mut doc = Document::new();
        edit(&mut manager, &mut doc, EditOp::DeleteBlock { id: BlockId(42) });
        assert_eq!(manager.undo_depth(), 0);
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut manager = UndoManager::new(100);
        let mut doc = Document::new();
        add(&mut manager, &mut doc);
        manager.undo(&mut doc);
        assert_eq!(manager.redo_depth(), 1);
        add(&mut manager, &mut doc);
        assert_eq!(manager.redo_depth(), 0);
    }

    #[test]
    fn test_ids_not_reused_after_undo() {
        let mut manager = UndoManager::new(100);
        let mut doc = Document::new();
        let first = add(&mut manager, &mut doc);
        manager.undo(&mut doc);
        let second = add(&mut manager, &mut doc);
        assert_ne!(first, second);
    }

    #[test]
    fn test_max_depth() {
        let mut manager = UndoManager::new(3);
        let mut doc = Document::new();
        for _ in 0..5 {
            add(&mut manager, &mut doc);
        }

        // Should be limited to max_depth
        assert_eq!(manager.undo_depth(), 3);
        assert_eq!(manager.history().count(), 3);
        while manager.undo(&mut doc).is_some() {}
        assert_eq!(doc.len(), 2);
    }
}
