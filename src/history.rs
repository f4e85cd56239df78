use crate::geometry::Rect;

/// A deep copy of the rectangle sequence.
pub type Snapshot = Vec<Rect>;

/// Linear undo/redo over whole-scene snapshots. Saving a new state discards
/// the redo branch.
#[derive(Debug, Default, Clone)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the undo stack; the oldest snapshots are dropped first.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn save(&mut self, current: &[Rect]) {
        self.undo_stack.push(current.to_vec());
        self.redo_stack.clear();
        self.trim();
    }

    /// Returns the state to restore, or `None` when there is nothing to undo.
    pub fn undo(&mut self, current: &[Rect]) -> Option<Snapshot> {
        let prev = self.undo_stack.pop()?;
        self.redo_stack.push(current.to_vec());
        Some(prev)
    }

    pub fn redo(&mut self, current: &[Rect]) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current.to_vec());
        self.trim();
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn trim(&mut self) {
        if let Some(limit) = self.limit {
            if self.undo_stack.len() > limit {
                let excess = self.undo_stack.len() - limit;
                self.undo_stack.drain(..excess);
            }
        }
    }
}
