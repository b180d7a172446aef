use crate::agent::ActionEntry;

/// Append-only, insertion-ordered log of the steps taken for one request.
///
/// Entries can be pushed and read, never edited, removed or reordered.
#[derive(Debug, Default)]
pub struct ActionTrail {
    entries: Vec<ActionEntry>,
}

impl ActionTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ActionEntry) {
        tracing::debug!(action = %entry.label(), ok = entry.ok, duration_ms = entry.duration_ms, "action recorded");
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ActionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<ActionEntry> {
        self.entries
    }
}
