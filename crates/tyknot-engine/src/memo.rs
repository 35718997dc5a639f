//! Known-objects table
//!
//! Maps each concrete goal already attempted in the current resolution to the
//! way its value is obtained. A goal is entered before its parameters are
//! resolved so that re-entrant demand finds it.

use crate::error::ResolveError;
use crate::term::TypeTerm;
use crate::value::{Deferred, Value};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub enum MemoEntry {
    /// Fully built and shared
    Ready(Value),
    /// Under construction; readers get the deferred cell
    Pending(Deferred),
    /// Under construction with no placeholder rule; reading is fatal
    Guarded,
}

impl MemoEntry {
    /// Current value of the entry for `goal`
    pub fn read(&self, goal: &TypeTerm) -> Result<Value, ResolveError> {
        match self {
            MemoEntry::Ready(value) => Ok(value.clone()),
            MemoEntry::Pending(cell) => Ok(cell.get().unwrap_or_else(|| Value::new(cell.clone()))),
            MemoEntry::Guarded => Err(ResolveError::CyclicDemand { goal: goal.clone() }),
        }
    }
}

/// Memo table threaded through one top-level resolution
#[derive(Debug, Clone, Default)]
pub struct MemoTable {
    entries: HashMap<TypeTerm, MemoEntry>,
}

impl MemoTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, goal: &TypeTerm) -> Option<&MemoEntry> {
        self.entries.get(goal)
    }

    pub fn insert(&mut self, goal: TypeTerm, entry: MemoEntry) {
        self.entries.insert(goal, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
