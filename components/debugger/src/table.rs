//! Breakpoint storage
//!
//! Breakpoints live in a dense slot list. Removal tombstones the slot and
//! queues it for reuse; ids are allocated separately and never repeat.

use crate::breakpoint::{Breakpoint, BreakpointId, BreakpointKind};
use crate::error::DebuggerError;
use std::collections::HashMap;

#[derive(Debug)]
struct Slot {
    id: BreakpointId,
    breakpoint: Breakpoint,
}

/// Slot list plus the id and key indexes.
#[derive(Debug, Default)]
pub(crate) struct BreakpointTable {
    slots: Vec<Option<Slot>>,
    free_slots: Vec<usize>,
    by_id: HashMap<BreakpointId, usize>,
    by_kind: HashMap<BreakpointKind, usize>,
    next_id: u64,
}

impl BreakpointTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Id of the breakpoint with this kind, if any
    pub(crate) fn id_of(&self, kind: &BreakpointKind) -> Option<BreakpointId> {
        let slot = *self.by_kind.get(kind)?;
        self.slots[slot].as_ref().map(|slot| slot.id)
    }

    pub(crate) fn add(&mut self, breakpoint: Breakpoint) -> Result<BreakpointId, DebuggerError> {
        if let Some(existing) = self.id_of(&breakpoint.kind()) {
            return Err(DebuggerError::DuplicateBreakpoint(existing));
        }
        let id = BreakpointId::from_raw(self.next_id);
        self.next_id += 1;
        let kind = breakpoint.kind();
        let slot = Slot { id, breakpoint };
        let index = match self.free_slots.pop() {
            Some(index) => {
                self.slots[index] = Some(slot);
                index
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };
        self.by_id.insert(id, index);
        self.by_kind.insert(kind, index);
        Ok(id)
    }

    pub(crate) fn remove(&mut self, id: BreakpointId) -> Result<Breakpoint, DebuggerError> {
        let index = self
            .by_id
            .remove(&id)
            .ok_or(DebuggerError::UnknownBreakpoint(id))?;
        let slot = self.slots[index]
            .take()
            .ok_or(DebuggerError::UnknownBreakpoint(id))?;
        self.by_kind.remove(&slot.breakpoint.kind());
        self.free_slots.push(index);
        Ok(slot.breakpoint)
    }

    pub(crate) fn set_enabled(
        &mut self,
        id: BreakpointId,
        enabled: bool,
    ) -> Result<(), DebuggerError> {
        let index = *self
            .by_id
            .get(&id)
            .ok_or(DebuggerError::UnknownBreakpoint(id))?;
        match self.slots[index].as_mut() {
            Some(slot) => {
                slot.breakpoint.set_enabled(enabled);
                Ok(())
            }
            None => Err(DebuggerError::UnknownBreakpoint(id)),
        }
    }

    pub(crate) fn get(&self, id: BreakpointId) -> Option<&Breakpoint> {
        let index = *self.by_id.get(&id)?;
        self.slots[index].as_ref().map(|slot| &slot.breakpoint)
    }

    /// The enabled breakpoint matching `kind`, trying the exact receiver
    /// first and then every receiver
    pub(crate) fn find(&self, kind: BreakpointKind) -> Option<(BreakpointId, &Breakpoint)> {
        self.enabled(kind)
            .or_else(|| kind.any_receiver().and_then(|any| self.enabled(any)))
    }

    fn enabled(&self, kind: BreakpointKind) -> Option<(BreakpointId, &Breakpoint)> {
        let index = *self.by_kind.get(&kind)?;
        self.slots
            .get(index)?
            .as_ref()
            .filter(|slot| slot.breakpoint.is_enabled())
            .map(|slot| (slot.id, &slot.breakpoint))
    }

    /// Live breakpoints in slot order
    pub(crate) fn iter(&self) -> impl Iterator<Item = (BreakpointId, &Breakpoint)> {
        self.slots
            .iter()
            .flatten()
            .map(|slot| (slot.id, &slot.breakpoint))
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }
}
