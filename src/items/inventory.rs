use serde::Serialize;

use crate::items::ItemDescriptor;

/// Capacity check and insert, split so callers can query before mutating
/// anything else.
pub trait ItemSink {
    fn can_accept(&self, item: &ItemDescriptor) -> bool;
    /// Returns false, leaving the sink unchanged, when there is no room.
    fn insert(&mut self, item: ItemDescriptor) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemStack {
    pub item: ItemDescriptor,
    pub quantity: u32,
}

/// Fixed-size slot inventory. Items with the same name stack.
#[derive(Debug, Clone)]
pub struct Inventory {
    slots: Vec<Option<ItemStack>>,
    selected: usize,
    max_stack: u32,
}

impl Inventory {
    pub fn new(slot_count: usize, max_stack: u32) -> Self {
        Inventory {
            slots: vec![None; slot_count],
            selected: 0,
            max_stack: max_stack.max(1),
        }
    }

    pub fn slots(&self) -> &[Option<ItemStack>] {
        &self.slots
    }

    pub fn select(&mut self, slot: usize) {
        if slot < self.slots.len() {
            self.selected = slot;
        }
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&ItemDescriptor> {
        self.slots
            .get(self.selected)
            .and_then(|s| s.as_ref())
            .map(|s| &s.item)
    }

    pub fn count(&self, name: &str) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.item.name == name)
            .map(|s| s.quantity)
            .sum()
    }

    fn stack_slot(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| {
            s.as_ref()
                .is_some_and(|s| s.item.name == name && s.quantity < self.max_stack)
        })
    }

    fn empty_slot(&self) -> Option<usize> {
        self.slots.iter().position(|s| s.is_none())
    }

    /// Remove one unit of the named item. Returns false when none is held.
    pub fn remove_one(&mut self, name: &str) -> bool {
        let Some(idx) = self
            .slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.item.name == name))
        else {
            return false;
        };
        self.take_from(idx).is_some()
    }

    /// Remove one unit from the selected slot.
    pub fn take_selected(&mut self) -> Option<ItemDescriptor> {
        self.take_from(self.selected)
    }

    fn take_from(&mut self, idx: usize) -> Option<ItemDescriptor> {
        let slot = self.slots.get_mut(idx)?;
        let stack = slot.as_mut()?;
        let item = stack.item.clone();
        stack.quantity -= 1;
        if stack.quantity == 0 {
            *slot = None;
        }
        Some(item)
    }
}

impl ItemSink for Inventory {
    fn can_accept(&self, item: &ItemDescriptor) -> bool {
        self.stack_slot(&item.name).is_some() || self.empty_slot().is_some()
    }

    fn insert(&mut self, item: ItemDescriptor) -> bool {
        if let Some(idx) = self.stack_slot(&item.name) {
            if let Some(stack) = self.slots[idx].as_mut() {
                stack.quantity += 1;
                return true;
            }
        }
        match self.empty_slot() {
            Some(idx) => {
                self.slots[idx] = Some(ItemStack { item, quantity: 1 });
                true
            }
            None => false,
        }
    }
}
