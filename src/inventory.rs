use crate::constants::*;
use crate::core::block::BlockType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ItemStack {
    pub item: BlockType,
    pub count: u32,
}

impl ItemStack {
    pub const EMPTY: ItemStack = ItemStack {
        item: BlockType::Air,
        count: 0,
    };

    /// A stack of zero items, or of air, is normalised to the empty slot.
    pub fn new(item: BlockType, count: u32) -> Self {
        if count == 0 || item.is_air() {
            Self::EMPTY
        } else {
            ItemStack { item, count }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.item.is_air()
    }
}

type InventoryObserver = Box<dyn FnMut(&[ItemStack]) + Send>;

/// Fixed 36-slot player inventory; the first 9 slots form the hotbar.
pub struct Inventory {
    slots: Vec<ItemStack>,
    observer: Option<InventoryObserver>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    pub fn new() -> Self {
        Inventory {
            slots: vec![ItemStack::EMPTY; INVENTORY_SLOTS],
            observer: None,
        }
    }

    /// Restores saved slots. Missing slots are empty, extra ones are dropped.
    pub fn from_slots(saved: &[ItemStack]) -> Self {
        let mut inventory = Self::new();
        for (slot, stack) in inventory.slots.iter_mut().zip(saved) {
            *slot = ItemStack::new(stack.item, stack.count);
        }
        inventory
    }

    /// Registers the single change callback, replacing any previous one.
    pub fn set_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&[ItemStack]) + Send + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    fn changed(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.slots);
        }
    }

    pub fn slots(&self) -> &[ItemStack] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> ItemStack {
        self.slots.get(index).copied().unwrap_or(ItemStack::EMPTY)
    }

    pub fn hotbar(&self) -> &[ItemStack] {
        &self.slots[..HOTBAR_SLOTS]
    }

    /// Stacks onto the first slot holding `item`, else takes the first empty
    /// slot. Returns false when the inventory is full.
    pub fn add_item(&mut self, item: BlockType, count: u32) -> bool {
        if item.is_air() || count == 0 {
            return true;
        }

        if let Some(slot) = self.slots.iter_mut().find(|s| !s.is_empty() && s.item == item) {
            slot.count = slot.count.saturating_add(count);
        } else if let Some(slot) = self.slots.iter_mut().find(|s| s.is_empty()) {
            *slot = ItemStack::new(item, count);
        } else {
            tracing::debug!("inventory full, dropped {} x{}", item.name(), count);
            return false;
        }
        self.changed();
        true
    }

    /// Takes up to `count` items out of a slot and returns what was taken.
    pub fn remove_from_slot(&mut self, index: usize, count: u32) -> ItemStack {
        let Some(slot) = self.slots.get_mut(index) else {
            return ItemStack::EMPTY;
        };
        if slot.is_empty() || count == 0 {
            return ItemStack::EMPTY;
        }

        let taken = count.min(slot.count);
        let removed = ItemStack::new(slot.item, taken);
        *slot = ItemStack::new(slot.item, slot.count - taken);
        self.changed();
        removed
    }

    pub fn set_slot(&mut self, index: usize, stack: ItemStack) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = ItemStack::new(stack.item, stack.count);
            self.changed();
        }
    }

    pub fn clear(&mut self) {
        self.slots.fill(ItemStack::EMPTY);
        self.changed();
    }

    pub fn count_of(&self, item: BlockType) -> u32 {
        self.slots
            .iter()
            .filter(|s| s.item == item)
            .fold(0u32, |total, s| total.saturating_add(s.count))
    }
}
