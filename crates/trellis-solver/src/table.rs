//! Open-addressing hash table keyed by [`Symbol`].
//!
//! Collisions are resolved with Brent's variation: every key is reachable
//! from its main position (`id & (size - 1)`) through a chain of slot
//! indices. When the main position is taken by a key that does not belong
//! there, that key is moved to a free slot so the new key can take its
//! place. Free slots are found by scanning downward from the end of the
//! array with a cursor that only moves backward until the next resize.
//!
//! Chains link slot indices rather than addresses, so the whole table can
//! be moved or regrown without fixing up links. Removing a key only nulls
//! it; the slot stays part of its chain until the next resize.

use crate::symbol::Symbol;

const MIN_SIZE: usize = 4;

#[derive(Debug, Clone)]
struct Slot<V> {
    key: Symbol,
    next: Option<usize>,
    /// Another slot's `next` points here.
    linked: bool,
    value: Option<V>,
}

impl<V> Slot<V> {
    fn vacant() -> Self {
        Self {
            key: Symbol::NULL,
            next: None,
            linked: false,
            value: None,
        }
    }

    fn is_free(&self) -> bool {
        self.key.is_null() && self.next.is_none() && !self.linked
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SymbolTable<V> {
    slots: Vec<Slot<V>>,
    count: usize,
    last_free: usize,
}

impl<V> Default for SymbolTable<V> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            count: 0,
            last_free: 0,
        }
    }
}

impl<V> SymbolTable<V> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of slots currently allocated.
    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn contains_key(&self, key: Symbol) -> bool {
        self.find(key).is_some()
    }

    pub(crate) fn get(&self, key: Symbol) -> Option<&V> {
        self.find(key).and_then(|i| self.slots[i].value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, key: Symbol) -> Option<&mut V> {
        self.find(key).and_then(|i| self.slots[i].value.as_mut())
    }

    /// Get the value for `key`, inserting `default()` if it is absent.
    pub(crate) fn get_or_insert_with(
        &mut self,
        key: Symbol,
        default: impl FnOnce() -> V,
    ) -> &mut V {
        debug_assert!(!key.is_null());
        let index = match self.find(key) {
            Some(index) => index,
            None => {
                let index = self.new_key(key);
                self.count += 1;
                index
            }
        };
        self.slots[index].value.get_or_insert_with(default)
    }

    /// Insert a value, returning the previous one.
    pub(crate) fn insert(&mut self, key: Symbol, value: V) -> Option<V> {
        debug_assert!(!key.is_null());
        match self.find(key) {
            Some(index) => self.slots[index].value.replace(value),
            None => {
                let index = self.new_key(key);
                self.count += 1;
                self.slots[index].value = Some(value);
                None
            }
        }
    }

    pub(crate) fn remove(&mut self, key: Symbol) -> Option<V> {
        let index = self.find(key)?;
        let slot = &mut self.slots[index];
        slot.key = Symbol::NULL;
        self.count -= 1;
        slot.value.take()
    }

    /// Drop every entry but keep the allocated slots.
    pub(crate) fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::vacant();
        }
        self.count = 0;
        self.last_free = self.slots.len();
    }

    /// Entries in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (Symbol, &V)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.value.as_ref().map(|value| (slot.key, value)))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (Symbol, &mut V)> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.value.as_mut().map(|value| (slot.key, value)))
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.iter().map(|(key, _)| key)
    }

    fn main_position(&self, key: Symbol) -> usize {
        (key.id() as usize) & (self.slots.len() - 1)
    }

    fn find(&self, key: Symbol) -> Option<usize> {
        if self.slots.is_empty() || key.is_null() {
            return None;
        }
        let mut index = self.main_position(key);
        loop {
            if self.slots[index].key.id() == key.id() {
                return Some(index);
            }
            index = self.slots[index].next?;
        }
    }

    fn take_free_slot(&mut self) -> Option<usize> {
        while self.last_free > 0 {
            self.last_free -= 1;
            if self.slots[self.last_free].is_free() {
                return Some(self.last_free);
            }
        }
        None
    }

    /// Claim a slot for a key that is not yet present.
    fn new_key(&mut self, key: Symbol) -> usize {
        if self.slots.is_empty() {
            self.resize(MIN_SIZE);
        }
        loop {
            let mut main = self.main_position(key);
            if !self.slots[main].key.is_null() {
                let Some(free) = self.take_free_slot() else {
                    self.resize(self.count * 2);
                    continue;
                };
                let home = self.main_position(self.slots[main].key);
                if home != main {
                    // The occupant was displaced here; move it to the free slot.
                    let mut prev = home;
                    while let Some(next) = self.slots[prev].next {
                        if next == main {
                            break;
                        }
                        prev = next;
                    }
                    debug_assert_eq!(self.slots[prev].next, Some(main));
                    self.slots[prev].next = Some(free);
                    let moved = std::mem::replace(&mut self.slots[main], Slot::vacant());
                    self.slots[free] = Slot {
                        linked: true,
                        ..moved
                    };
                } else {
                    // The occupant owns this position; chain the new key behind it.
                    self.slots[free].next = self.slots[main].next;
                    self.slots[free].linked = true;
                    self.slots[main].next = Some(free);
                    main = free;
                }
            }
            self.slots[main].key = key;
            return main;
        }
    }

    fn resize(&mut self, len: usize) {
        let size = len.max(MIN_SIZE).next_power_of_two();
        let old = std::mem::replace(&mut self.slots, (0..size).map(|_| Slot::vacant()).collect());
        self.last_free = size;
        for slot in old {
            if !slot.key.is_null() {
                let index = self.new_key(slot.key);
                self.slots[index].value = slot.value;
            }
        }
    }
}
