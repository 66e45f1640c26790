//! Paged object pools.
//!
//! Objects live in fixed-size pages that are never moved once carved.
//! Released slots are threaded onto a free list and reused before a new
//! page is allocated. A [`Registry`] pairs a pool with a symbol-keyed
//! index, which is how the solver stores variables and constraints.

use crate::symbol::Symbol;
use crate::table::SymbolTable;

/// Index of a slot inside a [`Pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PoolKey(usize);

#[derive(Debug)]
enum Slot<T> {
    Vacant { next_free: Option<PoolKey> },
    Occupied(T),
}

#[derive(Debug)]
pub(crate) struct Pool<T> {
    page_slots: usize,
    pages: Vec<Box<[Slot<T>]>>,
    free: Option<PoolKey>,
    live: usize,
}

impl<T> Pool<T> {
    pub(crate) fn new(page_slots: usize) -> Self {
        Self {
            page_slots: page_slots.max(1),
            pages: Vec::new(),
            free: None,
            live: 0,
        }
    }

    /// Store `value`, reusing a released slot when one is available.
    pub(crate) fn alloc(&mut self, value: T) -> PoolKey {
        let key = match self.free {
            Some(key) => key,
            None => self.carve_page(),
        };
        let (page, offset) = self.locate(key);
        match std::mem::replace(&mut self.pages[page][offset], Slot::Occupied(value)) {
            Slot::Vacant { next_free } => self.free = next_free,
            Slot::Occupied(_) => debug_assert!(false, "free list points at a live slot"),
        }
        self.live += 1;
        key
    }

    /// Release a slot, returning its value.
    pub(crate) fn free(&mut self, key: PoolKey) -> Option<T> {
        let (page, offset) = self.locate(key);
        let slot = self.pages.get_mut(page)?.get_mut(offset)?;
        if !matches!(slot, Slot::Occupied(_)) {
            return None;
        }
        let released = std::mem::replace(slot, Slot::Vacant { next_free: self.free });
        self.free = Some(key);
        self.live -= 1;
        match released {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    pub(crate) fn get(&self, key: PoolKey) -> Option<&T> {
        let (page, offset) = self.locate(key);
        match self.pages.get(page)?.get(offset)? {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    pub(crate) fn get_mut(&mut self, key: PoolKey) -> Option<&mut T> {
        let (page, offset) = self.locate(key);
        match self.pages.get_mut(page)?.get_mut(offset)? {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    /// Number of live objects.
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    #[cfg(test)]
    pub(crate) fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn locate(&self, key: PoolKey) -> (usize, usize) {
        (key.0 / self.page_slots, key.0 % self.page_slots)
    }

    /// Allocate a new page, link all but its first slot onto the free list,
    /// and hand out the first slot.
    fn carve_page(&mut self) -> PoolKey {
        let base = self.pages.len() * self.page_slots;
        let tail = self.free;
        let page: Box<[Slot<T>]> = (0..self.page_slots)
            .map(|offset| {
                let next_free = if offset + 1 < self.page_slots {
                    Some(PoolKey(base + offset + 1))
                } else {
                    tail
                };
                Slot::Vacant { next_free }
            })
            .collect();
        self.pages.push(page);
        PoolKey(base)
    }
}

/// Pooled objects addressed by symbol.
#[derive(Debug)]
pub(crate) struct Registry<T> {
    index: SymbolTable<PoolKey>,
    pool: Pool<T>,
}

impl<T> Registry<T> {
    pub(crate) fn new(page_slots: usize) -> Self {
        Self {
            index: SymbolTable::new(),
            pool: Pool::new(page_slots),
        }
    }

    pub(crate) fn insert(&mut self, sym: Symbol, value: T) {
        let key = self.pool.alloc(value);
        if let Some(old) = self.index.insert(sym, key) {
            self.pool.free(old);
        }
    }

    pub(crate) fn get(&self, sym: Symbol) -> Option<&T> {
        let key = *self.index.get(sym)?;
        self.pool.get(key)
    }

    pub(crate) fn get_mut(&mut self, sym: Symbol) -> Option<&mut T> {
        let key = *self.index.get(sym)?;
        self.pool.get_mut(key)
    }

    pub(crate) fn remove(&mut self, sym: Symbol) -> Option<T> {
        let key = self.index.remove(sym)?;
        self.pool.free(key)
    }

    pub(crate) fn len(&self) -> usize {
        debug_assert_eq!(self.index.len(), self.pool.len());
        self.pool.len()
    }

    pub(crate) fn for_each_mut(&mut self, mut f: impl FnMut(&mut T)) {
        for (_, &key) in self.index.iter() {
            if let Some(value) = self.pool.get_mut(key) {
                f(value);
            }
        }
    }
}
