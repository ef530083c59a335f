//! Inline caches for field/method access (spec §4.7, testable properties
//! 9/10).
//!
//! Each `OP_GET_FIELD_IC`/`OP_SET_FIELD_IC`/`OP_INVOKE_IC` site owns one
//! `MonoCache` slot; the `*_PIC` forms own one `PolyCache` slot. Both are
//! mutated in place during execution — the "self-modifying caches" spec.md
//! §9 calls for — modeled here with plain `&mut` access rather than shared
//! mutable state, since the VM is the caches' sole owner and mutator.

use pseudo_core::Obj;
use std::ptr::NonNull;

#[derive(Clone, Copy)]
pub struct CacheEntry {
    pub class: NonNull<Obj>,
    /// Field slot index, or method index into `ClassObj::methods`, per `is_method`.
    pub slot: u16,
    pub is_method: bool,
}

#[derive(Default)]
pub struct MonoCache(Option<CacheEntry>);

impl MonoCache {
    pub fn lookup(&self, class: NonNull<Obj>) -> Option<CacheEntry> {
        self.0.filter(|e| e.class == class)
    }

    pub fn store(&mut self, entry: CacheEntry) {
        self.0 = Some(entry);
    }
}

/// Fixed-capacity polymorphic cache (spec §4.7: "typically ≤4 entries").
/// On overflow, the oldest entry is evicted — correctness never depends on
/// the cache being complete, only on it never reporting a wrong slot for a
/// class it still holds (property 10).
pub const PIC_CAPACITY: usize = 4;

#[derive(Default)]
pub struct PolyCache {
    entries: [Option<CacheEntry>; PIC_CAPACITY],
    next_slot: usize,
}

impl PolyCache {
    pub fn lookup(&self, class: NonNull<Obj>) -> Option<CacheEntry> {
        self.entries.iter().flatten().find(|e| e.class == class).copied()
    }

    pub fn store(&mut self, entry: CacheEntry) {
        if let Some(slot) = self.entries.iter().position(|e| matches!(e, Some(e) if e.class == entry.class)) {
            self.entries[slot] = Some(entry);
            return;
        }
        self.entries[self.next_slot] = Some(entry);
        self.next_slot = (self.next_slot + 1) % PIC_CAPACITY;
    }
}

/// A VM owns one growable table of these per chunk, indexed by the
/// compiler-assigned `ic_slot` operand.
pub enum CacheSite {
    Mono(MonoCache),
    Poly(PolyCache),
}

#[derive(Default)]
pub struct CacheTable {
    sites: Vec<CacheSite>,
}

impl CacheTable {
    pub fn new() -> Self {
        CacheTable { sites: Vec::new() }
    }

    fn ensure(&mut self, index: usize, make: impl Fn() -> CacheSite) {
        if self.sites.len() <= index {
            self.sites.resize_with(index + 1, make);
        }
    }

    pub fn mono(&mut self, index: usize) -> &mut MonoCache {
        self.ensure(index, || CacheSite::Mono(MonoCache::default()));
        match &mut self.sites[index] {
            CacheSite::Mono(m) => m,
            CacheSite::Poly(_) => unreachable!("site {index} already a PIC site"),
        }
    }

    pub fn poly(&mut self, index: usize) -> &mut PolyCache {
        self.ensure(index, || CacheSite::Poly(PolyCache::default()));
        match &mut self.sites[index] {
            CacheSite::Poly(p) => p,
            CacheSite::Mono(_) => unreachable!("site {index} already an IC site"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr::NonNull;

    fn fake_ptr(n: usize) -> NonNull<Obj> {
        NonNull::new(n as *mut Obj).unwrap()
    }

    #[test]
    fn mono_cache_hits_same_class_misses_other() {
        let mut c = MonoCache::default();
        let class_a = fake_ptr(8);
        c.store(CacheEntry {
            class: class_a,
            slot: 3,
            is_method: false,
        });
        assert!(c.lookup(class_a).is_some());
        assert!(c.lookup(fake_ptr(16)).is_none());
    }

    #[test]
    fn poly_cache_holds_up_to_capacity_and_evicts_oldest() {
        let mut c = PolyCache::default();
        for i in 0..(PIC_CAPACITY + 1) {
            c.store(CacheEntry {
                class: fake_ptr((i + 1) * 8),
                slot: i as u16,
                is_method: false,
            });
        }
        // The first-inserted class was evicted; the rest remain resolvable.
        assert!(c.lookup(fake_ptr(8)).is_none());
        assert!(c.lookup(fake_ptr((PIC_CAPACITY + 1) * 8)).is_some());
    }
}
