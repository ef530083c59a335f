//! Open-addressed, string-keyed hash table shared by dicts (§3.2) and the
//! globals table (§2, "Globals table"). Both are specified identically
//! ("open-addressed... grows at 75% load... capacity always a power of two"),
//! so one implementation backs both rather than duplicating linear-probing
//! logic, the way the teacher shares low-level table mechanics across its
//! `Dict`-shaped builtins.

use crate::objects::string::fnv1a;

const INITIAL_CAPACITY: usize = 8;
const MAX_LOAD: f64 = 0.75;

struct Entry<V> {
    key: Box<str>,
    hash: u64,
    value: V,
}

pub struct OpenTable<V> {
    entries: Vec<Option<Entry<V>>>,
    len: usize,
}

impl<V: Clone> OpenTable<V> {
    pub fn new() -> Self {
        OpenTable {
            entries: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        if self.entries.is_empty() {
            return None;
        }
        let hash = fnv1a(key.as_bytes());
        let mask = self.entries.len() - 1;
        let mut idx = (hash as usize) & mask;
        for _ in 0..self.entries.len() {
            match &self.entries[idx] {
                Some(e) if e.hash == hash && &*e.key == key => return Some(&e.value),
                None => return None,
                _ => idx = (idx + 1) & mask,
            }
        }
        None
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or overwrites `key`. Returns `true` if this created a new
    /// entry, `false` if it overwrote an existing one (spec.md invariant 13:
    /// setting a key twice leaves exactly one entry for the most recent
    /// value).
    pub fn set(&mut self, key: &str, value: V) -> bool {
        if self.entries.is_empty() || (self.len + 1) as f64 / self.entries.len() as f64 > MAX_LOAD
        {
            self.grow();
        }
        let hash = fnv1a(key.as_bytes());
        let mask = self.entries.len() - 1;
        let mut idx = (hash as usize) & mask;
        loop {
            match &mut self.entries[idx] {
                Some(e) if e.hash == hash && &*e.key == key => {
                    e.value = value;
                    return false;
                }
                None => {
                    self.entries[idx] = Some(Entry {
                        key: key.into(),
                        hash,
                        value,
                    });
                    self.len += 1;
                    return true;
                }
                _ => idx = (idx + 1) & mask,
            }
        }
    }

    fn grow(&mut self) {
        let new_cap = if self.entries.is_empty() {
            INITIAL_CAPACITY
        } else {
            self.entries.len() * 2
        };
        let old = std::mem::replace(&mut self.entries, {
            let mut v = Vec::with_capacity(new_cap);
            v.resize_with(new_cap, || None);
            v
        });
        self.len = 0;
        let mask = new_cap - 1;
        for entry in old.into_iter().flatten() {
            let mut idx = (entry.hash as usize) & mask;
            while self.entries[idx].is_some() {
                idx = (idx + 1) & mask;
            }
            self.entries[idx] = Some(entry);
            self.len += 1;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries
            .iter()
            .filter_map(|e| e.as_ref().map(|e| (&*e.key, &e.value)))
    }
}

impl<V: Clone> Default for OpenTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_power_of_two_and_grows_at_75_percent() {
        let mut t: OpenTable<i64> = OpenTable::new();
        for i in 0..6 {
            t.set(&format!("k{i}"), i);
            assert!(t.capacity().is_power_of_two());
        }
        assert_eq!(t.len(), 6);
    }

    #[test]
    fn set_twice_overwrites() {
        let mut t: OpenTable<i64> = OpenTable::new();
        assert!(t.set("x", 1));
        assert!(!t.set("x", 2));
        assert_eq!(t.get("x"), Some(&2));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn missing_key_is_none() {
        let t: OpenTable<i64> = OpenTable::new();
        assert_eq!(t.get("nope"), None);
    }
}
