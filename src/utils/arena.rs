//! Generational storage with weak, liveness-checked handles
//!
//! Every cross reference in this crate (an icon's owner, a redirect target, a limbo entry)
//! is a [`Handle`] into an [`Arena`]. A handle never keeps its value alive: once the value is
//! removed, its slot's generation is bumped and every outstanding handle to it resolves to `None`,
//! even after the slot has been reused for a new value.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Weak reference to a value stored in an [`Arena`]
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Slot index of this handle, stable for the lifetime of the value
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time the value was inserted
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl<T> Clone for Handle<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

enum Entry<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32 },
}

impl<T> Entry<T> {
    fn generation(&self) -> u32 {
        match self {
            Entry::Occupied { generation, .. } | Entry::Vacant { generation } => *generation,
        }
    }
}

/// Slot storage handing out generation-checked [`Handle`]s
pub struct Arena<T> {
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena {
            entries: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T> Arena<T> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live values
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the arena holds no live value
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store a value and return a handle to it
    pub fn insert(&mut self, value: T) -> Handle<T> {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            let generation = entry.generation().wrapping_add(1);
            *entry = Entry::Occupied { generation, value };
            return Handle {
                index,
                generation,
                _marker: PhantomData,
            };
        }

        let index = u32::try_from(self.entries.len()).unwrap_or_else(|_| panic!("Out of arena slots"));
        self.entries.push(Entry::Occupied { generation: 0, value });
        Handle {
            index,
            generation: 0,
            _marker: PhantomData,
        }
    }

    /// Remove the value behind `handle`, invalidating every copy of the handle
    ///
    /// Returns `None` if the handle was already dead.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        let entry = self.entries.get_mut(handle.index as usize)?;
        if !matches!(entry, Entry::Occupied { generation, .. } if *generation == handle.generation) {
            return None;
        }

        let old = std::mem::replace(
            entry,
            Entry::Vacant {
                generation: handle.generation,
            },
        );
        self.free.push(handle.index);
        self.len -= 1;
        match old {
            Entry::Occupied { value, .. } => Some(value),
            Entry::Vacant { .. } => None,
        }
    }

    /// Check whether the value behind `handle` is still alive
    #[inline]
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Resolve a handle, returning `None` if the value is gone
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        match self.entries.get(handle.index as usize)? {
            Entry::Occupied { generation, value } if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    /// Resolve a handle mutably, returning `None` if the value is gone
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        match self.entries.get_mut(handle.index as usize)? {
            Entry::Occupied { generation, value } if *generation == handle.generation => Some(value),
            _ => None,
        }
    }

    /// Iterate over live values together with their handles, in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.entries.iter().enumerate().filter_map(|(index, entry)| match entry {
            Entry::Occupied { generation, value } => Some((
                Handle {
                    index: index as u32,
                    generation: *generation,
                    _marker: PhantomData,
                },
                value,
            )),
            Entry::Vacant { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_handles_resolve_to_none() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.remove(a), Some("a"));
        assert!(arena.get(a).is_none());
        assert!(arena.remove(a).is_none());
        assert!(arena.is_empty());
    }

    #[test]
    fn reused_slots_do_not_revive_old_handles() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        arena.remove(a);
        let b = arena.insert(2);
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(arena.get(a).is_none());
        assert_eq!(arena.get(b), Some(&2));
    }

    #[test]
    fn iter_skips_vacant_slots() {
        let mut arena = Arena::new();
        let a = arena.insert('a');
        let b = arena.insert('b');
        let c = arena.insert('c');
        arena.remove(b);
        let live: Vec<_> = arena.iter().map(|(h, v)| (h, *v)).collect();
        assert_eq!(live, vec![(a, 'a'), (c, 'c')]);
        assert_eq!(arena.len(), 2);
    }
}
