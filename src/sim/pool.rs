//! Generational object pools
//!
//! Each entity kind lives in a [`Pool`]: a slot arena addressed by
//! [`Handle`]s. A handle is an `(index, generation)` pair; releasing a slot
//! bumps its generation so handles held elsewhere (AI targets, magnet targets)
//! go stale instead of aliasing whatever reuses the slot.
//!
//! Released instances are reset and kept for reuse up to the pool capacity.
//! Beyond that they are dropped, and their slot is refilled with a fresh
//! allocation later. Acquiring never fails.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::entity::Entity;

/// Generation-checked reference to an entity in a [`Pool`]
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
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

/// Allocation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances created because no pooled one was available
    pub allocated: u64,
    /// Acquisitions served from the pool
    pub reused: u64,
    /// Released instances dropped because the pool was full
    pub dropped: u64,
}

struct Slot<T> {
    generation: u32,
    live: bool,
    value: Option<T>,
}

/// Slot arena with a bounded free-instance pool
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    /// Free slots that still hold a reset instance
    pooled: Vec<u32>,
    /// Free slots whose instance was dropped
    vacant: Vec<u32>,
    capacity: usize,
    live: usize,
    stats: PoolStats,
    over_capacity: bool,
    label: &'static str,
}

impl<T: Entity + Default> Pool<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            pooled: Vec::with_capacity(capacity),
            vacant: Vec::new(),
            capacity,
            live: 0,
            stats: PoolStats::default(),
            over_capacity: false,
            label: T::KIND.as_str(),
        }
    }

    /// Take a pooled instance or allocate one. The instance is in its reset state.
    pub fn acquire(&mut self) -> (Handle<T>, &mut T) {
        let index = if let Some(index) = self.pooled.pop() {
            self.stats.reused += 1;
            index
        } else if let Some(index) = self.vacant.pop() {
            self.stats.allocated += 1;
            self.slots[index as usize].value = Some(T::default());
            index
        } else {
            self.stats.allocated += 1;
            self.slots.push(Slot {
                generation: 0,
                live: false,
                value: Some(T::default()),
            });
            (self.slots.len() - 1) as u32
        };
        self.occupy(index)
    }

    /// Place an externally constructed instance into the arena
    pub fn insert(&mut self, value: T) -> Handle<T> {
        let index = if let Some(index) = self.vacant.pop() {
            index
        } else if let Some(index) = self.pooled.pop() {
            index
        } else {
            self.slots.push(Slot {
                generation: 0,
                live: false,
                value: None,
            });
            (self.slots.len() - 1) as u32
        };
        self.slots[index as usize].value = Some(value);
        self.stats.allocated += 1;
        self.occupy(index).0
    }

    fn occupy(&mut self, index: u32) -> (Handle<T>, &mut T) {
        self.live += 1;
        if self.live > self.capacity && !self.over_capacity {
            self.over_capacity = true;
            log::warn!(
                "{} pool over capacity ({} live, capacity {}), allocating past the limit",
                self.label,
                self.live,
                self.capacity
            );
        }

        let slot = &mut self.slots[index as usize];
        slot.live = true;
        let handle = Handle::new(index, slot.generation);
        let value = slot
            .value
            .get_or_insert_with(T::default);
        (handle, value)
    }

    fn slot(&self, handle: Handle<T>) -> Option<&Slot<T>> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.live && s.generation == handle.generation)
    }

    /// Resolve a handle, including entities despawned this tick but not yet swept
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slot(handle).and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.live && s.generation == handle.generation)
            .and_then(|s| s.value.as_mut())
    }

    /// Resolve a handle to an entity that is still active
    pub fn get_active(&self, handle: Handle<T>) -> Option<&T> {
        self.get(handle).filter(|e| e.is_active())
    }

    pub fn get_active_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.get_mut(handle).filter(|e| e.is_active())
    }

    pub fn is_active(&self, handle: Handle<T>) -> bool {
        self.get_active(handle).is_some()
    }

    /// Active entities in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            let value = s.value.as_ref()?;
            (s.live && value.is_active()).then(|| (Handle::new(i as u32, s.generation), value))
        })
    }

    /// Active entities in slot order, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, s)| {
            let generation = s.generation;
            let live = s.live;
            let value = s.value.as_mut()?;
            (live && value.is_active()).then(|| (Handle::new(i as u32, generation), value))
        })
    }

    /// Snapshot of the active handles (stable for the rest of the tick)
    pub fn handles(&self) -> Vec<Handle<T>> {
        self.iter().map(|(h, _)| h).collect()
    }

    /// Number of active entities
    pub fn active_count(&self) -> usize {
        self.iter().count()
    }

    /// Number of occupied slots (active plus despawned-but-unswept)
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Reset instances waiting for reuse
    pub fn pooled_count(&self) -> usize {
        self.pooled.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Release every occupied slot whose entity is no longer active.
    ///
    /// Returns how many were released.
    pub fn sweep_inactive(&mut self) -> usize {
        let mut released = 0;
        for index in 0..self.slots.len() {
            let slot = &self.slots[index];
            let dead = slot.live && slot.value.as_ref().is_none_or(|v| !v.is_active());
            if dead {
                self.release(index as u32);
                released += 1;
            }
        }
        released
    }

    /// Deactivate and release everything
    pub fn release_all(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].live {
                if let Some(value) = self.slots[index].value.as_mut() {
                    value.body_mut().deactivate();
                }
                self.release(index as u32);
            }
        }
    }

    fn release(&mut self, index: u32) {
        let keep = self.pooled.len() < self.capacity;
        let slot = &mut self.slots[index as usize];
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);

        if keep {
            if let Some(value) = slot.value.as_mut() {
                value.reset();
                self.pooled.push(index);
                self.live -= 1;
                self.refresh_capacity_flag();
                return;
            }
        }

        slot.value = None;
        self.stats.dropped += 1;
        self.vacant.push(index);
        self.live -= 1;
        self.refresh_capacity_flag();
    }

    fn refresh_capacity_flag(&mut self) {
        if self.live <= self.capacity {
            self.over_capacity = false;
        }
    }
}
