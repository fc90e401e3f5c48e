//! Attribute slot registry.
//!
//! Attributes are text values attached to the graph as a whole, to nodes, or
//! to groups. Each kind has a fixed-size pool of slots established when the
//! owning container is created. A slot is claimed with `allocate`, which
//! returns an [`AttrHandle`]; every element of that kind then has room for one
//! value under the handle.
//!
//! ## Handle validity
//!
//! A handle is accepted only if all of the following hold:
//!
//! - its validity flag is set (cleared in place by `release`)
//! - it was issued by the same container as the element it is used with
//! - its generation matches the slot's current generation
//!
//! The generation check catches clones of a handle that outlived a release:
//! once a slot is released and reallocated, old copies stay rejected even
//! though they point at the same slot index.

use std::fmt;
use std::marker::PhantomData;

use crate::types::ContainerId;

mod private {
    pub trait Sealed {}
}

/// Marker trait for the three attribute owner kinds.
pub trait AttrKind: private::Sealed {
    /// Human-readable kind name used in errors and logs.
    const NAME: &'static str;
}

/// Attributes of a graph as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {}

/// Per-node attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {}

/// Per-group attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {}

impl private::Sealed for GraphKind {}
impl private::Sealed for NodeKind {}
impl private::Sealed for GroupKind {}

impl AttrKind for GraphKind {
    const NAME: &'static str = "graph";
}

impl AttrKind for NodeKind {
    const NAME: &'static str = "node";
}

impl AttrKind for GroupKind {
    const NAME: &'static str = "group";
}

/// Handle to an allocated attribute slot.
pub struct AttrHandle<K: AttrKind> {
    slot: usize,
    generation: u32,
    valid: bool,
    owner: ContainerId,
    _kind: PhantomData<fn() -> K>,
}

/// Handle to a graph-level attribute.
pub type GraphAttr = AttrHandle<GraphKind>;
/// Handle to a node attribute.
pub type NodeAttr = AttrHandle<NodeKind>;
/// Handle to a group attribute.
pub type GroupAttr = AttrHandle<GroupKind>;

impl<K: AttrKind> AttrHandle<K> {
    /// Slot index within the pool.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Whether the handle has not been released.
    ///
    /// A `true` result does not guarantee acceptance: a clone of a handle
    /// released through another copy keeps its flag but fails the
    /// generation check.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Container that issued the handle.
    pub fn owner(&self) -> ContainerId {
        self.owner
    }
}

impl<K: AttrKind> Clone for AttrHandle<K> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot,
            generation: self.generation,
            valid: self.valid,
            owner: self.owner,
            _kind: PhantomData,
        }
    }
}

impl<K: AttrKind> PartialEq for AttrHandle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot
            && self.generation == other.generation
            && self.valid == other.valid
            && self.owner == other.owner
    }
}

impl<K: AttrKind> Eq for AttrHandle<K> {}

impl<K: AttrKind> fmt::Debug for AttrHandle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrHandle")
            .field("kind", &K::NAME)
            .field("slot", &self.slot)
            .field("generation", &self.generation)
            .field("valid", &self.valid)
            .field("owner", &self.owner)
            .finish()
    }
}

/// Error type for attribute operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttrError {
    /// Every slot of the pool is allocated.
    #[error("No available {kind} string attributes")]
    Exhausted {
        /// Attribute kind.
        kind: &'static str,
    },
    /// The handle was released, or is a stale copy of a released handle.
    #[error("The attribute is invalid")]
    InvalidAttribute,
    /// The handle was issued by a different container than the element's.
    #[error("The attribute belongs to container {handle}, the element to container {element}")]
    ForeignAttribute {
        /// Container that issued the handle.
        handle: ContainerId,
        /// Container that owns the element.
        element: ContainerId,
    },
    /// No value is stored under the handle for this element.
    #[error("The attribute is not set for the {kind}")]
    NotSet {
        /// Attribute kind.
        kind: &'static str,
    },
    /// The element id does not belong to the container.
    #[error("Unknown {kind} {id} for container {owner}")]
    UnknownElement {
        /// Attribute kind.
        kind: &'static str,
        /// Numeric element identity.
        id: u32,
        /// Container the element was looked up in.
        owner: ContainerId,
    },
}

/// Per-element attribute values, one optional value per pool slot.
#[derive(Debug, Clone, Default)]
pub(crate) struct SlotValues(Vec<Option<String>>);

impl SlotValues {
    pub(crate) fn new(size: usize) -> Self {
        Self(vec![None; size])
    }

    fn clear(&mut self, slot: usize) {
        if let Some(value) = self.0.get_mut(slot) {
            *value = None;
        }
    }
}

/// Allocation state of one attribute pool.
#[derive(Debug, Clone)]
pub(crate) struct SlotPool<K: AttrKind> {
    owner: ContainerId,
    allocated: Vec<bool>,
    generations: Vec<u32>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: AttrKind> SlotPool<K> {
    pub(crate) fn new(owner: ContainerId, size: usize) -> Self {
        Self {
            owner,
            allocated: vec![false; size],
            generations: vec![0; size],
            _kind: PhantomData,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.allocated.len()
    }

    #[cfg(test)]
    pub(crate) fn allocated_count(&self) -> usize {
        self.allocated.iter().filter(|a| **a).count()
    }

    /// Claim the lowest-numbered free slot.
    pub(crate) fn allocate(&mut self) -> Result<AttrHandle<K>, AttrError> {
        let Some(slot) = self.allocated.iter().position(|a| !*a) else {
            tracing::warn!(
                kind = K::NAME,
                capacity = self.capacity(),
                "attribute pool exhausted"
            );
            return Err(AttrError::Exhausted { kind: K::NAME });
        };

        self.allocated[slot] = true;
        tracing::debug!(kind = K::NAME, slot, owner = %self.owner, "attribute slot allocated");

        Ok(AttrHandle {
            slot,
            generation: self.generations[slot],
            valid: true,
            owner: self.owner,
            _kind: PhantomData,
        })
    }

    /// Validate a handle against this pool and return its slot index.
    pub(crate) fn resolve(&self, handle: &AttrHandle<K>) -> Result<usize, AttrError> {
        if !handle.valid {
            return Err(AttrError::InvalidAttribute);
        }

        if handle.owner != self.owner {
            return Err(AttrError::ForeignAttribute {
                handle: handle.owner,
                element: self.owner,
            });
        }

        let live = self.allocated.get(handle.slot).copied().unwrap_or(false)
            && self.generations[handle.slot] == handle.generation;

        if !live {
            return Err(AttrError::InvalidAttribute);
        }

        Ok(handle.slot)
    }

    /// Free the handle's slot and invalidate the handle in place.
    ///
    /// Returns the freed slot so the caller can sweep stored values.
    pub(crate) fn release(&mut self, handle: &mut AttrHandle<K>) -> Result<usize, AttrError> {
        let slot = self.resolve(handle)?;

        self.allocated[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        handle.valid = false;

        tracing::debug!(kind = K::NAME, slot, owner = %self.owner, "attribute slot released");
        Ok(slot)
    }

    pub(crate) fn set(
        &self,
        values: &mut SlotValues,
        handle: &AttrHandle<K>,
        value: String,
    ) -> Result<(), AttrError> {
        let slot = self.resolve(handle)?;
        values.0[slot] = Some(value);
        Ok(())
    }

    pub(crate) fn get<'v>(
        &self,
        values: &'v SlotValues,
        handle: &AttrHandle<K>,
    ) -> Result<&'v str, AttrError> {
        let slot = self.resolve(handle)?;
        values.0[slot]
            .as_deref()
            .ok_or(AttrError::NotSet { kind: K::NAME })
    }

    pub(crate) fn is_set(&self, values: &SlotValues, handle: &AttrHandle<K>) -> Result<bool, AttrError> {
        let slot = self.resolve(handle)?;
        Ok(values.0[slot].is_some())
    }

    pub(crate) fn remove(&self, values: &mut SlotValues, handle: &AttrHandle<K>) -> Result<(), AttrError> {
        let slot = self.resolve(handle)?;
        values.clear(slot);
        Ok(())
    }
}

/// Clear `slot` in every value array; run on release.
pub(crate) fn sweep_slot<'a>(slot: usize, values: impl Iterator<Item = &'a mut SlotValues>) {
    for v in values {
        v.clear(slot);
    }
}
