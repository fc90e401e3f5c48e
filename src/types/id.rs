//! Identity types for graph elements and their containers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONTAINER: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an element container (a graph or a hierarchy).
///
/// Every element id and attribute handle carries the id of the container that
/// issued it, so ids handed to the wrong graph are rejected instead of
/// silently aliasing another graph's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContainerId(u64);

impl ContainerId {
    /// Allocate a fresh container id.
    pub(crate) fn fresh() -> Self {
        Self(NEXT_CONTAINER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

macro_rules! element_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            owner: ContainerId,
            index: u32,
        }

        impl $name {
            pub(crate) fn new(owner: ContainerId, index: usize) -> Self {
                Self { owner, index: index as u32 }
            }

            /// Numeric identity, unique within the owning container.
            pub fn id(&self) -> u32 {
                self.index
            }

            /// Container that issued this id.
            pub fn owner(&self) -> ContainerId {
                self.owner
            }

            pub(crate) fn index(&self) -> usize {
                self.index as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.index)
            }
        }
    };
}

element_id! {
    /// Identity of a node. Issued by a [`Graph`](crate::Graph), never reused.
    NodeId
}

element_id! {
    /// Identity of an edge. Issued by a [`Graph`](crate::Graph), never reused.
    EdgeId
}

element_id! {
    /// Identity of a group. Issued by a [`Hierarchy`](crate::Hierarchy), never reused.
    GroupId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containers_are_unique() {
        let a = ContainerId::fresh();
        let b = ContainerId::fresh();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn test_ids_from_different_owners_differ() {
        let a = ContainerId::fresh();
        let b = ContainerId::fresh();
        let n1 = NodeId::new(a, 3);
        let n2 = NodeId::new(b, 3);

        assert_eq!(n1.id(), n2.id());
        assert_ne!(n1, n2);
        assert_eq!(n1.to_string(), "3");
    }
}
