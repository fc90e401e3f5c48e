//! Core element types.

pub mod id;
pub mod node;
pub mod edge;
pub mod group;

pub use id::{ContainerId, NodeId, EdgeId, GroupId};
pub use node::Node;
pub use edge::Edge;
pub use group::{Group, ROOT_LEVEL};
