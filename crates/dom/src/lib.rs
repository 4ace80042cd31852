//! Arena-backed live document tree.
//!
//! Nodes are owned by a [`Document`] and addressed by [`NodeId`]. The tree
//! hanging from [`Document::root`] is the connected document; any number of
//! detached trees can live in the same arena (parsed content, holding areas).

mod control;
mod document;
mod error;
mod loads;
mod node;
mod serialize;

pub use control::{ControlState, SelectionRange};
pub use document::{Children, Descendants, Document};
pub use error::DomError;
pub use loads::LoadSignal;
pub use node::{ElementData, NodeCategory, NodeData, NodeId, is_void_element};
