use crate::NodeId;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("inserting {child:?} under {parent:?} would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    #[error("{node:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, node: NodeId },
    #[error("{0:?} cannot have children")]
    NotAContainer(NodeId),
    #[error("{0:?} is not an element")]
    NotAnElement(NodeId),
    #[error("{0:?} is not a text or comment node")]
    NotCharacterData(NodeId),
    #[error("{0:?} is still attached and cannot be released")]
    Attached(NodeId),
    #[error("{0:?} was already released")]
    Released(NodeId),
}
