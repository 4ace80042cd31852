use dom::{DomError, NodeId};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MorphError {
    #[error("unknown morph style `{0}`")]
    UnknownStyle(String),
    #[error("unknown head style `{0}`")]
    UnknownHeadStyle(String),
    #[error("unknown hook event `{0}`")]
    UnknownEvent(String),
    #[error("cannot morph {0:?}: {1}")]
    InvalidTarget(NodeId, &'static str),
    #[error(transparent)]
    Dom(#[from] DomError),
}
