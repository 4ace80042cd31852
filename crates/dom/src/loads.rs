//! Completion signals for externally loaded resources (stylesheets, scripts).
//!
//! The document does not fetch anything. Whoever performs the load reports
//! it through [`Document::complete_load`]; dropping the document (or the
//! pending senders) resolves every outstanding signal as well, which stands
//! in for a load error.

use crate::document::Document;
use crate::node::NodeId;
use futures::channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Resolves once the node's resource finished loading or failed.
#[derive(Debug)]
pub struct LoadSignal {
    node: NodeId,
    receiver: oneshot::Receiver<()>,
}

impl LoadSignal {
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl Future for LoadSignal {
    type Output = NodeId;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<NodeId> {
        // Canceled means the sender side went away; treat as settled.
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(_) => Poll::Ready(self.node),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Document {
    pub fn watch_load(&mut self, node: NodeId) -> LoadSignal {
        let (sender, receiver) = oneshot::channel();
        self.loads.entry(node).or_default().push(sender);
        log::trace!(target: "dom.loads", "watching load of {node:?}");
        LoadSignal { node, receiver }
    }

    /// Settle every signal waiting on `node`. Returns whether any was waiting.
    pub fn complete_load(&mut self, node: NodeId) -> bool {
        let Some(senders) = self.loads.remove(&node) else {
            return false;
        };
        for sender in senders {
            let _ = sender.send(());
        }
        true
    }

    pub fn pending_loads(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.loads.keys().copied().collect();
        nodes.sort();
        nodes
    }
}
