// SPDX-License-Identifier: MIT OR Apache-2.0
//! Change notifications for graph observers.
//!
//! A UI layer subscribes once and mirrors node and wire changes from the
//! events it receives instead of polling the graph.

use crate::connection::Connection;
use crate::node::NodeId;
use crate::port::PortId;
use crate::value::ShaderValue;

/// Unique identifier for a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// A change made to a graph
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// A node joined the graph under `name`
    NodeAdded {
        /// Node ID
        id: NodeId,
        /// Final, unique name
        name: String,
    },
    /// A node left the graph
    NodeRemoved {
        /// Node ID
        id: NodeId,
    },
    /// A node changed its instance name
    NodeRenamed {
        /// Node ID
        id: NodeId,
        /// Name before the change
        old: String,
        /// Name after the change
        new: String,
    },
    /// A node moved on the canvas
    NodeMoved {
        /// Node ID
        id: NodeId,
        /// New position
        position: [f32; 2],
    },
    /// An input fallback value was edited
    FallbackChanged {
        /// Node ID
        id: NodeId,
        /// Input port
        port: PortId,
        /// New fallback
        value: ShaderValue,
    },
    /// A connection was created
    ConnectionAdded(Connection),
    /// A connection was removed
    ConnectionRemoved(Connection),
}

/// Receiver of graph change notifications
pub trait GraphObserver {
    /// Handle a graph event
    fn on_event(&mut self, event: &GraphEvent);
}

impl<F> GraphObserver for F
where
    F: FnMut(&GraphEvent),
{
    fn on_event(&mut self, event: &GraphEvent) {
        self(event);
    }
}

/// Ordered list of subscribed observers
#[derive(Default)]
pub(crate) struct ObserverList {
    observers: Vec<(ObserverId, Box<dyn GraphObserver>)>,
    next_id: u64,
}

impl ObserverList {
    pub(crate) fn subscribe(&mut self, observer: Box<dyn GraphObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        tracing::debug!("Graph observer subscribed: {:?}", id);
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> bool {
        if let Some(pos) = self.observers.iter().position(|(o, _)| *o == id) {
            self.observers.remove(pos);
            tracing::debug!("Graph observer removed: {:?}", id);
            true
        } else {
            false
        }
    }

    pub(crate) fn notify(&mut self, event: &GraphEvent) {
        for (_, observer) in &mut self.observers {
            observer.on_event(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }
}

impl std::fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList")
            .field("count", &self.observers.len())
            .finish()
    }
}
