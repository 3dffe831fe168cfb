// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and connections.

use crate::connection::{Connection, ConnectionId, PortRef};
use crate::events::{GraphEvent, GraphObserver, ObserverId, ObserverList};
use crate::kinds::NodeKind;
use crate::node::{is_valid_name, Node, NodeId};
use crate::port::PortId;
use crate::value::{ShaderValue, ValueType};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// A shader node graph
///
/// Nodes live in an arena keyed by [`NodeId`]; every node owns its incoming
/// connections, which address their source by `(NodeId, PortId)`. Node names
/// are unique within the graph.
#[derive(Debug)]
pub struct NodeGraph {
    /// Graph name
    pub name: String,
    nodes: IndexMap<NodeId, Node>,
    /// Disambiguation counter per colliding base name
    name_counters: HashMap<String, u32>,
    observers: ObserverList,
}

impl NodeGraph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            name_counters: HashMap::new(),
            observers: ObserverList::default(),
        }
    }

    /// Create the demo graph: two floats multiplied into the output alpha
    pub fn demo() -> Result<Self, GraphError> {
        let mut graph = Self::new("Demo");

        let mul = graph.add_node(Node::new(NodeKind::Multiply).with_position(-200.0, 200.0))?;
        let lhs = graph.add_node(Node::new(NodeKind::Float).with_position(300.0, -100.0))?;
        let rhs = graph.add_node(
            Node::new(NodeKind::Float)
                .with_position(0.0, 0.0)
                .with_input_fallback("in", ShaderValue::Float(0.5))?,
        )?;
        let output = graph.add_node(Node::new(NodeKind::Output).with_position(400.0, 100.0))?;

        let wires = [
            (lhs, "out", mul, "a"),
            (rhs, "out", mul, "b"),
            (mul, "value", output, "alpha"),
        ];
        for (source, source_port, target, target_port) in wires {
            let source_port = graph.output_port(source, source_port)?;
            let target_port = graph.input_port(target, target_port)?;
            graph.add_connection(target, target_port, source, source_port)?;
        }

        Ok(graph)
    }

    /// Register an observer for change notifications
    pub fn subscribe(&mut self, observer: impl GraphObserver + 'static) -> ObserverId {
        self.observers.subscribe(Box::new(observer))
    }

    /// Remove an observer; returns `false` if it was not subscribed
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Number of subscribed observers
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn emit(&mut self, event: GraphEvent) {
        self.observers.notify(&event);
    }

    /// Add a node to the graph
    ///
    /// Only unwired nodes are accepted; connections are made through the
    /// graph once both endpoints belong to it. The node keeps its name unless another node already uses it, in which
    /// case it becomes `<name>_<n>` with `n` counting up per base name.
    pub fn add_node(&mut self, mut node: Node) -> Result<NodeId, GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        if node.connection_count() > 0 {
            return Err(GraphError::NodeAlreadyWired(node.id));
        }
        if !is_valid_name(node.name()) {
            return Err(GraphError::InvalidName(node.name().to_string()));
        }

        let name = self.unique_name(node.name(), None);
        node.set_name(name.clone());

        let id = node.id;
        self.nodes.insert(id, node);
        tracing::debug!("Added node {} ({})", name, id);
        self.emit(GraphEvent::NodeAdded { id, name });
        Ok(id)
    }

    /// Delete a node together with every connection touching it
    pub fn delete_node(&mut self, node_id: NodeId) -> Result<Node, GraphError> {
        if !self.nodes.contains_key(&node_id) {
            return Err(GraphError::NodeNotFound(node_id));
        }

        let mut removed = Vec::new();
        for other in self.nodes.values_mut() {
            if other.id != node_id {
                removed.extend(other.remove_connections_from(node_id));
            }
        }
        let mut node = self
            .nodes
            .shift_remove(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        removed.extend(node.take_connections());

        tracing::debug!(
            "Deleted node {} ({}) and {} connection(s)",
            node.name(),
            node_id,
            removed.len()
        );
        for connection in removed {
            self.emit(GraphEvent::ConnectionRemoved(connection));
        }
        self.emit(GraphEvent::NodeRemoved { id: node_id });
        Ok(node)
    }

    /// Rename a node, keeping names unique; returns the final name
    pub fn rename_node(&mut self, node_id: NodeId, name: &str) -> Result<String, GraphError> {
        if !is_valid_name(name) {
            return Err(GraphError::InvalidName(name.to_string()));
        }
        let old = self.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?.name().to_string();
        if old == name {
            return Ok(old);
        }

        let new = self.unique_name(name, Some(node_id));
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.set_name(new.clone());
        }
        tracing::debug!("Renamed node {} -> {}", old, new);
        self.emit(GraphEvent::NodeRenamed {
            id: node_id,
            old,
            new: new.clone(),
        });
        Ok(new)
    }

    /// Move a node on the canvas
    pub fn set_position(&mut self, node_id: NodeId, position: [f32; 2]) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        node.set_position(position);
        self.emit(GraphEvent::NodeMoved { id: node_id, position });
        Ok(())
    }

    /// Edit the static fallback of an input port
    pub fn set_input_fallback(
        &mut self,
        node_id: NodeId,
        port_id: PortId,
        value: ShaderValue,
    ) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        node.set_input_fallback(port_id, value)?;
        self.emit(GraphEvent::FallbackChanged {
            id: node_id,
            port: port_id,
            value,
        });
        Ok(())
    }

    fn unique_name(&mut self, base: &str, exclude: Option<NodeId>) -> String {
        let nodes = &self.nodes;
        let taken = |candidate: &str| {
            nodes
                .values()
                .any(|n| Some(n.id) != exclude && n.name() == candidate)
        };
        if !taken(base) {
            return base.to_string();
        }

        let counter = self.name_counters.entry(base.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{base}_{counter}");
            if !taken(&candidate) {
                return candidate;
            }
        }
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a node by its unique name
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.values().find(|n| n.name() == name)
    }

    /// Check if a node belongs to this graph
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node IDs in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes matching a predicate, in insertion order
    pub fn find_nodes_of_kind(&self, predicate: impl Fn(&Node) -> bool) -> Vec<&Node> {
        self.nodes.values().filter(|n| predicate(n)).collect()
    }

    /// All output (sink) nodes
    pub fn output_nodes(&self) -> Vec<&Node> {
        self.find_nodes_of_kind(|n| n.kind().is_output())
    }

    /// ID of the named input port on a node
    pub fn input_port(&self, node_id: NodeId, name: &str) -> Result<PortId, GraphError> {
        let node = self.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        node.input_named(name)
            .map(|p| p.id)
            .ok_or_else(|| GraphError::UnknownPortName {
                node: node.name().to_string(),
                port: name.to_string(),
            })
    }

    /// ID of the named output port on a node
    pub fn output_port(&self, node_id: NodeId, name: &str) -> Result<PortId, GraphError> {
        let node = self.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        node.output_named(name)
            .map(|p| p.id)
            .ok_or_else(|| GraphError::UnknownPortName {
                node: node.name().to_string(),
                port: name.to_string(),
            })
    }

    /// All connections, grouped by target node
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.nodes.values().flat_map(Node::connections)
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections().find(|c| c.id == connection_id)
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.nodes.values().map(Node::connection_count).sum()
    }

    /// Connections feeding this node's inputs
    pub fn downstream_connections(&self, node_id: NodeId) -> Vec<&Connection> {
        self.node(node_id)
            .map(|n| n.connections().collect())
            .unwrap_or_default()
    }

    /// Connections elsewhere in the graph that read from this node
    pub fn upstream_connections(&self, node_id: NodeId) -> Vec<&Connection> {
        self.connections().filter(|c| c.is_from(node_id)).collect()
    }

    /// Wire `source.source_port` into `target.target_port`
    ///
    /// Returns `Ok(false)` without mutation if the input is already wired.
    /// Unknown nodes or ports, wrong port roles, mismatched value types,
    /// self-loops and cycles are errors.
    pub fn add_connection(
        &mut self,
        target: NodeId,
        target_port: PortId,
        source: NodeId,
        source_port: PortId,
    ) -> Result<bool, GraphError> {
        let source_ref = PortRef::new(source, source_port);
        let target_ref = PortRef::new(target, target_port);
        self.validate_connection(source_ref, target_ref)?;

        let node = self.nodes.get_mut(&target).ok_or(GraphError::NodeNotFound(target))?;
        let Some(connection) = node.add_connection(target_port, source_ref).cloned() else {
            tracing::debug!("Input {} is already connected", target_ref);
            return Ok(false);
        };

        tracing::debug!("Connected {} -> {}", source_ref, target_ref);
        self.emit(GraphEvent::ConnectionAdded(connection));
        Ok(true)
    }

    /// Remove a connection
    pub fn remove_connection(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        let removed = self
            .nodes
            .values_mut()
            .find_map(|n| n.remove_connection(connection_id))?;
        tracing::debug!("Disconnected {} -> {}", removed.source, removed.target);
        self.emit(GraphEvent::ConnectionRemoved(removed.clone()));
        Some(removed)
    }

    /// Negotiate a connection requested by the user
    ///
    /// Any rejection returns `false` and leaves the graph untouched. A wire
    /// already plugged into the target input is replaced.
    pub fn attempt_connection(
        &mut self,
        source: NodeId,
        source_port: PortId,
        target: NodeId,
        target_port: PortId,
    ) -> bool {
        let source_ref = PortRef::new(source, source_port);
        let target_ref = PortRef::new(target, target_port);
        if let Err(err) = self.validate_connection(source_ref, target_ref) {
            tracing::debug!("Rejected connection {} -> {}: {}", source_ref, target_ref, err);
            return false;
        }

        let previous = self
            .node(target)
            .and_then(|n| n.connection(target_port))
            .map(|c| c.id);
        if let Some(previous) = previous {
            self.remove_connection(previous);
        }

        match self.add_connection(target, target_port, source, source_port) {
            Ok(added) => added,
            Err(err) => {
                tracing::warn!("Connection {} -> {} failed: {}", source_ref, target_ref, err);
                false
            }
        }
    }

    /// Structural checks shared by every way of creating a connection
    fn validate_connection(&self, source: PortRef, target: PortRef) -> Result<(), GraphError> {
        let source_node = self.node(source.node).ok_or(GraphError::NodeNotFound(source.node))?;
        let target_node = self.node(target.node).ok_or(GraphError::NodeNotFound(target.node))?;
        if source.node == target.node {
            return Err(GraphError::SelfLoop(source.node));
        }

        let source_port = match source_node.output(source.port) {
            Some(port) => port,
            None if source_node.input(source.port).is_some() => {
                return Err(GraphError::NotAnOutput(source.port))
            }
            None => return Err(GraphError::PortNotFound(source.port)),
        };
        let target_port = match target_node.input(target.port) {
            Some(port) => port,
            None if target_node.output(target.port).is_some() => {
                return Err(GraphError::NotAnInput(target.port))
            }
            None => return Err(GraphError::PortNotFound(target.port)),
        };

        if !source_port.can_connect(target_port) {
            return Err(GraphError::IncompatibleTypes {
                output: source_port.value_type,
                input: target_port.value_type,
            });
        }
        if self.depends_on(source.node, target.node) {
            return Err(GraphError::WouldCreateCycle {
                from: source.node,
                to: target.node,
            });
        }
        Ok(())
    }

    /// Check if `node_id` transitively reads from `dependency`
    pub fn depends_on(&self, node_id: NodeId, dependency: NodeId) -> bool {
        let mut stack = vec![node_id];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == dependency {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(node) = self.node(current) {
                stack.extend(node.connections().map(|c| c.source.node));
            }
        }
        false
    }
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error raised by structural graph operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Port ID registered twice on the same side of a node
    #[error("Port already registered: {0}")]
    DuplicatePort(PortId),

    /// Node added twice
    #[error("Node already in graph: {0}")]
    DuplicateNode(NodeId),

    /// Node brought its own incoming connections into the graph
    #[error("Node {0} already has connections; only unwired nodes can be added")]
    NodeAlreadyWired(NodeId),

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("Port not found: {0}")]
    PortNotFound(PortId),

    /// Port name not declared by the node
    #[error("Node {node} has no port named {port:?}")]
    UnknownPortName {
        /// Node name
        node: String,
        /// Requested port name
        port: String,
    },

    /// Port is not an input
    #[error("Port is not an input: {0}")]
    NotAnInput(PortId),

    /// Port is not an output
    #[error("Port is not an output: {0}")]
    NotAnOutput(PortId),

    /// Value types differ between source and target
    #[error("Incompatible port types: {output} -> {input}")]
    IncompatibleTypes {
        /// Source output type
        output: ValueType,
        /// Target input type
        input: ValueType,
    },

    /// Connection from a node to itself
    #[error("Self-loop not allowed on node {0}")]
    SelfLoop(NodeId),

    /// Connection would close a loop
    #[error("Connecting {from} -> {to} would create a cycle")]
    WouldCreateCycle {
        /// Source node
        from: NodeId,
        /// Target node
        to: NodeId,
    },

    /// Dependency walk revisited a node still being resolved
    #[error("Graph contains a cycle through node {0}")]
    CycleDetected(NodeId),

    /// Name cannot be used as a shader identifier
    #[error("Invalid node name: {0:?}")]
    InvalidName(String),

    /// Fallback value has the wrong shape for the port
    #[error("Fallback type mismatch: expected {expected}, found {found}")]
    FallbackTypeMismatch {
        /// Port type
        expected: ValueType,
        /// Value type
        found: ValueType,
    },

    /// Fallback value contains NaN or infinity
    #[error("Non-finite fallback value for port {0}")]
    NonFiniteValue(PortId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn add(graph: &mut NodeGraph, kind: NodeKind) -> NodeId {
        graph.add_node(Node::new(kind)).unwrap()
    }

    fn wire(graph: &mut NodeGraph, source: NodeId, out: &str, target: NodeId, input: &str) -> bool {
        let source_port = graph.output_port(source, out).unwrap();
        let target_port = graph.input_port(target, input).unwrap();
        graph.attempt_connection(source, source_port, target, target_port)
    }

    #[test]
    fn test_name_uniqueness() {
        let mut graph = NodeGraph::new("Test");
        let a = add(&mut graph, NodeKind::Float);
        let b = add(&mut graph, NodeKind::Float);
        let c = add(&mut graph, NodeKind::Float);

        assert_eq!(graph.node(a).unwrap().name(), "FloatNode");
        assert_eq!(graph.node(b).unwrap().name(), "FloatNode_1");
        assert_eq!(graph.node(c).unwrap().name(), "FloatNode_2");
    }

    #[test]
    fn test_name_counter_skips_taken_names() {
        let mut graph = NodeGraph::new("Test");
        graph.add_node(Node::new(NodeKind::Float).with_name("X_1")).unwrap();
        graph.add_node(Node::new(NodeKind::Float).with_name("X")).unwrap();
        let third = graph.add_node(Node::new(NodeKind::Float).with_name("X")).unwrap();

        assert_eq!(graph.node(third).unwrap().name(), "X_2");
        let mut names: Vec<&str> = graph.nodes().map(Node::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_duplicate_and_invalid_nodes() {
        let mut graph = NodeGraph::new("Test");
        let node = Node::new(NodeKind::Float);
        let id = node.id;
        graph.add_node(node.clone()).unwrap();

        assert_eq!(graph.add_node(node), Err(GraphError::DuplicateNode(id)));
        assert!(matches!(
            graph.add_node(Node::new(NodeKind::Float).with_name("bad name")),
            Err(GraphError::InvalidName(_))
        ));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_add_node_rejects_wired_node() {
        let mut first = NodeGraph::new("First");
        let f = add(&mut first, NodeKind::Float);
        let mul = add(&mut first, NodeKind::Multiply);
        assert!(wire(&mut first, f, "out", mul, "a"));
        let copy = first.node(mul).unwrap().clone();

        let mut second = NodeGraph::new("Second");
        assert_eq!(second.add_node(copy), Err(GraphError::NodeAlreadyWired(mul)));
        assert_eq!(second.node_count(), 0);
        assert_eq!(second.connection_count(), 0);

        let out = add(&mut second, NodeKind::Output);
        let fresh = add(&mut second, NodeKind::Multiply);
        assert!(wire(&mut second, fresh, "value", out, "alpha"));
        assert!(second
            .connections()
            .all(|c| second.contains_node(c.source.node) && second.contains_node(c.target.node)));
    }

    #[test]
    fn test_names_stay_valid_identifiers() {
        let mut graph = NodeGraph::new("Test");
        for bad in ["x_", "gl", "gl_Color", "a__b"] {
            assert_eq!(
                graph.add_node(Node::new(NodeKind::Float).with_name(bad)),
                Err(GraphError::InvalidName(bad.to_string()))
            );
        }

        let a = graph.add_node(Node::new(NodeKind::Float).with_name("x")).unwrap();
        let b = graph.add_node(Node::new(NodeKind::Float).with_name("x")).unwrap();
        assert_eq!(graph.node(b).unwrap().name(), "x_1");
        assert!(matches!(graph.rename_node(a, "x_"), Err(GraphError::InvalidName(_))));
        assert!(graph.nodes().all(|n| is_valid_name(n.name())));
        assert_eq!(graph.generate_shader_code(b).unwrap(), "float x_1_out = 1.0;");
    }

    #[test]
    fn test_node_ids_follow_insertion_order() {
        let mut graph = NodeGraph::new("Test");
        let ids: Vec<NodeId> = NodeKind::ALL.iter().map(|k| add(&mut graph, *k)).collect();
        assert_eq!(graph.node_ids().collect::<Vec<_>>(), ids);
        assert!(ids.iter().all(|id| graph.contains_node(*id)));
    }

    #[test]
    fn test_delete_absent_node() {
        let mut graph = NodeGraph::new("Test");
        let id = NodeId::new();
        assert!(matches!(graph.delete_node(id), Err(GraphError::NodeNotFound(_))));
    }

    #[test]
    fn test_cascade_deletion() {
        let mut graph = NodeGraph::new("Test");
        let f = add(&mut graph, NodeKind::Float);
        let mul = add(&mut graph, NodeKind::Multiply);
        let out = add(&mut graph, NodeKind::Output);
        let g = add(&mut graph, NodeKind::Float);

        assert!(wire(&mut graph, f, "out", mul, "a"));
        assert!(wire(&mut graph, g, "out", mul, "b"));
        assert!(wire(&mut graph, mul, "value", out, "alpha"));
        assert_eq!(graph.connection_count(), 3);

        let removed = graph.delete_node(mul).unwrap();
        assert_eq!(removed.connection_count(), 0);
        assert!(graph.connections().all(|c| !c.involves_node(mul)));
        assert_eq!(graph.connection_count(), 0);
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_upstream_and_downstream_connections() {
        let mut graph = NodeGraph::new("Test");
        let f = add(&mut graph, NodeKind::Float);
        let mul = add(&mut graph, NodeKind::Multiply);
        let lerp = add(&mut graph, NodeKind::Lerp);

        assert!(wire(&mut graph, f, "out", mul, "a"));
        assert!(wire(&mut graph, f, "out", lerp, "t"));

        assert_eq!(graph.upstream_connections(f).len(), 2);
        assert!(graph.downstream_connections(f).is_empty());
        assert_eq!(graph.downstream_connections(mul).len(), 1);
        assert!(graph.upstream_connections(mul).is_empty());
    }

    #[test]
    fn test_attempt_connection_type_gate() {
        let mut graph = NodeGraph::new("Test");
        let f = add(&mut graph, NodeKind::Float);
        let out = add(&mut graph, NodeKind::Output);

        assert!(!wire(&mut graph, f, "out", out, "albedo"));
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_attempt_connection_role_and_self_checks() {
        let mut graph = NodeGraph::new("Test");
        let a = add(&mut graph, NodeKind::Float);
        let b = add(&mut graph, NodeKind::Float);
        let a_in = graph.input_port(a, "in").unwrap();
        let a_out = graph.output_port(a, "out").unwrap();
        let b_in = graph.input_port(b, "in").unwrap();
        let b_out = graph.output_port(b, "out").unwrap();

        // input used as source, output used as target
        assert!(!graph.attempt_connection(a, a_in, b, b_in));
        assert!(!graph.attempt_connection(a, a_out, b, b_out));
        // self loop
        assert!(!graph.attempt_connection(a, a_out, a, a_in));
        // port from another node
        assert!(!graph.attempt_connection(a, b_out, b, b_in));
        assert_eq!(graph.connection_count(), 0);

        assert!(graph.attempt_connection(a, a_out, b, b_in));
        assert_eq!(graph.connection_count(), 1);
    }

    #[test]
    fn test_connection_replacement() {
        let mut graph = NodeGraph::new("Test");
        let a = add(&mut graph, NodeKind::Float);
        let b = add(&mut graph, NodeKind::Float);
        let mul = add(&mut graph, NodeKind::Multiply);

        assert!(wire(&mut graph, a, "out", mul, "a"));
        let first = graph.downstream_connections(mul)[0].id;

        assert!(wire(&mut graph, b, "out", mul, "a"));
        let incoming = graph.downstream_connections(mul);
        assert_eq!(incoming.len(), 1);
        assert_ne!(incoming[0].id, first);
        assert!(incoming[0].is_from(b));
        assert!(graph.connection(first).is_none());
    }

    #[test]
    fn test_add_connection_does_not_supersede() {
        let mut graph = NodeGraph::new("Test");
        let a = add(&mut graph, NodeKind::Float);
        let b = add(&mut graph, NodeKind::Float);
        let mul = add(&mut graph, NodeKind::Multiply);
        let mul_a = graph.input_port(mul, "a").unwrap();
        let a_out = graph.output_port(a, "out").unwrap();
        let b_out = graph.output_port(b, "out").unwrap();

        assert_eq!(graph.add_connection(mul, mul_a, a, a_out), Ok(true));
        assert_eq!(graph.add_connection(mul, mul_a, b, b_out), Ok(false));
        assert!(graph.downstream_connections(mul)[0].is_from(a));
    }

    #[test]
    fn test_add_connection_structural_errors() {
        let mut graph = NodeGraph::new("Test");
        let f = add(&mut graph, NodeKind::Float);
        let out = add(&mut graph, NodeKind::Output);
        let f_out = graph.output_port(f, "out").unwrap();
        let albedo = graph.input_port(out, "albedo").unwrap();

        assert_eq!(
            graph.add_connection(out, albedo, f, f_out),
            Err(GraphError::IncompatibleTypes {
                output: ValueType::Float,
                input: ValueType::Float3,
            })
        );
        let missing = NodeId::new();
        assert_eq!(
            graph.add_connection(out, albedo, missing, f_out),
            Err(GraphError::NodeNotFound(missing))
        );
    }

    #[test]
    fn test_cycle_rejection() {
        let mut graph = NodeGraph::new("Test");
        let a = add(&mut graph, NodeKind::Add);
        let b = add(&mut graph, NodeKind::Multiply);
        let c = add(&mut graph, NodeKind::Lerp);

        assert!(wire(&mut graph, a, "value", b, "a"));
        assert!(wire(&mut graph, b, "value", c, "a"));
        assert!(!wire(&mut graph, c, "out", a, "a"));
        assert_eq!(graph.connection_count(), 2);

        let c_out = graph.output_port(c, "out").unwrap();
        let a_in = graph.input_port(a, "b").unwrap();
        assert!(matches!(
            graph.add_connection(a, a_in, c, c_out),
            Err(GraphError::WouldCreateCycle { .. })
        ));
        assert!(graph.depends_on(c, a));
        assert!(!graph.depends_on(a, c));
    }

    #[test]
    fn test_remove_connection() {
        let mut graph = NodeGraph::new("Test");
        let f = add(&mut graph, NodeKind::Float);
        let mul = add(&mut graph, NodeKind::Multiply);
        assert!(wire(&mut graph, f, "out", mul, "b"));

        let id = graph.connections().next().unwrap().id;
        assert!(graph.remove_connection(id).is_some());
        assert!(graph.remove_connection(id).is_none());
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_rename_node() {
        let mut graph = NodeGraph::new("Test");
        let a = add(&mut graph, NodeKind::Float);
        let b = add(&mut graph, NodeKind::Multiply);

        assert_eq!(graph.rename_node(b, "FloatNode").unwrap(), "FloatNode_1");
        assert_eq!(graph.rename_node(a, "FloatNode").unwrap(), "FloatNode");
        assert!(matches!(graph.rename_node(a, "1st"), Err(GraphError::InvalidName(_))));
        assert_eq!(graph.node_by_name("FloatNode_1").map(|n| n.id), Some(b));
    }

    #[test]
    fn test_observer_events() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);

        let mut graph = NodeGraph::new("Test");
        assert_eq!(graph.observer_count(), 0);
        let id = graph.subscribe(move |e: &GraphEvent| sink.borrow_mut().push(e.clone()));
        assert_eq!(graph.observer_count(), 1);

        let f = add(&mut graph, NodeKind::Float);
        let mul = add(&mut graph, NodeKind::Multiply);
        assert!(wire(&mut graph, f, "out", mul, "a"));
        graph.set_position(f, [10.0, 20.0]).unwrap();
        graph.delete_node(f).unwrap();

        {
            let events = events.borrow();
            assert_eq!(events.len(), 6);
            assert!(matches!(events[0], GraphEvent::NodeAdded { .. }));
            assert!(matches!(events[2], GraphEvent::ConnectionAdded(_)));
            assert_eq!(events[3], GraphEvent::NodeMoved { id: f, position: [10.0, 20.0] });
            assert!(matches!(events[4], GraphEvent::ConnectionRemoved(_)));
            assert_eq!(events[5], GraphEvent::NodeRemoved { id: f });
        }

        assert!(graph.unsubscribe(id));
        assert!(!graph.unsubscribe(id));
        assert_eq!(graph.observer_count(), 0);
        add(&mut graph, NodeKind::Float);
        assert_eq!(events.borrow().len(), 6);
    }

    #[test]
    fn test_set_input_fallback() {
        let mut graph = NodeGraph::new("Test");
        let out = add(&mut graph, NodeKind::Output);
        let alpha = graph.input_port(out, "alpha").unwrap();

        assert!(graph.set_input_fallback(out, alpha, ShaderValue::Float(0.25)).is_ok());
        assert!(graph
            .set_input_fallback(out, alpha, ShaderValue::Float3([0.0; 3]))
            .is_err());
        assert_eq!(
            graph.node(out).unwrap().input(alpha).unwrap().fallback,
            Some(ShaderValue::Float(0.25))
        );
    }

    #[test]
    fn test_demo_graph() {
        let graph = NodeGraph::demo().unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.connection_count(), 3);
        assert_eq!(graph.output_nodes().len(), 1);
    }
}
