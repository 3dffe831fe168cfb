// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the shader graph.

use crate::connection::{Connection, ConnectionId, PortRef};
use crate::graph::GraphError;
use crate::kinds::NodeKind;
use crate::port::{Port, PortDirection, PortId};
use crate::value::{ResolvedValue, ShaderValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node instance in the graph
///
/// Ports keep declaration order, which is also the order inputs are visited
/// during dependency resolution. Incoming connections are keyed by the
/// target input port, so an input holds at most one connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    kind: NodeKind,
    name: String,
    position: [f32; 2],
    inputs: IndexMap<PortId, Port>,
    outputs: IndexMap<PortId, Port>,
    connections: IndexMap<PortId, Connection>,
}

impl Node {
    /// Create a new node of `kind` with its default name and ports
    pub fn new(kind: NodeKind) -> Self {
        let (inputs, outputs) = kind.ports();
        Self {
            id: NodeId::new(),
            kind,
            name: kind.default_name().to_string(),
            position: [0.0, 0.0],
            inputs: inputs.into_iter().map(|p| (p.id, p)).collect(),
            outputs: outputs.into_iter().map(|p| (p.id, p)).collect(),
            connections: IndexMap::new(),
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Set the instance name before the node joins a graph
    ///
    /// The graph may still suffix it to keep names unique.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the fallback of the named input before the node joins a graph
    pub fn with_input_fallback(mut self, port_name: &str, value: ShaderValue) -> Result<Self, GraphError> {
        let port_id = self
            .input_named(port_name)
            .map(|p| p.id)
            .ok_or_else(|| GraphError::UnknownPortName {
                node: self.name.clone(),
                port: port_name.to_string(),
            })?;
        self.set_input_fallback(port_id, value)?;
        Ok(self)
    }

    /// Node kind
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Kind label
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    /// Graph-unique instance name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Layout position; never affects code generation
    pub fn position(&self) -> [f32; 2] {
        self.position
    }

    /// Register an extra input port
    pub fn register_input(&mut self, port: Port) -> Result<PortId, GraphError> {
        if port.direction != PortDirection::Input {
            return Err(GraphError::NotAnInput(port.id));
        }
        Self::register(&mut self.inputs, port)
    }

    /// Register an extra output port
    pub fn register_output(&mut self, port: Port) -> Result<PortId, GraphError> {
        if port.direction != PortDirection::Output {
            return Err(GraphError::NotAnOutput(port.id));
        }
        Self::register(&mut self.outputs, port)
    }

    fn register(ports: &mut IndexMap<PortId, Port>, port: Port) -> Result<PortId, GraphError> {
        let id = port.id;
        if ports.contains_key(&id) {
            return Err(GraphError::DuplicatePort(id));
        }
        ports.insert(id, port);
        Ok(id)
    }

    /// Get an input port by ID
    pub fn input(&self, port_id: PortId) -> Option<&Port> {
        self.inputs.get(&port_id)
    }

    /// Get an output port by ID
    pub fn output(&self, port_id: PortId) -> Option<&Port> {
        self.outputs.get(&port_id)
    }

    /// Get an input port by internal name
    pub fn input_named(&self, name: &str) -> Option<&Port> {
        self.inputs.values().find(|p| p.name == name)
    }

    /// Get an output port by internal name
    pub fn output_named(&self, name: &str) -> Option<&Port> {
        self.outputs.values().find(|p| p.name == name)
    }

    /// Input ports in declaration order
    pub fn inputs(&self) -> impl Iterator<Item = &Port> {
        self.inputs.values()
    }

    /// Output ports in declaration order
    pub fn outputs(&self) -> impl Iterator<Item = &Port> {
        self.outputs.values()
    }

    /// Get a port on either side by ID
    pub fn port(&self, port_id: PortId) -> Option<&Port> {
        self.input(port_id).or_else(|| self.output(port_id))
    }

    /// Incoming connection of an input port, if wired
    pub fn connection(&self, port_id: PortId) -> Option<&Connection> {
        self.connections.get(&port_id)
    }

    /// Incoming connections in input declaration order
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.inputs.keys().filter_map(|id| self.connections.get(id))
    }

    /// Number of incoming connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Check if an input port is wired
    pub fn is_connected(&self, port_id: PortId) -> bool {
        self.connections.contains_key(&port_id)
    }

    /// Value of an input while unconnected, from its static fallback
    ///
    /// Returns `None` if `port_id` is not a registered input.
    pub fn input_fallback(&self, port_id: PortId) -> Option<ResolvedValue> {
        let port = self.input(port_id)?;
        let value = port.fallback.unwrap_or_else(|| ShaderValue::zero(port.value_type));
        Some(value.into())
    }

    /// Value an output port resolves to
    ///
    /// Returns `None` if `port_id` is not a registered output.
    pub fn output_value(&self, port_id: PortId) -> Option<ResolvedValue> {
        let port = self.output(port_id)?;
        Some(self.kind.output_value(self, port))
    }

    /// Comment block describing this node in generated source
    pub fn shader_code_summary(&self) -> String {
        const RULE: &str = "/// -------------------------------------------------------------------";
        [
            RULE.to_string(),
            format!("/// Node Kind: {}", self.kind.type_name()),
            format!("/// Node Label: {}", self.label()),
            format!("/// Node Name: {}", self.name),
            format!("/// Node ID: {}", self.id),
            RULE.to_string(),
        ]
        .join("\n")
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_position(&mut self, position: [f32; 2]) {
        self.position = position;
    }

    pub(crate) fn set_input_fallback(&mut self, port_id: PortId, value: ShaderValue) -> Result<(), GraphError> {
        let port = self
            .inputs
            .get_mut(&port_id)
            .ok_or(GraphError::PortNotFound(port_id))?;
        if value.value_type() != port.value_type {
            return Err(GraphError::FallbackTypeMismatch {
                expected: port.value_type,
                found: value.value_type(),
            });
        }
        if !value.is_finite() {
            return Err(GraphError::NonFiniteValue(port_id));
        }
        port.fallback = Some(value);
        Ok(())
    }

    /// Store a connection from `source` into `target_port`
    ///
    /// Returns `None` without mutation if the port is not an input or is
    /// already wired.
    pub(crate) fn add_connection(&mut self, target_port: PortId, source: PortRef) -> Option<&Connection> {
        if !self.inputs.contains_key(&target_port) || self.connections.contains_key(&target_port) {
            return None;
        }
        let connection = Connection::new(source, PortRef::new(self.id, target_port));
        Some(&*self.connections.entry(target_port).or_insert(connection))
    }

    pub(crate) fn remove_connection(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        let port = self
            .connections
            .iter()
            .find_map(|(port, c)| (c.id == connection_id).then_some(*port))?;
        self.connections.shift_remove(&port)
    }

    /// Drop every incoming connection whose source is `node_id`
    pub(crate) fn remove_connections_from(&mut self, node_id: NodeId) -> Vec<Connection> {
        let ports: Vec<PortId> = self
            .connections
            .iter()
            .filter(|(_, c)| c.is_from(node_id))
            .map(|(port, _)| *port)
            .collect();
        ports
            .iter()
            .filter_map(|port| self.connections.shift_remove(port))
            .collect()
    }

    pub(crate) fn take_connections(&mut self) -> Vec<Connection> {
        self.connections.drain(..).map(|(_, c)| c).collect()
    }
}

/// Check if `name` can be used as a GLSL identifier prefix
///
/// Generated variables are `<name>_<port>` and disambiguated names are
/// `<name>_<n>`, so a valid name must keep both free of the reserved `gl_`
/// prefix and of `__`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name != "gl"
        && !name.starts_with("gl_")
        && !name.ends_with('_')
        && !name.contains("__")
}
