// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value resolution and dependency ordering over a graph.

use crate::graph::{GraphError, NodeGraph};
use crate::kinds::EmitContext;
use crate::node::NodeId;
use crate::port::PortId;
use crate::value::ResolvedValue;
use std::collections::HashSet;

impl NodeGraph {
    /// Value flowing into an input port
    ///
    /// A wired input takes the source node's output value; an unwired one
    /// falls back to the port's static value. Returns `None` if the node or
    /// input port does not exist.
    pub fn input_value(&self, node_id: NodeId, port_id: PortId) -> Option<ResolvedValue> {
        let node = self.node(node_id)?;
        match node.connection(port_id) {
            Some(connection) => self
                .node(connection.source.node)?
                .output_value(connection.source.port),
            None => node.input_fallback(port_id),
        }
    }

    /// Value an output port resolves to
    pub fn output_value(&self, node_id: NodeId, port_id: PortId) -> Option<ResolvedValue> {
        self.node(node_id)?.output_value(port_id)
    }

    /// The node plus everything it transitively depends on, dependencies first
    ///
    /// Inputs are followed in declaration order and each node appears once,
    /// at its first visit, so the result is a topological order ending with
    /// `node_id` itself.
    pub fn downstream_nodes(&self, node_id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        let mut visited = HashSet::new();
        let mut in_progress = HashSet::new();
        let mut order = Vec::new();
        self.visit(node_id, &mut visited, &mut in_progress, &mut order)?;
        Ok(order)
    }

    fn visit(
        &self,
        node_id: NodeId,
        visited: &mut HashSet<NodeId>,
        in_progress: &mut HashSet<NodeId>,
        order: &mut Vec<NodeId>,
    ) -> Result<(), GraphError> {
        if visited.contains(&node_id) {
            return Ok(());
        }
        if !in_progress.insert(node_id) {
            return Err(GraphError::CycleDetected(node_id));
        }

        let node = self.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        for connection in node.connections() {
            self.visit(connection.source.node, visited, in_progress, order)?;
        }

        in_progress.remove(&node_id);
        visited.insert(node_id);
        order.push(node_id);
        Ok(())
    }

    /// GLSL statements computing this node's outputs from its resolved inputs
    pub fn generate_shader_code(&self, node_id: NodeId) -> Result<String, GraphError> {
        let node = self.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        let mut inputs = Vec::new();
        for port in node.inputs() {
            let value = self
                .input_value(node_id, port.id)
                .ok_or(GraphError::PortNotFound(port.id))?;
            inputs.push((port.name.as_str(), value));
        }
        node.kind().emit(&EmitContext::new(node, inputs))
    }

    /// Comment block describing a node in generated source
    pub fn generate_shader_code_summary(&self, node_id: NodeId) -> Result<String, GraphError> {
        self.node(node_id)
            .map(crate::node::Node::shader_code_summary)
            .ok_or(GraphError::NodeNotFound(node_id))
    }
}
