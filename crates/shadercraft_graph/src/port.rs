// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use crate::value::{ShaderValue, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub Uuid);

impl PortId {
    /// Create a new random port ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// A port on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Unique port ID
    pub id: PortId,
    /// Internal name, used in generated variable names
    pub name: String,
    /// Display label
    pub label: String,
    /// Port direction
    pub direction: PortDirection,
    /// Shape of the values flowing through this port
    pub value_type: ValueType,
    /// Value used while the input is unconnected (inputs only)
    pub fallback: Option<ShaderValue>,
}

impl Port {
    /// Create a new input port
    ///
    /// The fallback starts at the zero value of `value_type`.
    pub fn input(name: impl Into<String>, label: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            label: label.into(),
            direction: PortDirection::Input,
            value_type,
            fallback: Some(ShaderValue::zero(value_type)),
        }
    }

    /// Create a new output port
    pub fn output(name: impl Into<String>, label: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            label: label.into(),
            direction: PortDirection::Output,
            value_type,
            fallback: None,
        }
    }

    /// Set the fallback value
    ///
    /// Values of a different shape, or a fallback on an output, are dropped
    /// with a warning; use
    /// [`NodeGraph::set_input_fallback`](crate::NodeGraph::set_input_fallback)
    /// for checked edits that report an error.
    pub fn with_fallback(mut self, value: ShaderValue) -> Self {
        if self.direction != PortDirection::Input {
            tracing::warn!("Ignoring fallback {} on output port '{}'", value, self.name);
        } else if value.value_type() != self.value_type {
            tracing::warn!(
                "Ignoring {} fallback {} on {} port '{}'",
                value.value_type(),
                value,
                self.value_type,
                self.name
            );
        } else {
            self.fallback = Some(value);
        }
        self
    }

    /// Check if this is an input port
    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }

    /// Check if this is an output port
    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }

    /// Check if a connection from this port into `target` is valid
    pub fn can_connect(&self, target: &Port) -> bool {
        self.is_output() && target.is_input() && self.value_type.can_connect_to(&target.value_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_ids_are_unique() {
        let a = Port::input("a", "A", ValueType::Float);
        let b = Port::input("a", "A", ValueType::Float);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_input_fallback_defaults_to_zero() {
        let port = Port::input("albedo", "Albedo", ValueType::Float3);
        assert_eq!(port.fallback, Some(ShaderValue::Float3([0.0; 3])));
        assert!(Port::output("out", "Out", ValueType::Float).fallback.is_none());
    }

    #[test]
    fn test_with_fallback_rejects_wrong_shape() {
        let port = Port::input("x", "X", ValueType::Float).with_fallback(ShaderValue::Float2([1.0, 2.0]));
        assert_eq!(port.fallback, Some(ShaderValue::Float(0.0)));

        let port = Port::output("out", "Out", ValueType::Float).with_fallback(ShaderValue::Float(1.0));
        assert!(port.fallback.is_none());

        let port = Port::input("x", "X", ValueType::Float).with_fallback(ShaderValue::Float(2.0));
        assert_eq!(port.fallback, Some(ShaderValue::Float(2.0)));
    }

    #[test]
    fn test_can_connect() {
        let out = Port::output("out", "Out", ValueType::Float);
        let float_in = Port::input("in", "In", ValueType::Float);
        let vec_in = Port::input("albedo", "Albedo", ValueType::Float3);

        assert!(out.can_connect(&float_in));
        assert!(!out.can_connect(&vec_in));
        assert!(!float_in.can_connect(&out));
        assert!(!out.can_connect(&out));
    }
}
