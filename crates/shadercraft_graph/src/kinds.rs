// SPDX-License-Identifier: MIT OR Apache-2.0
//! Concrete shader node kinds.
//!
//! Every kind declares a fixed port layout and knows how to emit its own
//! GLSL statements once its inputs have been resolved:
//!
//! | Kind       | Inputs                    | Outputs        |
//! |------------|---------------------------|----------------|
//! | `Float`    | `in: Float`               | `out: Float`   |
//! | `Add`      | `a, b: Float`             | `value: Float` |
//! | `Multiply` | `a, b: Float`             | `value: Float` |
//! | `MakeVec3` | `x, y, z: Float`          | `vec3: Float3` |
//! | `Lerp`     | `a, b, t: Float`          | `out: Float`   |
//! | `Output`   | `albedo: Float3`, `alpha` | none           |

use crate::graph::GraphError;
use crate::node::Node;
use crate::port::Port;
use crate::value::{ResolvedValue, ShaderValue, ValueType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Palette category of a node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Value sources
    Input,
    /// Graph sinks
    Output,
    /// Scalar arithmetic
    Math,
    /// Vector construction
    Vector,
}

impl NodeCategory {
    /// Display name for this category
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Output => "Output",
            Self::Math => "Math",
            Self::Vector => "Vector",
        }
    }
}

/// The closed set of shader node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Scalar float source
    Float,
    /// Scalar addition
    Add,
    /// Scalar multiplication
    Multiply,
    /// Build a `vec3` from three floats
    MakeVec3,
    /// Linear interpolation between two floats
    Lerp,
    /// Final material output
    Output,
}

impl NodeKind {
    /// Every kind, in palette order
    pub const ALL: [NodeKind; 6] = [
        Self::Float,
        Self::Add,
        Self::Multiply,
        Self::MakeVec3,
        Self::Lerp,
        Self::Output,
    ];

    /// Stable type name, used for palette lookups
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Float => "Float",
            Self::Add => "Add",
            Self::Multiply => "Multiply",
            Self::MakeVec3 => "MakeVec3",
            Self::Lerp => "Lerp",
            Self::Output => "Output",
        }
    }

    /// Short human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Float => "Float",
            Self::Add => "Add",
            Self::Multiply => "Mul",
            Self::MakeVec3 => "Vec3",
            Self::Lerp => "Lerp",
            Self::Output => "Output",
        }
    }

    /// Instance name given to freshly created nodes
    pub fn default_name(&self) -> &'static str {
        match self {
            Self::Float => "FloatNode",
            Self::Add => "AddNode",
            Self::Multiply => "MulNode",
            Self::MakeVec3 => "MakeVec3Node",
            Self::Lerp => "LerpNode",
            Self::Output => "OutputNode",
        }
    }

    /// Palette category
    pub fn category(&self) -> NodeCategory {
        match self {
            Self::Float => NodeCategory::Input,
            Self::Add | Self::Multiply | Self::Lerp => NodeCategory::Math,
            Self::MakeVec3 => NodeCategory::Vector,
            Self::Output => NodeCategory::Output,
        }
    }

    /// One line description shown in the palette
    pub fn description(&self) -> &'static str {
        match self {
            Self::Float => "Defines a float variable",
            Self::Add => "Adds two float values",
            Self::Multiply => "Multiplies two float values",
            Self::MakeVec3 => "Builds a vec3 from three float values",
            Self::Lerp => "Linearly interpolates between two floats",
            Self::Output => "Final albedo and alpha of the generated fragment shader",
        }
    }

    /// Check if this kind is a graph sink
    pub fn is_output(&self) -> bool {
        matches!(self, Self::Output)
    }

    /// Fixed port layout as `(inputs, outputs)`, in declaration order
    pub fn ports(&self) -> (Vec<Port>, Vec<Port>) {
        let float_in = |name: &str, label: &str, fallback: f32| {
            Port::input(name, label, ValueType::Float).with_fallback(ShaderValue::Float(fallback))
        };

        match self {
            Self::Float => (
                vec![float_in("in", "In", 1.0)],
                vec![Port::output("out", "Out", ValueType::Float)],
            ),
            Self::Add => (
                vec![float_in("a", "A", 0.0), float_in("b", "B", 0.0)],
                vec![Port::output("value", "Value", ValueType::Float)],
            ),
            Self::Multiply => (
                vec![float_in("a", "A", 1.0), float_in("b", "B", 1.0)],
                vec![Port::output("value", "Value", ValueType::Float)],
            ),
            Self::MakeVec3 => (
                vec![
                    float_in("x", "X", 0.0),
                    float_in("y", "Y", 0.0),
                    float_in("z", "Z", 0.0),
                ],
                vec![Port::output("vec3", "Vec3", ValueType::Float3)],
            ),
            Self::Lerp => (
                vec![
                    float_in("a", "A", 0.0),
                    float_in("b", "B", 1.0),
                    float_in("t", "T", 0.5),
                ],
                vec![Port::output("out", "Out", ValueType::Float)],
            ),
            Self::Output => (
                vec![
                    Port::input("albedo", "Albedo", ValueType::Float3)
                        .with_fallback(ShaderValue::Float3([1.0, 1.0, 1.0])),
                    float_in("alpha", "Alpha", 1.0),
                ],
                vec![],
            ),
        }
    }

    /// Value an output port of `node` resolves to
    ///
    /// Every current kind declares its outputs as `<node>_<port>` variables
    /// in its emitted code, so outputs always resolve to references.
    pub fn output_value(&self, node: &Node, port: &Port) -> ResolvedValue {
        ResolvedValue::Reference(variable_name(node.name(), &port.name))
    }

    /// Emit GLSL statements for a node of this kind
    pub fn emit(&self, ctx: &EmitContext<'_>) -> Result<String, GraphError> {
        let code = match self {
            Self::Float => {
                format!("{} = {};", ctx.declare("out")?, ctx.input("in")?)
            }
            Self::Add | Self::Multiply => {
                let op = if *self == Self::Add { "+" } else { "*" };
                let a = ctx.var("a");
                let b = ctx.var("b");
                [
                    format!("float {a} = {};", ctx.input("a")?),
                    format!("float {b} = {};", ctx.input("b")?),
                    format!("{} = {a} {op} {b};", ctx.declare("value")?),
                ]
                .join("\n")
            }
            Self::MakeVec3 => format!(
                "{} = vec3({}, {}, {});",
                ctx.declare("vec3")?,
                ctx.input("x")?,
                ctx.input("y")?,
                ctx.input("z")?
            ),
            Self::Lerp => format!(
                "{} = mix({}, {}, {});",
                ctx.declare("out")?,
                ctx.input("a")?,
                ctx.input("b")?,
                ctx.input("t")?
            ),
            Self::Output => [
                format!("vec3 albedo = {};", ctx.input("albedo")?),
                format!("float alpha = {};", ctx.input("alpha")?),
            ]
            .join("\n"),
        };
        Ok(code)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Deterministic name of the variable holding `<node>.<port>`
pub fn variable_name(node_name: &str, port_name: &str) -> String {
    format!("{node_name}_{port_name}")
}

/// Resolved inputs of one node, handed to [`NodeKind::emit`]
#[derive(Debug)]
pub struct EmitContext<'a> {
    node: &'a Node,
    inputs: IndexMap<&'a str, ResolvedValue>,
}

impl<'a> EmitContext<'a> {
    /// Create a context from resolved `(port name, value)` pairs
    pub fn new(node: &'a Node, inputs: impl IntoIterator<Item = (&'a str, ResolvedValue)>) -> Self {
        Self {
            node,
            inputs: inputs.into_iter().collect(),
        }
    }

    /// The node being emitted
    pub fn node(&self) -> &'a Node {
        self.node
    }

    /// Expression text of the named input
    pub fn input(&self, port_name: &str) -> Result<&str, GraphError> {
        self.inputs
            .get(port_name)
            .map(ResolvedValue::expr)
            .ok_or_else(|| self.missing(port_name))
    }

    /// Node-scoped variable name for `port_name`
    pub fn var(&self, port_name: &str) -> String {
        variable_name(self.node.name(), port_name)
    }

    /// Typed declaration (`vec3 Node_port`) of the named output
    pub fn declare(&self, port_name: &str) -> Result<String, GraphError> {
        let port = self
            .node
            .output_named(port_name)
            .ok_or_else(|| self.missing(port_name))?;
        Ok(format!("{} {}", port.value_type.glsl_type(), self.var(port_name)))
    }

    fn missing(&self, port_name: &str) -> GraphError {
        GraphError::UnknownPortName {
            node: self.node.name().to_string(),
            port: port_name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit_with_fallbacks(kind: NodeKind) -> String {
        let node = Node::new(kind);
        let inputs: Vec<(&str, ResolvedValue)> = node
            .inputs()
            .map(|p| (p.name.as_str(), node.input_fallback(p.id).expect("fallback")))
            .collect();
        kind.emit(&EmitContext::new(&node, inputs)).expect("emit")
    }

    #[test]
    fn test_every_kind_has_unique_port_names() {
        for kind in NodeKind::ALL {
            let (inputs, outputs) = kind.ports();
            let mut names: Vec<&str> = inputs.iter().chain(&outputs).map(|p| p.name.as_str()).collect();
            let count = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), count, "{kind} repeats a port name");
        }
    }

    #[test]
    fn test_palette_metadata() {
        for kind in NodeKind::ALL {
            assert!(!kind.description().is_empty());
            assert_eq!(kind.to_string(), kind.type_name());
        }
        assert_eq!(NodeKind::Multiply.category().display_name(), "Math");
        assert_eq!(NodeKind::MakeVec3.category().display_name(), "Vector");
        assert_eq!(NodeKind::Float.category().display_name(), "Input");
        assert_eq!(NodeKind::Output.category().display_name(), "Output");
    }

    #[test]
    fn test_context_exposes_node() {
        let node = Node::new(NodeKind::Float).with_name("Roughness");
        let ctx = EmitContext::new(&node, [("in", ResolvedValue::Literal("0.5".into()))]);
        assert_eq!(ctx.node().id, node.id);
        assert_eq!(ctx.var("out"), "Roughness_out");
        assert_eq!(NodeKind::Float.emit(&ctx).unwrap(), "float Roughness_out = 0.5;");
    }

    #[test]
    fn test_fallbacks_match_port_types() {
        for kind in NodeKind::ALL {
            let (inputs, outputs) = kind.ports();
            for port in &inputs {
                assert_eq!(port.fallback.map(|v| v.value_type()), Some(port.value_type), "{kind}.{}", port.name);
            }
            assert!(outputs.iter().all(|p| p.fallback.is_none()));
        }
    }

    #[test]
    fn test_only_output_is_sink() {
        for kind in NodeKind::ALL {
            let (_, outputs) = kind.ports();
            assert_eq!(kind.is_output(), outputs.is_empty());
        }
    }

    #[test]
    fn test_float_emission() {
        assert_eq!(emit_with_fallbacks(NodeKind::Float), "float FloatNode_out = 1.0;");
    }

    #[test]
    fn test_multiply_emission() {
        assert_eq!(
            emit_with_fallbacks(NodeKind::Multiply),
            "float MulNode_a = 1.0;\nfloat MulNode_b = 1.0;\nfloat MulNode_value = MulNode_a * MulNode_b;"
        );
    }

    #[test]
    fn test_add_emission() {
        assert!(emit_with_fallbacks(NodeKind::Add).ends_with("float AddNode_value = AddNode_a + AddNode_b;"));
    }

    #[test]
    fn test_make_vec3_emission() {
        assert_eq!(
            emit_with_fallbacks(NodeKind::MakeVec3),
            "vec3 MakeVec3Node_vec3 = vec3(0.0, 0.0, 0.0);"
        );
    }

    #[test]
    fn test_lerp_emission() {
        assert_eq!(
            emit_with_fallbacks(NodeKind::Lerp),
            "float LerpNode_out = mix(0.0, 1.0, 0.5);"
        );
    }

    #[test]
    fn test_output_emission() {
        assert_eq!(
            emit_with_fallbacks(NodeKind::Output),
            "vec3 albedo = vec3(1.0, 1.0, 1.0);\nfloat alpha = 1.0;"
        );
    }

    #[test]
    fn test_missing_input_is_reported() {
        let node = Node::new(NodeKind::Lerp);
        let ctx = EmitContext::new(&node, [("a", ResolvedValue::Literal("0.0".into()))]);
        assert!(matches!(
            NodeKind::Lerp.emit(&ctx),
            Err(GraphError::UnknownPortName { .. })
        ));
    }
}
