// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader node graph model and GLSL generator for Shadercraft.
//!
//! A material is authored as a graph of typed nodes. Each node owns its
//! input and output ports plus the connections feeding its inputs. The
//! generator walks everything the single output node depends on and
//! assembles a fragment shader from the nodes' emitted code.
//!
//! ## Architecture
//!
//! - [`NodeGraph`] owns every node and is the only way to wire them
//! - Connections are type-gated and can never form a cycle
//! - Node behaviour comes from the closed [`NodeKind`] set
//! - [`ShaderGenerator`] fills `${graph_src}` in a fragment template
//! - Observers receive [`GraphEvent`]s for every change

pub mod value;
pub mod port;
pub mod connection;
pub mod node;
pub mod kinds;
pub mod graph;
pub mod evaluation;
pub mod events;
pub mod palette;
pub mod template;
pub mod codegen;
pub mod config;

pub use value::{ResolvedValue, ShaderValue, ValueType};
pub use port::{Port, PortDirection, PortId};
pub use connection::{Connection, ConnectionId, PortRef};
pub use node::{Node, NodeId};
pub use kinds::{EmitContext, NodeCategory, NodeKind};
pub use graph::{GraphError, NodeGraph};
pub use events::{GraphEvent, GraphObserver, ObserverId};
pub use palette::NodePalette;
pub use template::{ShaderTemplate, TemplateError};
pub use codegen::{GenerateError, GeneratedShaderSource, ShaderFiles, ShaderGenerator};
pub use config::{ConfigError, GeneratorConfig};
