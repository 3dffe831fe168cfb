// SPDX-License-Identifier: MIT OR Apache-2.0
//! GLSL source generation from a node graph.
//!
//! The fragment stage is assembled by walking the output node's
//! dependencies in order and injecting each node's summary and code into
//! the fragment template. The vertex stage is static.

use crate::config::GeneratorConfig;
use crate::graph::{GraphError, NodeGraph};
use crate::node::NodeId;
use crate::template::{indent, ShaderTemplate, TemplateError, GRAPH_SRC_PLACEHOLDER};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Error while generating or writing shader sources
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Graph has no output node
    #[error("Graph has no output node")]
    MissingOutputNode,

    /// Graph has more than one output node
    #[error("Graph has {0} output nodes, expected exactly one")]
    MultipleOutputNodes(usize),

    /// Graph query or node emission failed
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Template could not be parsed or filled
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Template or output file access failed
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

/// Generated vertex and fragment sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedShaderSource {
    /// Vertex stage source
    pub vertex: String,
    /// Fragment stage source
    pub fragment: String,
}

/// Paths written by [`GeneratedShaderSource::write_to`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderFiles {
    /// Vertex stage file
    pub vertex: PathBuf,
    /// Fragment stage file
    pub fragment: PathBuf,
}

impl GeneratedShaderSource {
    /// Write both stages into `dir`, creating it if needed
    pub fn write_to(&self, dir: &Path, config: &GeneratorConfig) -> Result<ShaderFiles, GenerateError> {
        std::fs::create_dir_all(dir).map_err(|source| GenerateError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let files = ShaderFiles {
            vertex: config.vertex_path(dir),
            fragment: config.fragment_path(dir),
        };
        write_file(&files.vertex, &self.vertex)?;
        write_file(&files.fragment, &self.fragment)?;

        tracing::info!(
            "Wrote shader sources to {:?} and {:?}",
            files.vertex,
            files.fragment
        );
        Ok(files)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), GenerateError> {
    std::fs::write(path, contents).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_template(path: &Path) -> Result<String, GenerateError> {
    std::fs::read_to_string(path).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Turns a node graph into GLSL sources
#[derive(Debug, Clone)]
pub struct ShaderGenerator {
    vertex_template: ShaderTemplate,
    fragment_template: ShaderTemplate,
    indent: String,
}

impl ShaderGenerator {
    /// Generator using the built-in templates and a 4-space indent
    pub fn new() -> Result<Self, GenerateError> {
        Ok(Self {
            vertex_template: ShaderTemplate::standard_vertex()?,
            fragment_template: ShaderTemplate::standard_fragment()?,
            indent: " ".repeat(4),
        })
    }

    /// Generator using custom template sources
    ///
    /// The vertex template must have no `${graph_src}`; the fragment
    /// template must have exactly one.
    pub fn with_templates(vertex: &str, fragment: &str) -> Result<Self, GenerateError> {
        Ok(Self {
            vertex_template: ShaderTemplate::parse_expecting(vertex, GRAPH_SRC_PLACEHOLDER, 0)?,
            fragment_template: ShaderTemplate::parse_expecting(fragment, GRAPH_SRC_PLACEHOLDER, 1)?,
            indent: " ".repeat(4),
        })
    }

    /// Generator set up from a config, reading any template overrides
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, GenerateError> {
        let mut generator = Self::new()?;
        if let Some(path) = &config.vertex_template {
            generator.vertex_template =
                ShaderTemplate::parse_expecting(&read_template(path)?, GRAPH_SRC_PLACEHOLDER, 0)?;
        }
        if let Some(path) = &config.fragment_template {
            generator.fragment_template =
                ShaderTemplate::parse_expecting(&read_template(path)?, GRAPH_SRC_PLACEHOLDER, 1)?;
        }
        Ok(generator.with_indent(config.indent_width))
    }

    /// Set the number of spaces prepended to injected node code
    pub fn with_indent(mut self, width: usize) -> Self {
        self.indent = " ".repeat(width);
        self
    }

    /// The single output node of a graph
    pub fn output_node(graph: &NodeGraph) -> Result<NodeId, GenerateError> {
        match graph.output_nodes().as_slice() {
            [] => Err(GenerateError::MissingOutputNode),
            [node] => Ok(node.id),
            many => Err(GenerateError::MultipleOutputNodes(many.len())),
        }
    }

    /// Summary and code of every node the output depends on, unindented
    pub fn graph_source(&self, graph: &NodeGraph) -> Result<String, GenerateError> {
        let output = Self::output_node(graph)?;
        let order = graph.downstream_nodes(output)?;
        tracing::debug!("Emitting {} node(s) for graph '{}'", order.len(), graph.name);

        let mut chunks = Vec::with_capacity(order.len());
        for node_id in order {
            let summary = graph.generate_shader_code_summary(node_id)?;
            let code = graph.generate_shader_code(node_id)?;
            chunks.push(format!("{summary}\n{code}"));
        }
        Ok(chunks.join("\n\n"))
    }

    /// Generate both shader stages
    ///
    /// Nothing is produced unless the graph has exactly one output node.
    pub fn generate(&self, graph: &NodeGraph) -> Result<GeneratedShaderSource, GenerateError> {
        let block = indent(&self.graph_source(graph)?, &self.indent);
        let values = HashMap::from([(GRAPH_SRC_PLACEHOLDER, block.as_str())]);

        let source = GeneratedShaderSource {
            vertex: self.vertex_template.render()?,
            fragment: self.fragment_template.substitute(&values)?,
        };
        tracing::info!("Generated shader sources for graph '{}'", graph.name);
        Ok(source)
    }
}
