// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader value types and literal values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of a value flowing through a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Scalar float
    Float,
    /// 2-component vector
    Float2,
    /// 3-component vector
    Float3,
    /// 4-component vector
    Float4,
    /// 3x3 matrix
    Mat3,
    /// 4x4 matrix
    Mat4,
}

impl ValueType {
    /// GLSL type keyword used when declaring a variable of this type
    pub fn glsl_type(&self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Float2 => "vec2",
            Self::Float3 => "vec3",
            Self::Float4 => "vec4",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
        }
    }

    /// Number of scalar components
    pub fn component_count(&self) -> usize {
        match self {
            Self::Float => 1,
            Self::Float2 => 2,
            Self::Float3 => 3,
            Self::Float4 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }

    /// Check if a value of this type can be wired into a port of `other`
    ///
    /// Only identical shapes connect; there are no implicit conversions.
    pub fn can_connect_to(&self, other: &ValueType) -> bool {
        self == other
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glsl_type())
    }
}

/// A literal value, used as the static fallback of an input port
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShaderValue {
    /// Scalar float
    Float(f32),
    /// 2D vector
    Float2([f32; 2]),
    /// 3D vector
    Float3([f32; 3]),
    /// 4D vector
    Float4([f32; 4]),
    /// 3x3 matrix, column major
    Mat3([f32; 9]),
    /// 4x4 matrix, column major
    Mat4([f32; 16]),
}

impl ShaderValue {
    /// Get the value type of this literal
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Float(_) => ValueType::Float,
            Self::Float2(_) => ValueType::Float2,
            Self::Float3(_) => ValueType::Float3,
            Self::Float4(_) => ValueType::Float4,
            Self::Mat3(_) => ValueType::Mat3,
            Self::Mat4(_) => ValueType::Mat4,
        }
    }

    /// Zero value of the given type (identity for matrices)
    pub fn zero(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Float => Self::Float(0.0),
            ValueType::Float2 => Self::Float2([0.0; 2]),
            ValueType::Float3 => Self::Float3([0.0; 3]),
            ValueType::Float4 => Self::Float4([0.0; 4]),
            ValueType::Mat3 => {
                let mut m = [0.0; 9];
                for i in 0..3 {
                    m[i * 3 + i] = 1.0;
                }
                Self::Mat3(m)
            }
            ValueType::Mat4 => {
                let mut m = [0.0; 16];
                for i in 0..4 {
                    m[i * 4 + i] = 1.0;
                }
                Self::Mat4(m)
            }
        }
    }

    /// All scalar components in declaration order
    pub fn components(&self) -> &[f32] {
        match self {
            Self::Float(v) => std::slice::from_ref(v),
            Self::Float2(v) => v,
            Self::Float3(v) => v,
            Self::Float4(v) => v,
            Self::Mat3(v) => v,
            Self::Mat4(v) => v,
        }
    }

    /// Whether every component is a finite number
    pub fn is_finite(&self) -> bool {
        self.components().iter().all(|c| c.is_finite())
    }

    /// Render as a GLSL literal expression
    ///
    /// Scalars render bare (`1.0`), everything else through its type
    /// constructor (`vec3(1.0, 1.0, 1.0)`).
    pub fn to_glsl(&self) -> String {
        match self {
            Self::Float(v) => format_float(*v),
            _ => {
                let args: Vec<String> = self.components().iter().map(|c| format_float(*c)).collect();
                format!("{}({})", self.value_type().glsl_type(), args.join(", "))
            }
        }
    }
}

impl fmt::Display for ShaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_glsl())
    }
}

/// Format a float so GLSL always parses it as a floating point constant
pub fn format_float(value: f32) -> String {
    // Debug keeps a fractional part or exponent ("1.0", "0.25", "1e-7")
    format!("{value:?}")
}

/// The value an input or output resolves to during code generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedValue {
    /// An inline literal expression
    Literal(String),
    /// A reference to a variable declared by some node's generated code
    Reference(String),
}

impl ResolvedValue {
    /// The shader expression text
    pub fn expr(&self) -> &str {
        match self {
            Self::Literal(text) | Self::Reference(text) => text,
        }
    }

    /// Check if this is a variable reference
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }
}

impl From<ShaderValue> for ResolvedValue {
    fn from(value: ShaderValue) -> Self {
        Self::Literal(value.to_glsl())
    }
}

impl fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.expr())
    }
}
