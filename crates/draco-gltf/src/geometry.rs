//! Typed vertex and index streams of one primitive.

use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use half::f16;

use crate::error::{GltfError, Result};

pub const POSITION_ATTRIBUTE_NAME: &str = "vertexPosition";
pub const NORMAL_ATTRIBUTE_NAME: &str = "vertexNormal";
pub const TANGENT_ATTRIBUTE_NAME: &str = "vertexTangent";
pub const TEXCOORD_ATTRIBUTE_NAME: &str = "vertexTexCoord";
pub const TEXCOORD1_ATTRIBUTE_NAME: &str = "vertexTexCoord1";
pub const TEXCOORD2_ATTRIBUTE_NAME: &str = "vertexTexCoord2";
pub const COLOR_ATTRIBUTE_NAME: &str = "vertexColor";
pub const JOINT_INDICES_ATTRIBUTE_NAME: &str = "vertexJointIndices";
pub const JOINT_WEIGHTS_ATTRIBUTE_NAME: &str = "vertexJointWeights";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexBaseType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    HalfFloat,
    Float,
    Double,
}

impl VertexBaseType {
    pub fn size(self) -> usize {
        match self {
            VertexBaseType::Byte | VertexBaseType::UnsignedByte => 1,
            VertexBaseType::Short | VertexBaseType::UnsignedShort | VertexBaseType::HalfFloat => 2,
            VertexBaseType::Int | VertexBaseType::UnsignedInt | VertexBaseType::Float => 4,
            VertexBaseType::Double => 8,
        }
    }

    /// Maps a glTF `componentType`.
    pub fn from_component_type(component_type: u32) -> Option<Self> {
        match component_type {
            5120 => Some(VertexBaseType::Byte),
            5121 => Some(VertexBaseType::UnsignedByte),
            5122 => Some(VertexBaseType::Short),
            5123 => Some(VertexBaseType::UnsignedShort),
            5125 => Some(VertexBaseType::UnsignedInt),
            5126 => Some(VertexBaseType::Float),
            _ => None,
        }
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            VertexBaseType::UnsignedByte
                | VertexBaseType::UnsignedShort
                | VertexBaseType::UnsignedInt
        )
    }
}

/// glTF primitive `mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveType {
    pub fn from_mode(mode: u32) -> Option<Self> {
        match mode {
            0 => Some(PrimitiveType::Points),
            1 => Some(PrimitiveType::Lines),
            2 => Some(PrimitiveType::LineLoop),
            3 => Some(PrimitiveType::LineStrip),
            4 => Some(PrimitiveType::Triangles),
            5 => Some(PrimitiveType::TriangleStrip),
            6 => Some(PrimitiveType::TriangleFan),
            _ => None,
        }
    }

    pub fn is_triangular(self) -> bool {
        matches!(
            self,
            PrimitiveType::Triangles | PrimitiveType::TriangleStrip | PrimitiveType::TriangleFan
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Vertex,
    Index,
}

/// A strided view over shared bytes.
///
/// Element `i` starts at `byte_offset + i * effective_stride()`.
#[derive(Debug, Clone)]
pub struct GeometryAttribute {
    /// Standard name (`vertexPosition`, ...) or the semantic for custom
    /// attributes.
    pub name: String,
    /// glTF semantic; `None` for index and generated attributes.
    pub semantic: Option<String>,
    pub kind: AttributeKind,
    pub base_type: VertexBaseType,
    pub vertex_size: usize,
    pub count: usize,
    pub byte_offset: usize,
    /// 0 means tightly packed.
    pub byte_stride: usize,
    pub normalized: bool,
    pub data: Arc<[u8]>,
    /// Accessor the data came from, `None` for generated or decoded data.
    pub accessor: Option<usize>,
    pub buffer_view: Option<usize>,
}

impl GeometryAttribute {
    /// Attribute over tightly packed bytes starting at offset 0.
    pub fn packed(
        name: impl Into<String>,
        kind: AttributeKind,
        base_type: VertexBaseType,
        vertex_size: usize,
        data: Vec<u8>,
    ) -> Self {
        let element = base_type.size() * vertex_size;
        let count = if element == 0 { 0 } else { data.len() / element };
        Self {
            name: name.into(),
            semantic: None,
            kind,
            base_type,
            vertex_size,
            count,
            byte_offset: 0,
            byte_stride: 0,
            normalized: false,
            data: data.into(),
            accessor: None,
            buffer_view: None,
        }
    }

    pub fn with_semantic(mut self, semantic: impl Into<String>) -> Self {
        self.semantic = Some(semantic.into());
        self
    }

    pub fn element_size(&self) -> usize {
        self.base_type.size() * self.vertex_size
    }

    pub fn effective_stride(&self) -> usize {
        if self.byte_stride == 0 {
            self.element_size()
        } else {
            self.byte_stride
        }
    }

    /// Bytes of element `index`.
    pub fn element(&self, index: usize) -> Result<&[u8]> {
        let start = self.byte_offset + index * self.effective_stride();
        self.data
            .get(start..start + self.element_size())
            .ok_or_else(|| {
                GltfError::InvalidGltf(format!(
                    "element {} of attribute {} is out of its buffer",
                    index, self.name
                ))
            })
    }

    /// De-strided copy of all elements.
    pub fn packed_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.count * self.element_size());
        for i in 0..self.count {
            out.extend_from_slice(self.element(i)?);
        }
        Ok(out)
    }

    /// Components of element `index` as `f32`. Normalized integers map to
    /// `[0, 1]` or `[-1, 1]`.
    pub fn read_f32(&self, index: usize) -> Result<Vec<f32>> {
        let bytes = self.element(index)?;
        let size = self.base_type.size();
        Ok(bytes
            .chunks_exact(size)
            .map(|c| component_to_f32(self.base_type, c, self.normalized))
            .collect())
    }

    /// Integer values of a scalar attribute, typically indices.
    pub fn read_indices(&self) -> Result<Vec<u32>> {
        let mut out = Vec::with_capacity(self.count * self.vertex_size);
        for i in 0..self.count {
            let bytes = self.element(i)?;
            for c in bytes.chunks_exact(self.base_type.size()) {
                let value = match self.base_type {
                    VertexBaseType::UnsignedByte | VertexBaseType::Byte => c[0] as u32,
                    VertexBaseType::UnsignedShort | VertexBaseType::Short => {
                        LittleEndian::read_u16(c) as u32
                    }
                    VertexBaseType::UnsignedInt | VertexBaseType::Int => LittleEndian::read_u32(c),
                    other => {
                        return Err(GltfError::InvalidAttributeLayout(format!(
                            "{:?} values cannot be read as indices",
                            other
                        )))
                    }
                };
                out.push(value);
            }
        }
        Ok(out)
    }
}

fn component_to_f32(base_type: VertexBaseType, c: &[u8], normalized: bool) -> f32 {
    match base_type {
        VertexBaseType::Float => LittleEndian::read_f32(c),
        VertexBaseType::Double => LittleEndian::read_f64(c) as f32,
        VertexBaseType::HalfFloat => f16::from_bits(LittleEndian::read_u16(c)).to_f32(),
        VertexBaseType::UnsignedByte => {
            let v = c[0] as f32;
            if normalized {
                v / u8::MAX as f32
            } else {
                v
            }
        }
        VertexBaseType::Byte => {
            let v = c[0] as i8 as f32;
            if normalized {
                (v / i8::MAX as f32).max(-1.0)
            } else {
                v
            }
        }
        VertexBaseType::UnsignedShort => {
            let v = LittleEndian::read_u16(c) as f32;
            if normalized {
                v / u16::MAX as f32
            } else {
                v
            }
        }
        VertexBaseType::Short => {
            let v = LittleEndian::read_i16(c) as f32;
            if normalized {
                (v / i16::MAX as f32).max(-1.0)
            } else {
                v
            }
        }
        VertexBaseType::UnsignedInt => LittleEndian::read_u32(c) as f32,
        VertexBaseType::Int => LittleEndian::read_i32(c) as f32,
    }
}

/// Attribute arena of one primitive.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub primitive_type: PrimitiveType,
    attributes: Vec<GeometryAttribute>,
}

impl Geometry {
    pub fn new(primitive_type: PrimitiveType) -> Self {
        Self {
            primitive_type,
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute and returns its id.
    pub fn add_attribute(&mut self, attribute: GeometryAttribute) -> usize {
        self.attributes.push(attribute);
        self.attributes.len() - 1
    }

    pub fn attributes(&self) -> &[GeometryAttribute] {
        &self.attributes
    }

    pub fn attribute(&self, id: usize) -> Option<&GeometryAttribute> {
        self.attributes.get(id)
    }

    pub fn attribute_by_name(&self, name: &str) -> Option<&GeometryAttribute> {
        self.attributes
            .iter()
            .find(|a| a.kind == AttributeKind::Vertex && a.name == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute_by_name(name).is_some()
    }

    pub fn index_attribute(&self) -> Option<&GeometryAttribute> {
        self.attributes.iter().find(|a| a.kind == AttributeKind::Index)
    }

    pub fn vertex_attributes(&self) -> impl Iterator<Item = &GeometryAttribute> {
        self.attributes.iter().filter(|a| a.kind == AttributeKind::Vertex)
    }

    /// Number of vertices, taken from the position stream when present.
    pub fn vertex_count(&self) -> usize {
        self.attribute_by_name(POSITION_ATTRIBUTE_NAME)
            .or_else(|| self.vertex_attributes().next())
            .map(|a| a.count)
            .unwrap_or(0)
    }

    pub(crate) fn replace_attributes(&mut self, attributes: Vec<GeometryAttribute>) {
        self.attributes = attributes;
    }
}
