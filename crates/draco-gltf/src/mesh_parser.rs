//! Builds per-primitive geometry from glTF meshes.
//!
//! Primitives are loaded either from their accessors or, when they carry a
//! `KHR_draco_mesh_compression` extension, from the decoded Draco payload
//! with any remaining attributes taken from accessors.

use std::collections::BTreeSet;

use log::{debug, warn};

use crate::accessors::AccessorTable;
use crate::buffers::BufferViewTable;
use crate::config::ImportOptions;
use crate::draco_bridge;
use crate::error::{GltfError, Result};
use crate::geometry::*;
use crate::keys;
use crate::mesh_utils;
use crate::schema::{RawMesh, RawPrimitive};

const MORPH_SEMANTICS: [&str; 3] = ["POSITION", "NORMAL", "TANGENT"];

/// Standard attribute name of a glTF semantic. Other semantics are kept
/// as custom attribute names.
pub fn standard_attribute_name(semantic: &str) -> Option<&'static str> {
    match semantic {
        "POSITION" => Some(POSITION_ATTRIBUTE_NAME),
        "NORMAL" => Some(NORMAL_ATTRIBUTE_NAME),
        "TANGENT" => Some(TANGENT_ATTRIBUTE_NAME),
        "TEXCOORD_0" => Some(TEXCOORD_ATTRIBUTE_NAME),
        "TEXCOORD_1" => Some(TEXCOORD1_ATTRIBUTE_NAME),
        "TEXCOORD_2" => Some(TEXCOORD2_ATTRIBUTE_NAME),
        "COLOR_0" => Some(COLOR_ATTRIBUTE_NAME),
        "JOINTS_0" => Some(JOINT_INDICES_ATTRIBUTE_NAME),
        "WEIGHTS_0" => Some(JOINT_WEIGHTS_ATTRIBUTE_NAME),
        _ => None,
    }
}

fn attribute_name(semantic: &str) -> String {
    standard_attribute_name(semantic)
        .map(str::to_owned)
        .unwrap_or_else(|| semantic.to_owned())
}

const FLOAT_UBYTE_USHORT: &[VertexBaseType] = &[
    VertexBaseType::Float,
    VertexBaseType::UnsignedByte,
    VertexBaseType::UnsignedShort,
];
const INDEX_TYPES: &[VertexBaseType] = &[
    VertexBaseType::UnsignedByte,
    VertexBaseType::UnsignedShort,
    VertexBaseType::UnsignedInt,
];

/// Allowed component types per attribute. Empty means unrestricted.
pub fn valid_base_types(attribute: &GeometryAttribute) -> &'static [VertexBaseType] {
    if attribute.kind == AttributeKind::Index {
        return INDEX_TYPES;
    }
    match attribute.name.as_str() {
        POSITION_ATTRIBUTE_NAME | NORMAL_ATTRIBUTE_NAME | TANGENT_ATTRIBUTE_NAME => {
            &[VertexBaseType::Float]
        }
        TEXCOORD_ATTRIBUTE_NAME
        | TEXCOORD1_ATTRIBUTE_NAME
        | TEXCOORD2_ATTRIBUTE_NAME
        | COLOR_ATTRIBUTE_NAME
        | JOINT_WEIGHTS_ATTRIBUTE_NAME => FLOAT_UBYTE_USHORT,
        JOINT_INDICES_ATTRIBUTE_NAME => {
            &[VertexBaseType::UnsignedByte, VertexBaseType::UnsignedShort]
        }
        _ => &[],
    }
}

/// Allowed component counts per attribute. Empty means unrestricted.
pub fn valid_vertex_sizes(attribute: &GeometryAttribute) -> &'static [usize] {
    if attribute.kind == AttributeKind::Index {
        return &[1];
    }
    match attribute.name.as_str() {
        POSITION_ATTRIBUTE_NAME | NORMAL_ATTRIBUTE_NAME => &[3],
        TANGENT_ATTRIBUTE_NAME => &[4],
        TEXCOORD_ATTRIBUTE_NAME | TEXCOORD1_ATTRIBUTE_NAME | TEXCOORD2_ATTRIBUTE_NAME => &[2],
        COLOR_ATTRIBUTE_NAME => &[3, 4],
        JOINT_INDICES_ATTRIBUTE_NAME | JOINT_WEIGHTS_ATTRIBUTE_NAME => &[4],
        _ => &[],
    }
}

/// Checks every attribute against the glTF 2.0 layout tables.
pub fn validate_geometry(geometry: &Geometry) -> Result<()> {
    for attribute in geometry.attributes() {
        let types = valid_base_types(attribute);
        let sizes = valid_vertex_sizes(attribute);
        let type_ok = types.is_empty() || types.contains(&attribute.base_type);
        let size_ok = sizes.is_empty() || sizes.contains(&attribute.vertex_size);
        if !(type_ok && size_ok) {
            warn!("Geometry doesn't meet glTF 2.0 requirements");
            return Err(GltfError::InvalidAttributeLayout(format!(
                "{} has {} x {:?}",
                attribute.name, attribute.vertex_size, attribute.base_type
            )));
        }
    }
    Ok(())
}

/// One entry of a primitive's attribute set.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    /// glTF semantic, or `"indices"` for the index stream.
    pub semantic: String,
    pub name: String,
    pub accessor: Option<usize>,
    pub is_index: bool,
    pub is_draco: bool,
    pub draco_id: Option<u32>,
}

impl AttributeInfo {
    /// Entry for an attribute computed at import time.
    fn generated(semantic: &str, name: &str) -> Self {
        Self {
            semantic: semantic.to_owned(),
            name: name.to_owned(),
            accessor: None,
            is_index: false,
            is_draco: false,
            draco_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MorphTarget {
    /// (semantic, accessor) pairs, semantics drawn from POSITION, NORMAL
    /// and TANGENT.
    pub attributes: Vec<(String, usize)>,
}

impl MorphTarget {
    fn semantics(&self) -> BTreeSet<&str> {
        self.attributes.iter().map(|(s, _)| s.as_str()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Primitive {
    pub attribute_info: Vec<AttributeInfo>,
    pub morph_targets: Vec<MorphTarget>,
    pub primitive_type: PrimitiveType,
    pub material: Option<usize>,
    pub is_draco_compressed: bool,
    pub has_color_attr: bool,
    pub has_normal_attr: bool,
    pub has_tangent_attr: bool,
    pub key: Option<String>,
    pub geometry: Geometry,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
    pub morph_target_count: usize,
    pub morph_target_weights: Vec<f32>,
}

/// Name under which morph target `target` of `semantic` is stored.
pub fn morph_attribute_name(semantic: &str, target: usize) -> String {
    format!("{}_{}", attribute_name(semantic), target + 1)
}

pub(crate) struct MeshParser<'a> {
    views: &'a BufferViewTable,
    accessors: &'a AccessorTable,
    options: &'a ImportOptions,
}

impl<'a> MeshParser<'a> {
    pub(crate) fn new(
        views: &'a BufferViewTable,
        accessors: &'a AccessorTable,
        options: &'a ImportOptions,
    ) -> Self {
        Self {
            views,
            accessors,
            options,
        }
    }

    pub(crate) fn parse(&self, meshes: &[RawMesh]) -> Result<Vec<Mesh>> {
        meshes
            .iter()
            .enumerate()
            .map(|(i, mesh)| self.parse_mesh(i, mesh))
            .collect()
    }

    fn parse_mesh(&self, index: usize, raw: &RawMesh) -> Result<Mesh> {
        if raw.primitives.is_empty() {
            return Err(GltfError::MalformedMesh(format!("mesh {} has no primitives", index)));
        }
        let mut primitives = Vec::with_capacity(raw.primitives.len());
        for (p, raw_primitive) in raw.primitives.iter().enumerate() {
            let primitive = self.parse_primitive(raw_primitive).map_err(|e| match e {
                GltfError::MalformedMesh(msg) => {
                    GltfError::MalformedMesh(format!("mesh {} primitive {}: {}", index, p, msg))
                }
                other => other,
            })?;
            primitives.push(primitive);
        }
        let morph_target_count = check_morph_layout(index, &primitives)?;

        let mut morph_target_weights = raw.weights.clone();
        morph_target_weights.resize(morph_target_count, 0.0);
        debug!(
            "Parsed mesh {} with {} primitives and {} morph targets",
            index,
            primitives.len(),
            morph_target_count
        );
        Ok(Mesh {
            name: raw.name.clone(),
            primitives,
            morph_target_count,
            morph_target_weights,
        })
    }

    /// Geometry of a plain primitive straight from its accessors: vertex
    /// attributes and indices, no morph targets, nothing generated.
    pub(crate) fn accessor_geometry(
        &self,
        raw: &RawPrimitive,
        info: &mut Vec<AttributeInfo>,
    ) -> Result<Geometry> {
        let mut geometry = Geometry::new(primitive_type(raw)?);
        self.add_accessor_attributes(&mut geometry, raw, &BTreeSet::new(), info)?;
        if let Some(indices) = raw.indices {
            let mut attribute =
                self.accessors
                    .resolve(indices, self.views, self.options.large_offset_threshold)?;
            attribute.name = keys::KEY_INDICES.to_owned();
            attribute.kind = AttributeKind::Index;
            geometry.add_attribute(attribute);
            info.push(AttributeInfo {
                semantic: keys::KEY_INDICES.to_owned(),
                name: keys::KEY_INDICES.to_owned(),
                accessor: Some(indices),
                is_index: true,
                is_draco: false,
                draco_id: None,
            });
        }
        Ok(geometry)
    }

    fn add_accessor_attributes(
        &self,
        geometry: &mut Geometry,
        raw: &RawPrimitive,
        skip: &BTreeSet<String>,
        info: &mut Vec<AttributeInfo>,
    ) -> Result<()> {
        for (semantic, &accessor) in &raw.attributes {
            if skip.contains(semantic) {
                continue;
            }
            let mut attribute =
                self.accessors
                    .resolve(accessor, self.views, self.options.large_offset_threshold)?;
            attribute.name = attribute_name(semantic);
            attribute.semantic = Some(semantic.clone());
            info.push(AttributeInfo {
                semantic: semantic.clone(),
                name: attribute.name.clone(),
                accessor: Some(accessor),
                is_index: false,
                is_draco: false,
                draco_id: None,
            });
            geometry.add_attribute(attribute);
        }
        Ok(())
    }

    fn draco_geometry(
        &self,
        raw: &RawPrimitive,
        info: &mut Vec<AttributeInfo>,
    ) -> Result<Geometry> {
        let ext = match raw.draco_extension() {
            Some(ext) => ext?,
            None => return Err(GltfError::MalformedMesh("no Draco extension".into())),
        };
        let view_id = ext
            .buffer_view
            .ok_or_else(|| GltfError::MalformedMesh("Draco extension has no bufferView".into()))?;
        if ext.attributes.is_empty() {
            return Err(GltfError::MalformedMesh("Draco extension has no attributes".into()));
        }
        let view = self.views.resolve(view_id)?;
        let decoded = draco_bridge::decode_draco_primitive(&view.data, &ext.attributes)?;

        let mut geometry = Geometry::new(primitive_type(raw)?);
        let mut from_draco = BTreeSet::new();
        for (semantic, mut attribute) in decoded.attributes {
            let accessor = raw.attributes.get(&semantic).copied();
            attribute.name = attribute_name(&semantic);
            attribute.semantic = Some(semantic.clone());
            attribute.accessor = accessor;
            info.push(AttributeInfo {
                semantic: semantic.clone(),
                name: attribute.name.clone(),
                accessor,
                is_index: false,
                is_draco: true,
                draco_id: ext.attributes.get(&semantic).copied(),
            });
            geometry.add_attribute(attribute);
            from_draco.insert(semantic);
        }
        if let Some(mut indices) = decoded.indices {
            indices.name = keys::KEY_INDICES.to_owned();
            indices.accessor = raw.indices;
            geometry.add_attribute(indices);
            info.push(AttributeInfo {
                semantic: keys::KEY_INDICES.to_owned(),
                name: keys::KEY_INDICES.to_owned(),
                accessor: raw.indices,
                is_index: true,
                is_draco: true,
                draco_id: None,
            });
        }
        // Attributes the extension does not cover come from their accessors.
        self.add_accessor_attributes(&mut geometry, raw, &from_draco, info)?;
        Ok(geometry)
    }

    fn parse_primitive(&self, raw: &RawPrimitive) -> Result<Primitive> {
        if raw.attributes.is_empty() {
            return Err(GltfError::MalformedMesh("primitive has no attributes".into()));
        }
        let is_draco_compressed = raw.draco_extension().is_some();
        let mut attribute_info = Vec::new();
        let mut geometry = if is_draco_compressed {
            self.draco_geometry(raw, &mut attribute_info)?
        } else {
            self.accessor_geometry(raw, &mut attribute_info)?
        };
        validate_geometry(&geometry)?;

        let morph_targets = self.add_morph_targets(&mut geometry, raw)?;
        let has_color_attr = geometry.has_attribute(COLOR_ATTRIBUTE_NAME);

        if geometry.primitive_type.is_triangular() {
            if self.options.generate_normals && !geometry.has_attribute(NORMAL_ATTRIBUTE_NAME) {
                mesh_utils::generate_normals(&mut geometry)?;
                attribute_info.push(AttributeInfo::generated("NORMAL", NORMAL_ATTRIBUTE_NAME));
            }
            if self.options.generate_tangents && !geometry.has_attribute(TANGENT_ATTRIBUTE_NAME) {
                if mesh_utils::generate_tangents(&mut geometry)? {
                    attribute_info
                        .push(AttributeInfo::generated("TANGENT", TANGENT_ATTRIBUTE_NAME));
                } else {
                    debug!("Skipped tangent generation: missing normals or texture coordinates");
                }
            }
        }

        Ok(Primitive {
            attribute_info,
            morph_targets,
            primitive_type: geometry.primitive_type,
            material: raw.material,
            is_draco_compressed,
            has_color_attr,
            has_normal_attr: geometry.has_attribute(NORMAL_ATTRIBUTE_NAME),
            has_tangent_attr: geometry.has_attribute(TANGENT_ATTRIBUTE_NAME),
            key: keys::asset_key(raw.extensions.as_ref()),
            geometry,
        })
    }

    fn add_morph_targets(
        &self,
        geometry: &mut Geometry,
        raw: &RawPrimitive,
    ) -> Result<Vec<MorphTarget>> {
        let vertex_count = geometry.vertex_count();
        let mut targets = Vec::with_capacity(raw.targets.len());
        for (t, target) in raw.targets.iter().enumerate() {
            let mut attributes = Vec::with_capacity(target.len());
            for (semantic, &accessor) in target {
                if !MORPH_SEMANTICS.contains(&semantic.as_str()) {
                    return Err(GltfError::MalformedMesh(format!(
                        "morph target {} has unsupported attribute {}",
                        t, semantic
                    )));
                }
                let mut attribute =
                    self.accessors
                        .resolve(accessor, self.views, self.options.large_offset_threshold)?;
                if attribute.base_type != VertexBaseType::Float || attribute.vertex_size != 3 {
                    return Err(GltfError::InvalidAttributeLayout(format!(
                        "morph target {} {} must be 3 floats",
                        t, semantic
                    )));
                }
                if attribute.count != vertex_count {
                    return Err(GltfError::MalformedMesh(format!(
                        "morph target {} {} has {} elements for {} vertices",
                        t, semantic, attribute.count, vertex_count
                    )));
                }
                attribute.name = morph_attribute_name(semantic, t);
                attribute.semantic = Some(semantic.clone());
                geometry.add_attribute(attribute);
                attributes.push((semantic.clone(), accessor));
            }
            targets.push(MorphTarget { attributes });
        }

        if let Some(first) = targets.first() {
            let layout = first.semantics();
            if targets.iter().any(|t| t.semantics() != layout) {
                return Err(GltfError::MalformedMesh(
                    "morph targets of a primitive declare different attributes".into(),
                ));
            }
        }
        Ok(targets)
    }
}

fn primitive_type(raw: &RawPrimitive) -> Result<PrimitiveType> {
    let mode = raw.mode.unwrap_or(4);
    PrimitiveType::from_mode(mode)
        .ok_or_else(|| GltfError::MalformedMesh(format!("unknown primitive mode {}", mode)))
}

/// Every primitive of a mesh must declare the same morph targets.
/// Returns the shared target count.
fn check_morph_layout(mesh: usize, primitives: &[Primitive]) -> Result<usize> {
    let Some(first) = primitives.first() else {
        return Ok(0);
    };
    let count = first.morph_targets.len();
    let layout = first.morph_targets.first().map(MorphTarget::semantics);
    for (p, primitive) in primitives.iter().enumerate().skip(1) {
        if primitive.morph_targets.len() != count
            || primitive.morph_targets.first().map(MorphTarget::semantics) != layout
        {
            return Err(GltfError::MalformedMesh(format!(
                "mesh {}: primitive {} morph targets differ from primitive 0 ({} vs {})",
                mesh,
                p,
                primitive.morph_targets.len(),
                count
            )));
        }
    }
    Ok(count)
}
