//! Normal and tangent generation for triangle primitives.

use log::debug;

use crate::error::{GltfError, Result};
use crate::geometry::{
    AttributeKind, Geometry, GeometryAttribute, PrimitiveType, VertexBaseType,
    NORMAL_ATTRIBUTE_NAME, POSITION_ATTRIBUTE_NAME, TANGENT_ATTRIBUTE_NAME,
    TEXCOORD_ATTRIBUTE_NAME,
};

type Vec3 = [f32; 3];

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn scale(a: Vec3, s: f32) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(a: Vec3) -> Option<Vec3> {
    let len = dot(a, a).sqrt();
    if len > f32::EPSILON {
        Some(scale(a, 1.0 / len))
    } else {
        None
    }
}

/// Vertex triples of every triangle, following the primitive topology.
///
/// Strips alternate winding so every triangle keeps the orientation of the
/// first one.
pub fn triangle_indices(geometry: &Geometry) -> Result<Vec<[u32; 3]>> {
    let indices = match geometry.index_attribute() {
        Some(index) => index.read_indices()?,
        None => (0..geometry.vertex_count() as u32).collect(),
    };
    let n = indices.len();
    let faces = match geometry.primitive_type {
        PrimitiveType::Triangles => indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect(),
        PrimitiveType::TriangleStrip => (0..n.saturating_sub(2))
            .map(|i| {
                if i % 2 == 0 {
                    [indices[i], indices[i + 1], indices[i + 2]]
                } else {
                    [indices[i + 1], indices[i], indices[i + 2]]
                }
            })
            .collect(),
        PrimitiveType::TriangleFan => (0..n.saturating_sub(2))
            .map(|i| [indices[0], indices[i + 1], indices[i + 2]])
            .collect(),
        other => {
            return Err(GltfError::UnsupportedGeometryType(format!(
                "{:?} primitives have no triangles",
                other
            )))
        }
    };
    Ok(faces)
}

fn read_vec3(attribute: &GeometryAttribute, index: u32) -> Result<Vec3> {
    let v = attribute.read_f32(index as usize)?;
    Ok([v[0], v[1], v[2]])
}

fn require_float3<'a>(geometry: &'a Geometry, name: &str) -> Result<&'a GeometryAttribute> {
    let attribute = geometry
        .attribute_by_name(name)
        .ok_or_else(|| GltfError::MalformedMesh(format!("primitive has no {} attribute", name)))?;
    if attribute.base_type != VertexBaseType::Float || attribute.vertex_size != 3 {
        return Err(GltfError::InvalidAttributeLayout(format!(
            "{} must be 3 floats",
            name
        )));
    }
    Ok(attribute)
}

/// Replaces the geometry with a non-indexed triangle list carrying one
/// face normal per corner.
pub fn generate_normals(geometry: &mut Geometry) -> Result<()> {
    let faces = triangle_indices(geometry)?;
    let positions = require_float3(geometry, POSITION_ATTRIBUTE_NAME)?;

    let mut normals = Vec::with_capacity(faces.len() * 9 * 4);
    for face in &faces {
        let p0 = read_vec3(positions, face[0])?;
        let p1 = read_vec3(positions, face[1])?;
        let p2 = read_vec3(positions, face[2])?;
        let normal = normalize(cross(sub(p1, p0), sub(p2, p0))).unwrap_or([0.0, 0.0, 0.0]);
        for _ in 0..3 {
            normals.extend(normal.iter().flat_map(|c| c.to_le_bytes()));
        }
    }

    let mut flattened = Vec::new();
    for attribute in geometry.vertex_attributes() {
        let mut data = Vec::with_capacity(faces.len() * 3 * attribute.element_size());
        for face in &faces {
            for &vertex in face {
                data.extend_from_slice(attribute.element(vertex as usize)?);
            }
        }
        let mut corner = GeometryAttribute::packed(
            attribute.name.clone(),
            AttributeKind::Vertex,
            attribute.base_type,
            attribute.vertex_size,
            data,
        );
        corner.semantic = attribute.semantic.clone();
        corner.normalized = attribute.normalized;
        flattened.push(corner);
    }
    flattened.push(GeometryAttribute::packed(
        NORMAL_ATTRIBUTE_NAME,
        AttributeKind::Vertex,
        VertexBaseType::Float,
        3,
        normals,
    ));

    debug!("Generated normals for {} triangles", faces.len());
    geometry.replace_attributes(flattened);
    geometry.primitive_type = PrimitiveType::Triangles;
    Ok(())
}

fn read_uv(attribute: &GeometryAttribute, index: u32) -> Result<[f32; 2]> {
    let bytes = attribute.element(index as usize)?;
    let uv = match attribute.base_type {
        VertexBaseType::Float => attribute.read_f32(index as usize)?,
        VertexBaseType::UnsignedByte => bytes.iter().map(|&b| b as f32 / u8::MAX as f32).collect(),
        VertexBaseType::UnsignedShort => bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]) as f32 / u16::MAX as f32)
            .collect(),
        other => {
            return Err(GltfError::InvalidAttributeLayout(format!(
                "texture coordinates of type {:?}",
                other
            )))
        }
    };
    Ok([uv[0], uv[1]])
}

/// Adds a `vertexTangent` attribute (xyz plus handedness in w).
///
/// Returns `false` without touching the geometry when positions, normals
/// or texture coordinates are missing.
pub fn generate_tangents(geometry: &mut Geometry) -> Result<bool> {
    let (Some(_), Some(_), Some(uvs)) = (
        geometry.attribute_by_name(POSITION_ATTRIBUTE_NAME),
        geometry.attribute_by_name(NORMAL_ATTRIBUTE_NAME),
        geometry.attribute_by_name(TEXCOORD_ATTRIBUTE_NAME),
    ) else {
        return Ok(false);
    };
    if uvs.vertex_size != 2 {
        return Err(GltfError::InvalidAttributeLayout(
            "texture coordinates must have 2 components".into(),
        ));
    }
    let positions = require_float3(geometry, POSITION_ATTRIBUTE_NAME)?;
    let normals = require_float3(geometry, NORMAL_ATTRIBUTE_NAME)?;
    let faces = triangle_indices(geometry)?;
    let vertex_count = positions.count;

    let mut tan1 = vec![[0.0f32; 3]; vertex_count];
    let mut tan2 = vec![[0.0f32; 3]; vertex_count];
    for face in &faces {
        if face.iter().any(|&v| v as usize >= vertex_count) {
            return Err(GltfError::MalformedMesh(format!(
                "index {:?} exceeds {} vertices",
                face, vertex_count
            )));
        }
        let p = [
            read_vec3(positions, face[0])?,
            read_vec3(positions, face[1])?,
            read_vec3(positions, face[2])?,
        ];
        let w = [read_uv(uvs, face[0])?, read_uv(uvs, face[1])?, read_uv(uvs, face[2])?];
        let e1 = sub(p[1], p[0]);
        let e2 = sub(p[2], p[0]);
        let (s1, t1) = (w[1][0] - w[0][0], w[1][1] - w[0][1]);
        let (s2, t2) = (w[2][0] - w[0][0], w[2][1] - w[0][1]);
        let det = s1 * t2 - s2 * t1;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let sdir = scale(sub(scale(e1, t2), scale(e2, t1)), r);
        let tdir = scale(sub(scale(e2, s1), scale(e1, s2)), r);
        for &v in face {
            tan1[v as usize] = add(tan1[v as usize], sdir);
            tan2[v as usize] = add(tan2[v as usize], tdir);
        }
    }

    let mut data = Vec::with_capacity(vertex_count * 16);
    for v in 0..vertex_count {
        let n = read_vec3(normals, v as u32)?;
        // Gram-Schmidt
        let t = normalize(sub(tan1[v], scale(n, dot(n, tan1[v]))))
            .or_else(|| normalize(cross(n, [0.0, 0.0, 1.0])))
            .or_else(|| normalize(cross(n, [0.0, 1.0, 0.0])))
            .unwrap_or([1.0, 0.0, 0.0]);
        let handedness = if dot(cross(n, t), tan2[v]) < 0.0 { -1.0f32 } else { 1.0 };
        for c in [t[0], t[1], t[2], handedness] {
            data.extend_from_slice(&c.to_le_bytes());
        }
    }

    geometry.add_attribute(GeometryAttribute::packed(
        TANGENT_ATTRIBUTE_NAME,
        AttributeKind::Vertex,
        VertexBaseType::Float,
        4,
        data,
    ));
    Ok(true)
}
