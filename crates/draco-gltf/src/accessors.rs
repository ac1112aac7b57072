//! Accessor table and resolution of accessors into typed attribute data.

use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use crate::buffers::BufferViewTable;
use crate::error::{GltfError, Result};
use crate::geometry::{AttributeKind, GeometryAttribute, VertexBaseType};
use crate::schema::RawAccessor;

/// Component count of an accessor `type`.
pub fn data_size_from_type(accessor_type: &str) -> Option<usize> {
    match accessor_type.to_ascii_uppercase().as_str() {
        "SCALAR" => Some(1),
        "VEC2" => Some(2),
        "VEC3" => Some(3),
        "VEC4" | "MAT2" => Some(4),
        "MAT3" => Some(9),
        "MAT4" => Some(16),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sparse {
    pub count: usize,
    pub indices_buffer_view: usize,
    pub indices_byte_offset: usize,
    pub indices_type: VertexBaseType,
    pub values_buffer_view: usize,
    pub values_byte_offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    pub buffer_view: Option<usize>,
    pub base_type: VertexBaseType,
    /// Components per element.
    pub data_size: usize,
    pub count: usize,
    pub byte_offset: usize,
    pub normalized: bool,
    pub sparse: Option<Sparse>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
    pub name: Option<String>,
}

impl Accessor {
    pub fn element_size(&self) -> usize {
        self.base_type.size() * self.data_size
    }

    fn from_raw(index: usize, raw: &RawAccessor) -> Result<Self> {
        let missing = |key: &str| {
            GltfError::InvalidGltf(format!("accessor {} is missing \"{}\"", index, key))
        };
        let component_type = raw.component_type.ok_or_else(|| missing("componentType"))?;
        let count = raw.count.ok_or_else(|| missing("count"))?;
        let accessor_type = raw.accessor_type.as_deref().ok_or_else(|| missing("type"))?;

        let base_type = VertexBaseType::from_component_type(component_type).ok_or_else(|| {
            GltfError::InvalidGltf(format!(
                "accessor {} has unsupported componentType {}",
                index, component_type
            ))
        })?;
        let data_size = data_size_from_type(accessor_type).ok_or_else(|| {
            GltfError::InvalidGltf(format!(
                "accessor {} has unrecognized type {}",
                index, accessor_type
            ))
        })?;

        let sparse = match &raw.sparse {
            Some(s) => {
                let indices_type = VertexBaseType::from_component_type(s.indices.component_type)
                    .filter(|t| t.is_unsigned_integer())
                    .ok_or_else(|| {
                        GltfError::InvalidGltf(format!(
                            "accessor {} has sparse indices of componentType {}",
                            index, s.indices.component_type
                        ))
                    })?;
                Some(Sparse {
                    count: s.count,
                    indices_buffer_view: s.indices.buffer_view,
                    indices_byte_offset: s.indices.byte_offset,
                    indices_type,
                    values_buffer_view: s.values.buffer_view,
                    values_byte_offset: s.values.byte_offset,
                })
            }
            None => None,
        };

        Ok(Self {
            buffer_view: raw.buffer_view,
            base_type,
            data_size,
            count,
            byte_offset: raw.byte_offset,
            normalized: raw.normalized,
            sparse,
            min: raw.min.clone(),
            max: raw.max.clone(),
            name: raw.name.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccessorTable {
    accessors: Vec<Accessor>,
}

impl AccessorTable {
    pub(crate) fn parse(raw: &[RawAccessor]) -> Result<Self> {
        let accessors = raw
            .iter()
            .enumerate()
            .map(|(i, a)| Accessor::from_raw(i, a))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { accessors })
    }

    pub fn get(&self, id: usize) -> Result<&Accessor> {
        self.accessors
            .get(id)
            .ok_or_else(|| GltfError::reference("accessor", id))
    }

    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Accessor> {
        self.accessors.iter()
    }

    /// Resolves accessor `id` into attribute data.
    ///
    /// The result shares the bufferView bytes when possible. Sparse
    /// accessors are overlaid onto a packed copy of their base data, and
    /// accessors starting past `large_offset_threshold` bytes into their
    /// buffer get a zero-offset copy.
    pub fn resolve(
        &self,
        id: usize,
        views: &BufferViewTable,
        large_offset_threshold: Option<usize>,
    ) -> Result<GeometryAttribute> {
        let accessor = self.get(id)?;
        let element_size = accessor.element_size();
        let out_of_range = || {
            GltfError::InvalidGltf(format!(
                "accessor {} with {} elements is out of range",
                id, accessor.count
            ))
        };
        let byte_length = accessor
            .count
            .checked_mul(element_size)
            .ok_or_else(out_of_range)?;

        let mut attribute = GeometryAttribute {
            name: accessor.name.clone().unwrap_or_default(),
            semantic: None,
            kind: AttributeKind::Vertex,
            base_type: accessor.base_type,
            vertex_size: accessor.data_size,
            count: accessor.count,
            byte_offset: 0,
            byte_stride: 0,
            normalized: accessor.normalized,
            data: Arc::from(Vec::new()),
            accessor: Some(id),
            buffer_view: accessor.buffer_view,
        };

        if let Some(view_id) = accessor.buffer_view {
            let view = views.resolve(view_id)?;
            if view.byte_stride != 0 && view.byte_stride < element_size {
                return Err(GltfError::InvalidGltf(format!(
                    "bufferView {} stride {} is smaller than the elements of accessor {}",
                    view_id, view.byte_stride, id
                )));
            }
            let stride = if view.byte_stride == 0 {
                element_size
            } else {
                view.byte_stride
            };
            let end = match accessor.count {
                0 => Some(accessor.byte_offset),
                n => (n - 1)
                    .checked_mul(stride)
                    .and_then(|span| span.checked_add(element_size))
                    .and_then(|span| span.checked_add(accessor.byte_offset)),
            }
            .ok_or_else(out_of_range)?;
            if end > view.data.len() {
                return Err(GltfError::InvalidGltf(format!(
                    "accessor {} reads {} bytes past bufferView {}",
                    id,
                    end - view.data.len(),
                    view_id
                )));
            }

            let absolute_offset = view.byte_offset + accessor.byte_offset;
            match large_offset_threshold {
                Some(threshold) if absolute_offset > threshold => {
                    debug!(
                        "Copying accessor {} to a fresh buffer (offset {} > {})",
                        id, absolute_offset, threshold
                    );
                    attribute.data = Arc::from(&view.data[accessor.byte_offset..end]);
                }
                _ => {
                    attribute.data = view.data.clone();
                    attribute.byte_offset = accessor.byte_offset;
                }
            }
            attribute.byte_stride = view.byte_stride;
        } else {
            let mut zeros = Vec::new();
            zeros
                .try_reserve_exact(byte_length)
                .map_err(|_| out_of_range())?;
            zeros.resize(byte_length, 0);
            attribute.data = zeros.into();
        }

        if let Some(sparse) = &accessor.sparse {
            attribute = apply_sparse(id, attribute, sparse, views)?;
        }
        Ok(attribute)
    }
}

fn apply_sparse(
    id: usize,
    base: GeometryAttribute,
    sparse: &Sparse,
    views: &BufferViewTable,
) -> Result<GeometryAttribute> {
    let element_size = base.element_size();
    let mut packed = base.packed_bytes()?;

    let indices_view = views.resolve(sparse.indices_buffer_view)?;
    let values_view = views.resolve(sparse.values_buffer_view)?;
    let index_size = sparse.indices_type.size();
    let out_of_range = || {
        GltfError::InvalidGltf(format!("sparse data of accessor {} is out of range", id))
    };

    let slot = |offset: usize, i: usize, size: usize| {
        i.checked_mul(size)
            .and_then(|at| at.checked_add(offset))
            .and_then(|at| Some(at..at.checked_add(size)?))
    };
    if sparse.count > base.count {
        return Err(out_of_range());
    }

    for i in 0..sparse.count {
        let at = slot(sparse.indices_byte_offset, i, index_size).ok_or_else(out_of_range)?;
        let index_bytes = indices_view.data.get(at).ok_or_else(out_of_range)?;
        let target = match sparse.indices_type {
            VertexBaseType::UnsignedByte => index_bytes[0] as usize,
            VertexBaseType::UnsignedShort => LittleEndian::read_u16(index_bytes) as usize,
            _ => LittleEndian::read_u32(index_bytes) as usize,
        };
        if target >= base.count {
            return Err(out_of_range());
        }
        let from = slot(sparse.values_byte_offset, i, element_size).ok_or_else(out_of_range)?;
        let value = values_view.data.get(from).ok_or_else(out_of_range)?;
        packed[target * element_size..(target + 1) * element_size].copy_from_slice(value);
    }

    Ok(GeometryAttribute {
        byte_offset: 0,
        byte_stride: 0,
        data: packed.into(),
        ..base
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::Buffer;
    use crate::schema::RawBufferView;
    use serde_json::json;

    fn f32_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn tables(
        data: Vec<u8>,
        views: serde_json::Value,
        accessors: serde_json::Value,
    ) -> (BufferViewTable, AccessorTable) {
        let buffers = vec![Buffer {
            uri: None,
            name: None,
            data: data.into(),
        }];
        let raw_views: Vec<RawBufferView> = serde_json::from_value(views).unwrap();
        let raw_accessors: Vec<RawAccessor> = serde_json::from_value(accessors).unwrap();
        (
            BufferViewTable::parse(&raw_views, &buffers).unwrap(),
            AccessorTable::parse(&raw_accessors).unwrap(),
        )
    }

    #[test]
    fn test_type_sizes() {
        assert_eq!(data_size_from_type("SCALAR"), Some(1));
        assert_eq!(data_size_from_type("vec3"), Some(3));
        assert_eq!(data_size_from_type("MAT2"), Some(4));
        assert_eq!(data_size_from_type("MAT4"), Some(16));
        assert_eq!(data_size_from_type("VEC5"), None);
    }

    #[test]
    fn test_required_keys() {
        let raw: Vec<RawAccessor> =
            serde_json::from_value(json!([{ "componentType": 5126, "type": "VEC3" }])).unwrap();
        assert!(matches!(AccessorTable::parse(&raw), Err(GltfError::InvalidGltf(_))));
        let raw: Vec<RawAccessor> = serde_json::from_value(json!([
            { "componentType": 5124, "count": 1, "type": "SCALAR" }
        ]))
        .unwrap();
        assert!(AccessorTable::parse(&raw).is_err());
    }

    #[test]
    fn test_interleaved_resolution() {
        // Two vertices of position (vec3) + uv (vec2), stride 20.
        let data = f32_bytes(&[0.0, 1.0, 2.0, 0.5, 0.25, 3.0, 4.0, 5.0, 0.75, 1.0]);
        let (views, accessors) = tables(
            data,
            json!([{ "buffer": 0, "byteLength": 40, "byteStride": 20 }]),
            json!([
                { "bufferView": 0, "componentType": 5126, "count": 2, "type": "VEC3" },
                {
                    "bufferView": 0, "byteOffset": 12, "componentType": 5126,
                    "count": 2, "type": "VEC2"
                }
            ]),
        );
        let uv = accessors.resolve(1, &views, None).unwrap();
        assert_eq!(uv.byte_offset, 12);
        assert_eq!(uv.effective_stride(), 20);
        assert_eq!(uv.read_f32(1).unwrap(), vec![0.75, 1.0]);
        assert_eq!(uv.accessor, Some(1));

        // The copy starts at the accessor's first element.
        let copied = accessors.resolve(1, &views, Some(8)).unwrap();
        assert_eq!(copied.byte_offset, 0);
        assert_eq!(copied.data.len(), 28);
        assert_eq!(copied.read_f32(1).unwrap(), vec![0.75, 1.0]);
        let shared = accessors.resolve(0, &views, Some(8)).unwrap();
        assert_eq!(shared.data.len(), 40);
    }

    #[test]
    fn test_out_of_range_accessor() {
        let (views, accessors) = tables(
            vec![0; 12],
            json!([{ "buffer": 0, "byteLength": 12 }]),
            json!([
                { "bufferView": 0, "componentType": 5126, "count": 2, "type": "VEC3" },
                { "bufferView": 3, "componentType": 5126, "count": 1, "type": "VEC3" }
            ]),
        );
        assert!(matches!(accessors.resolve(0, &views, None), Err(GltfError::InvalidGltf(_))));
        assert!(matches!(
            accessors.resolve(1, &views, None),
            Err(GltfError::InvalidReference { kind: "bufferView", index: 3 })
        ));
        assert!(matches!(
            accessors.resolve(7, &views, None),
            Err(GltfError::InvalidReference { kind: "accessor", index: 7 })
        ));
    }

    #[test]
    fn test_overflowing_accessor_ranges() {
        let (views, accessors) = tables(
            vec![0; 12],
            json!([{ "buffer": 0, "byteLength": 12 }]),
            json!([
                {
                    "bufferView": 0, "componentType": 5126,
                    "count": 2000000000000000000u64, "type": "VEC3"
                },
                {
                    "bufferView": 0, "byteOffset": usize::MAX, "componentType": 5126,
                    "count": 1, "type": "VEC3"
                },
                { "componentType": 5126, "count": usize::MAX / 2, "type": "MAT4" },
                {
                    "bufferView": 0, "componentType": 5126, "count": 3, "type": "SCALAR",
                    "sparse": {
                        "count": 1,
                        "indices": {
                            "bufferView": 0, "byteOffset": usize::MAX, "componentType": 5125
                        },
                        "values": { "bufferView": 0 }
                    }
                }
            ]),
        );
        for id in 0..4 {
            assert!(
                matches!(accessors.resolve(id, &views, None), Err(GltfError::InvalidGltf(_))),
                "accessor {}",
                id
            );
        }
    }

    #[test]
    fn test_sparse_overlay() {
        let mut data = f32_bytes(&[1.0, 2.0, 3.0, 4.0]);
        data.extend_from_slice(&[3, 0, 1, 0]); // u16 indices 3 and 1
        data.extend_from_slice(&f32_bytes(&[40.0, 20.0]));
        let (views, accessors) = tables(
            data,
            json!([
                { "buffer": 0, "byteLength": 16 },
                { "buffer": 0, "byteOffset": 16, "byteLength": 4 },
                { "buffer": 0, "byteOffset": 20, "byteLength": 8 }
            ]),
            json!([
                {
                    "bufferView": 0, "componentType": 5126, "count": 4, "type": "SCALAR",
                    "sparse": {
                        "count": 2,
                        "indices": { "bufferView": 1, "componentType": 5123 },
                        "values": { "bufferView": 2 }
                    }
                },
                {
                    "componentType": 5126, "count": 3, "type": "SCALAR",
                    "sparse": {
                        "count": 1,
                        "indices": { "bufferView": 1, "byteOffset": 2, "componentType": 5123 },
                        "values": { "bufferView": 2 }
                    }
                }
            ]),
        );
        let overlaid = accessors.resolve(0, &views, None).unwrap();
        let values: Vec<f32> = (0..4).map(|i| overlaid.read_f32(i).unwrap()[0]).collect();
        assert_eq!(values, vec![1.0, 20.0, 3.0, 40.0]);
        assert_eq!(overlaid.count, 4);

        let zero_based = accessors.resolve(1, &views, None).unwrap();
        let values: Vec<f32> = (0..3).map(|i| zero_based.read_f32(i).unwrap()[0]).collect();
        assert_eq!(values, vec![0.0, 40.0, 0.0]);
    }
}
