//! Buffers and the bufferView table.

use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::error::{GltfError, Result};
use crate::keys;
use crate::schema::{RawBuffer, RawBufferView};
use crate::uri;

/// GLB BIN chunks are padded to 4 bytes.
const MAX_GLB_PADDING: usize = 3;

/// Loaded payload of one `buffers` entry.
#[derive(Debug, Clone)]
pub struct Buffer {
    pub uri: Option<String>,
    pub name: Option<String>,
    pub data: Arc<[u8]>,
}

impl Buffer {
    pub fn byte_length(&self) -> usize {
        self.data.len()
    }
}

/// Loads every buffer. A buffer without uri is the GLB BIN chunk and may
/// only appear first.
pub(crate) fn parse_buffers(
    raw: &[RawBuffer],
    base_dir: &Path,
    glb_bin: Option<&[u8]>,
    resource_root: Option<&Path>,
) -> Result<Vec<Buffer>> {
    let mut buffers = Vec::with_capacity(raw.len());
    for (i, buffer) in raw.iter().enumerate() {
        let data = match (&buffer.uri, glb_bin) {
            (Some(uri), _) => {
                let data = uri::fetch_data_with_root(uri, base_dir, resource_root)?;
                if data.len() != buffer.byte_length {
                    return Err(GltfError::InvalidGltf(format!(
                        "buffer {} declares {} bytes but holds {}",
                        i,
                        buffer.byte_length,
                        data.len()
                    )));
                }
                data
            }
            (None, Some(bin)) if i == 0 => {
                if bin.len() < buffer.byte_length
                    || bin.len() - buffer.byte_length > MAX_GLB_PADDING
                {
                    return Err(GltfError::InvalidGlb(format!(
                        "BIN chunk holds {} bytes, buffer 0 declares {}",
                        bin.len(),
                        buffer.byte_length
                    )));
                }
                bin[..buffer.byte_length].to_vec()
            }
            (None, _) => {
                return Err(GltfError::InvalidGltf(format!("buffer {} has no uri", i)));
            }
        };
        debug!("Loaded buffer {} ({} bytes)", i, data.len());
        buffers.push(Buffer {
            uri: buffer.uri.clone(),
            name: buffer.name.clone(),
            data: data.into(),
        });
    }
    Ok(buffers)
}

/// A byte range of a buffer.
///
/// `data` is exactly `[byte_offset, byte_offset + byte_length)` of buffer
/// `buffer_index`.
#[derive(Debug, Clone)]
pub struct BufferView {
    pub buffer_index: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    /// 0 when tightly packed.
    pub byte_stride: usize,
    pub data: Arc<[u8]>,
    pub name: Option<String>,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BufferViewTable {
    views: Vec<BufferView>,
}

impl BufferViewTable {
    pub(crate) fn parse(raw: &[RawBufferView], buffers: &[Buffer]) -> Result<Self> {
        let mut views = Vec::with_capacity(raw.len());
        for (i, view) in raw.iter().enumerate() {
            let buffer = buffers
                .get(view.buffer)
                .ok_or_else(|| GltfError::reference("buffer", view.buffer))?;
            let end = view
                .byte_offset
                .checked_add(view.byte_length)
                .filter(|&end| end <= buffer.data.len())
                .ok_or_else(|| {
                    GltfError::InvalidGltf(format!(
                        "bufferView {} exceeds buffer {} ({} bytes)",
                        i,
                        view.buffer,
                        buffer.data.len()
                    ))
                })?;
            views.push(BufferView {
                buffer_index: view.buffer,
                byte_offset: view.byte_offset,
                byte_length: view.byte_length,
                byte_stride: view.byte_stride,
                data: Arc::from(&buffer.data[view.byte_offset..end]),
                name: view.name.clone(),
                key: keys::asset_key(view.extensions.as_ref()),
            });
        }
        Ok(Self { views })
    }

    /// Returns bufferView `id`, failing when it does not exist or has no
    /// bytes.
    pub fn resolve(&self, id: usize) -> Result<&BufferView> {
        match self.views.get(id) {
            Some(view) if !view.data.is_empty() => Ok(view),
            _ => Err(GltfError::reference("bufferView", id)),
        }
    }

    pub fn get(&self, id: usize) -> Option<&BufferView> {
        self.views.get(id)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BufferView> {
        self.views.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_views(value: serde_json::Value) -> Vec<RawBufferView> {
        serde_json::from_value(value).unwrap()
    }

    fn buffer(data: Vec<u8>) -> Buffer {
        Buffer {
            uri: None,
            name: None,
            data: data.into(),
        }
    }

    #[test]
    fn test_slicing() {
        let buffers = vec![buffer((0u8..32).collect())];
        let table = BufferViewTable::parse(
            &raw_views(json!([
                { "buffer": 0, "byteOffset": 4, "byteLength": 8, "byteStride": 4,
                  "extensions": { "KDAB_asset_key": { "key": "v0" } } },
                { "buffer": 0, "byteLength": 2 }
            ])),
            &buffers,
        )
        .unwrap();
        let view = table.resolve(0).unwrap();
        assert_eq!(&view.data[..], &[4, 5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(view.byte_stride, 4);
        assert_eq!(view.key.as_deref(), Some("v0"));
        assert_eq!(&table.resolve(1).unwrap().data[..], &[0, 1]);
        assert!(matches!(
            table.resolve(2),
            Err(GltfError::InvalidReference { kind: "bufferView", index: 2 })
        ));
    }

    #[test]
    fn test_invalid_views() {
        let buffers = vec![buffer(vec![0; 8])];
        let missing_buffer = BufferViewTable::parse(
            &raw_views(json!([{ "buffer": 1, "byteLength": 2 }])),
            &buffers,
        );
        assert!(matches!(
            missing_buffer,
            Err(GltfError::InvalidReference { kind: "buffer", index: 1 })
        ));
        let overflow = BufferViewTable::parse(
            &raw_views(json!([{ "buffer": 0, "byteOffset": 6, "byteLength": 4 }])),
            &buffers,
        );
        assert!(matches!(overflow, Err(GltfError::InvalidGltf(_))));

        let empty = vec![buffer(Vec::new())];
        let table = BufferViewTable::parse(
            &raw_views(json!([{ "buffer": 0, "byteLength": 0 }])),
            &empty,
        )
        .unwrap();
        assert!(table.resolve(0).is_err());
    }

    #[test]
    fn test_parse_buffers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.bin"), [1u8, 2, 3]).unwrap();
        let raw: Vec<RawBuffer> = serde_json::from_value(json!([
            { "uri": "data.bin", "byteLength": 3 },
            { "uri": "data:application/octet-stream;base64,S3Vlc2E=", "byteLength": 5 }
        ]))
        .unwrap();
        let buffers = parse_buffers(&raw, dir.path(), None, None).unwrap();
        assert_eq!(&buffers[0].data[..], &[1, 2, 3]);
        assert_eq!(&buffers[1].data[..], b"Kuesa");

        let wrong_length: Vec<RawBuffer> =
            serde_json::from_value(json!([{ "uri": "data.bin", "byteLength": 4 }])).unwrap();
        assert!(parse_buffers(&wrong_length, dir.path(), None, None).is_err());
    }

    #[test]
    fn test_glb_bin_chunk() {
        let raw: Vec<RawBuffer> = serde_json::from_value(json!([{ "byteLength": 5 }])).unwrap();
        let bin = [1u8, 2, 3, 4, 5, 0, 0, 0];
        let buffers = parse_buffers(&raw, Path::new("."), Some(&bin), None).unwrap();
        assert_eq!(&buffers[0].data[..], &[1, 2, 3, 4, 5]);
        assert!(matches!(
            parse_buffers(&raw, Path::new("."), Some(&[0u8; 9]), None),
            Err(GltfError::InvalidGlb(_))
        ));
        assert!(matches!(
            parse_buffers(&raw, Path::new("."), None, None),
            Err(GltfError::InvalidGltf(_))
        ));
    }
}
