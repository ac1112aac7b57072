//! GLB container parsing.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{GltfError, Result};

const GLB_MAGIC: u32 = 0x46546C67; // "glTF"
const GLB_VERSION: u32 = 2;
const GLB_CHUNK_JSON: u32 = 0x4E4F534A; // "JSON"
const GLB_CHUNK_BIN: u32 = 0x004E4942; // "BIN\0"
const HEADER_SIZE: usize = 12;
const CHUNK_HEADER_SIZE: usize = 8;

/// The JSON and BIN chunks of a GLB file.
#[derive(Debug, Clone, Copy)]
pub struct GlbChunks<'a> {
    pub json: &'a [u8],
    pub bin: Option<&'a [u8]>,
}

pub fn is_glb(data: &[u8]) -> bool {
    data.len() >= 4 && LittleEndian::read_u32(&data[0..4]) == GLB_MAGIC
}

/// Splits a GLB file into its chunks. Unknown chunk types are ignored.
pub fn parse_glb(data: &[u8]) -> Result<GlbChunks<'_>> {
    if data.len() < HEADER_SIZE {
        return Err(GltfError::InvalidGlb("File too small for GLB header".into()));
    }
    if !is_glb(data) {
        return Err(GltfError::InvalidGlb("Invalid GLB magic".into()));
    }
    let version = LittleEndian::read_u32(&data[4..8]);
    if version != GLB_VERSION {
        return Err(GltfError::InvalidGlb(format!("Unsupported GLB version: {}", version)));
    }
    let length = LittleEndian::read_u32(&data[8..12]) as usize;
    if length > data.len() {
        return Err(GltfError::InvalidGlb(format!(
            "Header declares {} bytes, file holds {}",
            length,
            data.len()
        )));
    }

    let mut json = None;
    let mut bin = None;
    let mut offset = HEADER_SIZE;
    while offset + CHUNK_HEADER_SIZE <= length {
        let chunk_length = LittleEndian::read_u32(&data[offset..offset + 4]) as usize;
        let chunk_type = LittleEndian::read_u32(&data[offset + 4..offset + 8]);
        offset += CHUNK_HEADER_SIZE;
        let end = offset
            .checked_add(chunk_length)
            .filter(|&end| end <= length)
            .ok_or_else(|| GltfError::InvalidGlb("Chunk exceeds file length".into()))?;
        let chunk = &data[offset..end];
        match chunk_type {
            GLB_CHUNK_JSON if json.is_none() => json = Some(chunk),
            GLB_CHUNK_BIN if bin.is_none() => bin = Some(chunk),
            _ => {}
        }
        offset = end;
    }

    let json = json.ok_or_else(|| GltfError::InvalidGlb("No JSON chunk".into()))?;
    Ok(GlbChunks { json, bin })
}

#[cfg(test)]
pub(crate) fn build_glb(json: &[u8], bin: Option<&[u8]>) -> Vec<u8> {
    fn chunk(out: &mut Vec<u8>, kind: u32, data: &[u8], pad: u8) {
        let padded = (data.len() + 3) & !3;
        out.extend_from_slice(&(padded as u32).to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(data);
        out.resize(out.len() + padded - data.len(), pad);
    }
    let mut body = Vec::new();
    chunk(&mut body, GLB_CHUNK_JSON, json, b' ');
    if let Some(bin) = bin {
        chunk(&mut body, GLB_CHUNK_BIN, bin, 0);
    }
    let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&((HEADER_SIZE + body.len()) as u32).to_le_bytes());
    out.extend_from_slice(&body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks() {
        let data = build_glb(br#"{"a":1}"#, Some(&[1, 2, 3, 4, 5]));
        assert!(is_glb(&data));
        let chunks = parse_glb(&data).unwrap();
        assert_eq!(chunks.json, br#"{"a":1} "#.as_slice());
        assert_eq!(chunks.bin, Some([1u8, 2, 3, 4, 5, 0, 0, 0].as_slice()));
    }

    #[test]
    fn test_invalid_headers() {
        assert!(!is_glb(b"{}"));
        assert!(parse_glb(b"glTF").is_err());

        let mut wrong_version = build_glb(b"{}", None);
        wrong_version[4] = 1;
        assert!(matches!(parse_glb(&wrong_version), Err(GltfError::InvalidGlb(_))));

        let mut truncated = build_glb(b"{}", None);
        truncated.truncate(truncated.len() - 2);
        assert!(parse_glb(&truncated).is_err());

        let mut no_json = build_glb(b"{}", None);
        no_json[16] = b'X';
        assert!(matches!(parse_glb(&no_json), Err(GltfError::InvalidGlb(_))));
    }
}
