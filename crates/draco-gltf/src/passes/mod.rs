//! Rewriting passes applied to the JSON tree by the exporter.

mod copy;
mod draco;
mod embed;
mod separate;

pub use copy::CopyPass;
pub use draco::{map_buffer_offset, remap_index, splice_ranges, subtract_ranges, DracoPass};
pub use embed::EmbedPass;
pub use separate::SeparatePass;

use serde_json::Value;

use crate::keys;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// File extension for a known image media type.
pub(crate) fn mime_extension(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "image/jpeg" => Some("jpeg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// Media type and extension guessed from the leading bytes.
pub(crate) fn sniff_image(data: &[u8]) -> Option<(&'static str, &'static str)> {
    if data.starts_with(PNG_MAGIC) {
        Some(("image/png", "png"))
    } else if data.starts_with(JPEG_MAGIC) {
        Some(("image/jpeg", "jpeg"))
    } else {
        None
    }
}

/// Objects of a top level array such as `buffers` or `images`.
pub(crate) fn objects<'a>(
    root: &'a Value,
    key: &str,
) -> impl Iterator<Item = &'a serde_json::Map<String, Value>> {
    root.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

pub(crate) fn objects_mut<'a>(
    root: &'a mut Value,
    key: &str,
) -> impl Iterator<Item = &'a mut serde_json::Map<String, Value>> {
    root.get_mut(key)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object_mut)
}

pub(crate) fn uri_of(object: &serde_json::Map<String, Value>) -> Option<&str> {
    object.get(keys::KEY_URI).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_types() {
        assert_eq!(mime_extension("image/png"), Some("png"));
        assert_eq!(mime_extension("image/ktx2"), None);
        assert_eq!(sniff_image(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(("image/jpeg", "jpeg")));
        assert_eq!(sniff_image(b"\x89PNG\r\n\x1a\n...."), Some(("image/png", "png")));
        assert_eq!(sniff_image(b"GIF89a"), None);
    }

    #[test]
    fn test_objects_mut() {
        let mut root = json!({ "buffers": [{ "uri": "a.bin" }, 3, { "byteLength": 1 }] });
        let uris: Vec<Option<String>> = objects_mut(&mut root, "buffers")
            .map(|o| uri_of(o).map(str::to_owned))
            .collect();
        assert_eq!(uris, vec![Some("a.bin".to_string()), None]);
        assert_eq!(objects_mut(&mut root, "images").count(), 0);
    }
}
