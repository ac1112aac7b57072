use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde_json::Value;

use super::{objects_mut, sniff_image, uri_of};
use crate::keys;
use crate::uri::{self, UriKind};

/// Replaces every path uri of buffers and images by a base64 data uri.
#[derive(Debug, Clone)]
pub struct EmbedPass {
    base_dir: PathBuf,
    resource_root: Option<PathBuf>,
    errors: Vec<String>,
}

impl EmbedPass {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            resource_root: None,
            errors: Vec::new(),
        }
    }

    pub fn with_resource_root(mut self, resource_root: Option<&Path>) -> Self {
        self.resource_root = resource_root.map(Path::to_path_buf);
        self
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn embed_buffers(&mut self, root: &mut Value) {
        self.embed_in_array(root, keys::KEY_BUFFERS, false);
    }

    pub fn embed_images(&mut self, root: &mut Value) {
        self.embed_in_array(root, keys::KEY_IMAGES, true);
    }

    fn embed_in_array(&mut self, root: &mut Value, key: &str, images: bool) {
        for object in objects_mut(root, key) {
            let Some(path_uri) = uri_of(object)
                .filter(|u| uri::kind(u) == UriKind::Path)
                .map(str::to_owned)
            else {
                continue;
            };
            let data = match uri::fetch_data_with_root(
                &path_uri,
                &self.base_dir,
                self.resource_root.as_deref(),
            ) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Could not embed {}: {}", path_uri, e);
                    self.errors.push(e.to_string());
                    continue;
                }
            };
            let mime_type = if images {
                object
                    .get(keys::KEY_MIMETYPE)
                    .and_then(Value::as_str)
                    .map(str::to_owned)
                    .or_else(|| sniff_image(&data).map(|(mime, _)| mime.to_owned()))
            } else {
                None
            };
            let embedded = match mime_type {
                Some(mime) => uri::to_data_uri(&mime, &data),
                None => uri::to_base64_uri(&data),
            };
            debug!("Embedded {} ({} bytes)", path_uri, data.len());
            object.insert(keys::KEY_URI.to_owned(), Value::String(embedded));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embeds_files_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), b"Kuesa").unwrap();
        std::fs::write(dir.path().join("logo.png"), b"\x89PNG\r\n\x1a\n").unwrap();
        let mut root = json!({
            "buffers": [
                { "uri": "a.bin", "byteLength": 5 },
                { "uri": "missing.bin", "byteLength": 1 },
                { "uri": "data:application/octet-stream;base64,AA==", "byteLength": 1 }
            ],
            "images": [{ "uri": "logo.png" }]
        });
        let mut pass = EmbedPass::new(dir.path());
        pass.embed_buffers(&mut root);
        pass.embed_images(&mut root);

        assert_eq!(root["buffers"][0]["uri"], "data:application/octet-stream;base64,S3Vlc2E=");
        assert_eq!(root["buffers"][1]["uri"], "missing.bin");
        assert_eq!(root["buffers"][2]["uri"], "data:application/octet-stream;base64,AA==");
        assert!(root["images"][0]["uri"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
        assert_eq!(pass.errors().len(), 1);
        assert!(pass.errors()[0].contains("missing.bin"));
    }
}
