use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde_json::{Map, Value};

use super::{mime_extension, objects_mut, sniff_image, uri_of};
use crate::error::GltfError;
use crate::exporter::generate_unique_filename;
use crate::keys;
use crate::uri::{self, UriKind};

type Namer = fn(&str, &Map<String, Value>, &[u8], usize) -> String;

fn object_name<'a>(
    basename: &'a str,
    object: &'a Map<String, Value>,
    fallback: &'a str,
) -> &'a str {
    let name = match object.get(keys::KEY_NAME).and_then(Value::as_str) {
        Some(name) => name,
        None => basename,
    };
    if name.is_empty() {
        fallback
    } else {
        name
    }
}

fn buffer_namer(basename: &str, object: &Map<String, Value>, _data: &[u8], count: usize) -> String {
    format!("{}-{}.bin", object_name(basename, object, "buffer"), count)
}

fn image_namer(basename: &str, object: &Map<String, Value>, data: &[u8], count: usize) -> String {
    let extension = object
        .get(keys::KEY_MIMETYPE)
        .and_then(Value::as_str)
        .and_then(mime_extension)
        .or_else(|| sniff_image(data).map(|(_, ext)| ext))
        .unwrap_or("bin");
    format!("{}-{}.{}", object_name(basename, object, "image"), count, extension)
}

/// Writes data uris of buffers and images out as files next to the
/// exported document.
#[derive(Debug, Clone)]
pub struct SeparatePass {
    basename: String,
    destination: PathBuf,
    extracted_count: usize,
    generated: Vec<String>,
    errors: Vec<String>,
}

impl SeparatePass {
    /// `source_file` gives the fallback name of unnamed buffers and images.
    pub fn new(source_file: &Path, destination: impl Into<PathBuf>) -> Self {
        let basename = source_file
            .file_name()
            .and_then(|f| f.to_str())
            .and_then(|f| f.split('.').next())
            .unwrap_or_default()
            .to_owned();
        Self {
            basename,
            destination: destination.into(),
            extracted_count: 0,
            generated: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Relative names of the files written by this pass.
    pub fn generated_files(&self) -> &[String] {
        &self.generated
    }

    pub fn separate_uris(&mut self, root: &mut Value) {
        self.separate_in_array(root, keys::KEY_BUFFERS, buffer_namer);
        self.extracted_count = 0;
        self.separate_in_array(root, keys::KEY_IMAGES, image_namer);
    }

    fn separate_in_array(&mut self, root: &mut Value, key: &str, namer: Namer) {
        for object in objects_mut(root, key) {
            let Some(data_uri) = uri_of(object).filter(|u| uri::kind(u) == UriKind::Data) else {
                continue;
            };
            let data = match uri::parse_embedded_data(data_uri) {
                Ok(data) => data,
                Err(e) => {
                    self.errors.push(e.to_string());
                    continue;
                }
            };
            let name = namer(&self.basename, object, &data, self.extracted_count);
            let file = generate_unique_filename(&self.destination, &name);
            let path = self.destination.join(&file);
            if let Err(e) = fs::write(&path, &data) {
                warn!("Failed to write {}: {}", path.display(), e);
                self.errors
                    .push(GltfError::CannotCreate(path.display().to_string()).to_string());
                continue;
            }
            debug!("Separated {} bytes into {}", data.len(), file);
            object.insert(keys::KEY_URI.to_owned(), Value::String(file.clone()));
            self.generated.push(file);
            self.extracted_count += 1;
        }
    }
}
