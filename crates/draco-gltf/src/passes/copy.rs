use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde_json::Value;

use super::{objects, uri_of};
use crate::error::GltfError;
use crate::keys;
use crate::uri::{self, UriKind};

/// Copies files referenced by path uris from the source tree into the
/// destination tree.
#[derive(Debug, Clone)]
pub struct CopyPass {
    source: PathBuf,
    destination: PathBuf,
    generated: Vec<String>,
    errors: Vec<String>,
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

impl CopyPass {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            generated: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Files already written into the destination by earlier passes.
    pub fn add_generated_files<I, S>(&mut self, files: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generated.extend(files.into_iter().map(Into::into));
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn copy_buffers(&mut self, root: &Value) {
        self.copy_uris(root, keys::KEY_BUFFERS);
    }

    pub fn copy_images(&mut self, root: &Value) {
        self.copy_uris(root, keys::KEY_IMAGES);
    }

    fn copy_uris(&mut self, root: &Value, key: &str) {
        if same_directory(&self.source, &self.destination) {
            return;
        }
        for object in objects(root, key) {
            let Some(path_uri) = uri_of(object).filter(|u| uri::kind(u) == UriKind::Path) else {
                continue;
            };
            if self.generated.iter().any(|g| g == path_uri) {
                continue;
            }
            let source = uri::local_file(path_uri, &self.source);
            if uri::is_resource_path(&source) {
                continue;
            }
            let destination = uri::local_file(path_uri, &self.destination);
            if let Err(e) = copy_file(&source, &destination, path_uri) {
                warn!("{}", e);
                self.errors.push(e.to_string());
            }
        }
    }
}

fn copy_file(source: &Path, destination: &Path, uri: &str) -> Result<(), GltfError> {
    if source == destination {
        return Ok(());
    }
    if !source.is_file() {
        return Err(GltfError::MissingSource(uri.to_owned()));
    }
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|_| GltfError::CopyFailed(uri.to_owned()))?;
    }
    if destination.exists() && fs::remove_file(destination).is_err() {
        return Err(GltfError::CopyFailed(format!(
            "{}: unable to overwrite old file {}",
            uri,
            destination.display()
        )));
    }
    fs::copy(source, destination).map_err(|_| GltfError::CopyFailed(uri.to_owned()))?;
    debug!("Copied {} to {}", source.display(), destination.display());
    Ok(())
}
