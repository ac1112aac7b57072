//! Writing a loaded document back out, optionally Draco compressed.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde_json::Value;

use crate::config::{Embed, ExportConfiguration};
use crate::context::GltfContext;
use crate::error::Result;
use crate::keys;
use crate::passes::{CopyPass, DracoPass, EmbedPass, SeparatePass};
use crate::uri;

/// Returns `name` if no file of that name exists in `dir`, else the first
/// free `base-N.ext` with N counting from 1.
pub fn generate_unique_filename(dir: &Path, name: &str) -> String {
    unique_filename_in(&[dir], name)
}

/// Like [`generate_unique_filename`], free in every directory of `dirs`.
pub fn unique_filename_in(dirs: &[&Path], name: &str) -> String {
    let (base, extension) = match name.split_once('.') {
        Some((base, extension)) => (base, Some(extension)),
        None => (name, None),
    };
    let taken = |candidate: &str| dirs.iter().any(|dir| dir.join(candidate).exists());
    let mut candidate = name.to_owned();
    let mut num = 1;
    while taken(&candidate) {
        candidate = match extension {
            Some(extension) => format!("{}-{}.{}", base, num, extension),
            None => format!("{}-{}", base, num),
        };
        num += 1;
    }
    candidate
}

/// Result of [`Exporter::save_in_folder`].
#[derive(Debug, Clone, Default)]
pub struct Export {
    json: Option<Value>,
    compressed_buffer_filename: Option<String>,
    errors: Vec<String>,
}

impl Export {
    fn failed(errors: Vec<String>) -> Self {
        Self {
            errors,
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.json.is_some() && self.errors.is_empty()
    }

    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    pub fn into_json(self) -> Option<Value> {
        self.json
    }

    pub fn compressed_buffer_filename(&self) -> Option<&str> {
        self.compressed_buffer_filename.as_deref()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Pretty prints the exported document to `path`.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.json.as_ref().unwrap_or(&Value::Null);
        let text = serde_json::to_string_pretty(json)?;
        fs::write(path, text)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Exporter {
    context: Option<GltfContext>,
    configuration: ExportConfiguration,
}

impl Exporter {
    pub fn new(configuration: ExportConfiguration) -> Self {
        Self {
            context: None,
            configuration,
        }
    }

    pub fn with_context(mut self, context: GltfContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn set_context(&mut self, context: GltfContext) {
        self.context = Some(context);
    }

    pub fn context(&self) -> Option<&GltfContext> {
        self.context.as_ref()
    }

    pub fn configuration(&self) -> &ExportConfiguration {
        &self.configuration
    }

    pub fn set_configuration(&mut self, configuration: ExportConfiguration) {
        self.configuration = configuration;
    }

    /// Files referenced by the document that already exist in `target`.
    pub fn overwritable_files(&self, target: &Path) -> Vec<PathBuf> {
        let Some(context) = &self.context else {
            return Vec::new();
        };
        context
            .local_files
            .iter()
            .filter(|file| !uri::is_resource_path(file))
            .map(|file| {
                let relative = file.strip_prefix(&context.base_dir).unwrap_or(file);
                target.join(relative)
            })
            .filter(|candidate| candidate.exists())
            .collect()
    }

    /// Writes the resources of the document from `source` into `target`
    /// and returns the rewritten JSON.
    ///
    /// The JSON itself is not written; use [`Export::write_json`].
    pub fn save_in_folder(&self, source: &Path, target: &Path) -> Export {
        let Some(context) = &self.context else {
            return Export::failed(vec!["Tried to save GLTF without a context".into()]);
        };
        let writable = fs::metadata(target)
            .map(|m| m.is_dir() && !m.permissions().readonly())
            .unwrap_or(false);
        if !writable {
            return Export::failed(vec![format!(
                "Cannot write to output directory {}",
                target.display()
            )]);
        }
        let mut root = context.json.clone();
        if root.as_object().map_or(true, |o| o.is_empty()) {
            return Export::failed(vec!["Nothing to save".into()]);
        }
        materialize_glb_buffers(&mut root, context);

        let mut errors = Vec::new();
        let mut compressed_buffer_filename = None;
        let mut copy = CopyPass::new(source, target);

        if self.configuration.mesh_compression_enabled() {
            let mut pass = DracoPass::new(context, &self.configuration, source, target);
            let compressed = pass.compress(root);
            errors.extend_from_slice(pass.errors());
            copy.add_generated_files(pass.generated_files().iter().cloned());
            compressed_buffer_filename = pass.compressed_buffer_filename().map(str::to_owned);
            root = match compressed {
                Some(root) => root,
                None => {
                    errors.push("Draco compression failed".into());
                    return Export::failed(errors);
                }
            };
        }

        match self.configuration.embedding() {
            Embed::Keep => {
                copy.copy_buffers(&root);
                copy.copy_images(&root);
                errors.extend_from_slice(copy.errors());
            }
            Embed::None => {
                let mut separate = SeparatePass::new(context.filename(), target);
                separate.separate_uris(&mut root);
                errors.extend_from_slice(separate.errors());
                copy.add_generated_files(separate.generated_files().iter().cloned());
                copy.copy_buffers(&root);
                copy.copy_images(&root);
                errors.extend_from_slice(copy.errors());
            }
            Embed::All => {
                let mut embed = EmbedPass::new(source)
                    .with_resource_root(context.options.resource_root.as_deref());
                embed.embed_buffers(&mut root);
                embed.embed_images(&mut root);
                errors.extend_from_slice(embed.errors());
            }
        }

        for error in &errors {
            warn!("{}", error);
        }
        info!("Exported {} into {}", context.filename().display(), target.display());
        Export {
            json: Some(root),
            compressed_buffer_filename,
            errors,
        }
    }
}

/// Gives the GLB BIN buffer a data uri so later passes can treat it like
/// any embedded buffer.
fn materialize_glb_buffers(root: &mut Value, context: &GltfContext) {
    let Some(buffers) = root.get_mut(keys::KEY_BUFFERS).and_then(Value::as_array_mut) else {
        return;
    };
    for (index, buffer) in buffers.iter_mut().enumerate() {
        let Some(object) = buffer.as_object_mut() else {
            continue;
        };
        if object.contains_key(keys::KEY_URI) {
            continue;
        }
        if let Some(data) = context.buffer_data(index) {
            object.insert(
                keys::KEY_URI.to_owned(),
                Value::String(uri::to_base64_uri(data)),
            );
        }
    }
}
