use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use draco_gltf::{Embed, ExportConfiguration, Exporter, GltfContext, GltfImporter, MeshAttribute};
use log::{info, warn};

use crate::error::{Result, ToolError};

/// Compression settings gathered from the command line.
#[derive(Debug, Clone, Default)]
pub struct CompressSettings {
    pub config: Option<PathBuf>,
    pub encoding_speed: Option<i32>,
    pub decoding_speed: Option<i32>,
    pub quantize: Vec<(MeshAttribute, i32)>,
    pub embed: Option<Embed>,
}

impl CompressSettings {
    /// Flags override the configuration file.
    pub fn configuration(&self) -> Result<ExportConfiguration> {
        let mut configuration = match &self.config {
            Some(path) => ExportConfiguration::from_json_file(path)?,
            None => ExportConfiguration::new(),
        };
        configuration.set_mesh_compression_enabled(true);
        if let Some(speed) = self.encoding_speed {
            configuration.set_mesh_encoding_speed(speed);
        }
        if let Some(speed) = self.decoding_speed {
            configuration.set_mesh_decoding_speed(speed);
        }
        for &(attribute, level) in &self.quantize {
            configuration.set_attribute_quantization_level(attribute, level);
        }
        if let Some(embed) = self.embed {
            configuration.set_embedding(embed);
        }
        Ok(configuration)
    }
}

/// Parses `CLASS=LEVEL`, e.g. `position=11` or `texcoord=10`.
pub fn parse_quantize(arg: &str) -> std::result::Result<(MeshAttribute, i32), String> {
    let (class, level) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected CLASS=LEVEL, got `{}`", arg))?;
    let attribute = match class.trim().to_ascii_lowercase().as_str() {
        "position" => MeshAttribute::Position,
        "normal" => MeshAttribute::Normal,
        "color" => MeshAttribute::Color,
        "texcoord" | "texturecoordinate" => MeshAttribute::TextureCoordinate,
        "generic" => MeshAttribute::Generic,
        other => return Err(format!("unknown attribute class `{}`", other)),
    };
    let level = level
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid level `{}`: {}", level, e))?;
    if !(0..=10).contains(&level) {
        return Err(format!("level {} is outside 0..=10", level));
    }
    Ok((attribute, level))
}

/// Name of the exported document: the input stem with a `.gltf` extension.
pub fn output_filename(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "scene".into());
    let mut name = PathBuf::from(stem);
    name.set_extension("gltf");
    name
}

/// Imports `input`, exports it into `output_dir` and writes the JSON there.
pub fn export(
    input: &Path,
    output_dir: &Path,
    configuration: ExportConfiguration,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).map_err(|source| ToolError::OutputDirectory {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let context = GltfImporter::default().load(input)?;
    let source = context.base_dir().to_path_buf();
    let exporter = Exporter::new(configuration).with_context(context);
    for file in exporter.overwritable_files(output_dir) {
        warn!("Overwriting {}", file.display());
    }

    let export = exporter.save_in_folder(&source, output_dir);
    let destination = output_dir.join(output_filename(input));
    if export.json().is_some() {
        export.write_json(&destination)?;
        info!("Wrote {}", destination.display());
    }
    if !export.success() {
        return Err(ToolError::Export(export.errors().to_vec()));
    }
    if let Some(name) = export.compressed_buffer_filename() {
        info!("Compressed meshes stored in {}", name);
    }
    Ok(destination)
}

pub fn compress(input: &Path, output_dir: &Path, settings: &CompressSettings) -> Result<PathBuf> {
    export(input, output_dir, settings.configuration()?)
}

/// Re-exports without compression, every resource embedded or separated.
pub fn repackage(input: &Path, output_dir: &Path, embedding: Embed) -> Result<PathBuf> {
    let mut configuration = ExportConfiguration::new();
    configuration.set_embedding(embedding);
    export(input, output_dir, configuration)
}

pub fn inspect(input: &Path, out: &mut dyn Write) -> Result<()> {
    let context = GltfImporter::default().load(input)?;
    write_summary(&context, out).map_err(draco_gltf::GltfError::from)?;
    Ok(())
}

fn write_summary(context: &GltfContext, out: &mut dyn Write) -> io::Result<()> {
    writeln!(
        out,
        "{}: {} buffers, {} bufferViews, {} accessors, {} images, {} textures, {} meshes",
        context.filename().display(),
        context.buffers.len(),
        context.buffer_views.len(),
        context.accessors.len(),
        context.images.len(),
        context.textures.len(),
        context.meshes.len()
    )?;
    for (m, mesh) in context.meshes.iter().enumerate() {
        writeln!(
            out,
            "mesh {} {:?}: {} primitives, {} morph targets",
            m,
            mesh.name.as_deref().unwrap_or(""),
            mesh.primitives.len(),
            mesh.morph_target_count
        )?;
        for (p, primitive) in mesh.primitives.iter().enumerate() {
            writeln!(
                out,
                "  primitive {}: {:?}, {} vertices, draco: {}",
                p,
                primitive.primitive_type,
                primitive.geometry.vertex_count(),
                if primitive.is_draco_compressed { "yes" } else { "no" }
            )?;
            for info in &primitive.attribute_info {
                let Some(attribute) = primitive.geometry.attribute_by_name(&info.name) else {
                    continue;
                };
                writeln!(
                    out,
                    "    {} -> {} {:?}x{} count {}{}",
                    info.semantic,
                    info.name,
                    attribute.base_type,
                    attribute.vertex_size,
                    attribute.count,
                    info.draco_id.map(|id| format!(" (draco id {})", id)).unwrap_or_default()
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantize() {
        assert_eq!(parse_quantize("position=10"), Ok((MeshAttribute::Position, 10)));
        assert_eq!(parse_quantize("TexCoord = 8"), Ok((MeshAttribute::TextureCoordinate, 8)));
        assert!(parse_quantize("position").is_err());
        assert!(parse_quantize("weights=3").is_err());
        assert!(parse_quantize("normal=11").is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.json");
        fs::write(
            &path,
            r#"{ "encodingSpeed": 3, "decodingSpeed": 4, "embedding": "all",
                 "quantization": { "position": 7 } }"#,
        )
        .unwrap();
        let settings = CompressSettings {
            config: Some(path),
            encoding_speed: Some(9),
            quantize: vec![(MeshAttribute::Normal, 5)],
            ..CompressSettings::default()
        };
        let configuration = settings.configuration().unwrap();
        assert!(configuration.mesh_compression_enabled());
        assert_eq!(configuration.mesh_encoding_speed(), 9);
        assert_eq!(configuration.mesh_decoding_speed(), 4);
        assert_eq!(configuration.embedding(), Embed::All);
        assert_eq!(configuration.attribute_quantization_level(MeshAttribute::Position), 7);
        assert_eq!(configuration.attribute_quantization_level(MeshAttribute::Normal), 5);
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(output_filename(Path::new("in/scene.glb")), PathBuf::from("scene.gltf"));
        assert_eq!(output_filename(Path::new("model.gltf")), PathBuf::from("model.gltf"));
    }
}
