//! Images, samplers and textures.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::buffers::BufferViewTable;
use crate::error::{GltfError, Result};
use crate::keys;
use crate::schema::{RawImage, RawSampler, RawTexture};
use crate::uri::{self, UriKind};

const WRAP_REPEAT: u32 = 10497;
const WRAP_MODES: [u32; 3] = [33071, 33648, WRAP_REPEAT];
const MAG_FILTERS: [u32; 2] = [9728, 9729];
const MIN_FILTERS: [u32; 6] = [9728, 9729, 9984, 9985, 9986, 9987];

#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Path of an image file, resolved against the document directory.
    File(PathBuf),
    /// Bytes decoded from a data URI.
    Embedded(Arc<[u8]>),
    BufferView(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub name: Option<String>,
    pub mime_type: Option<String>,
    pub source: ImageSource,
    pub key: Option<String>,
}

impl Image {
    /// Bytes of an embedded or bufferView image. File images are not read.
    pub fn embedded_data<'a>(&'a self, views: &'a BufferViewTable) -> Result<Option<&'a [u8]>> {
        match &self.source {
            ImageSource::File(_) => Ok(None),
            ImageSource::Embedded(data) => Ok(Some(data)),
            ImageSource::BufferView(id) => Ok(Some(&views.resolve(*id)?.data)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSampler {
    pub mag_filter: Option<u32>,
    pub min_filter: Option<u32>,
    pub wrap_s: u32,
    pub wrap_t: u32,
}

impl Default for TextureSampler {
    fn default() -> Self {
        Self {
            mag_filter: None,
            min_filter: None,
            wrap_s: WRAP_REPEAT,
            wrap_t: WRAP_REPEAT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub name: Option<String>,
    pub image: Option<usize>,
    pub sampler: Option<usize>,
    pub key: Option<String>,
}

/// Loads image records. Local files referenced by images are appended to
/// `local_files`.
pub(crate) fn parse_images(
    raw: &[RawImage],
    base_dir: &Path,
    views: &BufferViewTable,
    resource_root: Option<&Path>,
    local_files: &mut Vec<PathBuf>,
) -> Result<Vec<Image>> {
    let mut images = Vec::with_capacity(raw.len());
    for (i, image) in raw.iter().enumerate() {
        let source = match (&image.uri, image.buffer_view) {
            (Some(uri), _) => match uri::kind(uri) {
                UriKind::Data => ImageSource::Embedded(uri::parse_embedded_data(uri)?.into()),
                UriKind::Path => {
                    let path =
                        uri::resolve_resource(&uri::local_file(uri, base_dir), resource_root);
                    local_files.push(path.clone());
                    ImageSource::File(path)
                }
            },
            (None, Some(view)) => {
                views.resolve(view)?;
                if image.mime_type.is_none() {
                    return Err(GltfError::InvalidGltf(format!(
                        "image {} uses a bufferView without mimeType",
                        i
                    )));
                }
                ImageSource::BufferView(view)
            }
            (None, None) => {
                return Err(GltfError::InvalidGltf(format!("image {} has no source", i)));
            }
        };
        images.push(Image {
            name: image.name.clone(),
            mime_type: image.mime_type.clone(),
            source,
            key: keys::asset_key(image.extensions.as_ref()),
        });
    }
    debug!("Parsed {} images", images.len());
    Ok(images)
}

fn check_enum(value: Option<u32>, allowed: &[u32], what: &str, index: usize) -> Result<()> {
    match value {
        Some(v) if !allowed.contains(&v) => Err(GltfError::InvalidGltf(format!(
            "sampler {} has invalid {} {}",
            index, what, v
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn parse_samplers(raw: &[RawSampler]) -> Result<Vec<TextureSampler>> {
    raw.iter()
        .enumerate()
        .map(|(i, sampler)| {
            check_enum(sampler.mag_filter, &MAG_FILTERS, "magFilter", i)?;
            check_enum(sampler.min_filter, &MIN_FILTERS, "minFilter", i)?;
            check_enum(sampler.wrap_s, &WRAP_MODES, "wrapS", i)?;
            check_enum(sampler.wrap_t, &WRAP_MODES, "wrapT", i)?;
            Ok(TextureSampler {
                mag_filter: sampler.mag_filter,
                min_filter: sampler.min_filter,
                wrap_s: sampler.wrap_s.unwrap_or(WRAP_REPEAT),
                wrap_t: sampler.wrap_t.unwrap_or(WRAP_REPEAT),
            })
        })
        .collect()
}

pub(crate) fn parse_textures(
    raw: &[RawTexture],
    images: &[Image],
    samplers: &[TextureSampler],
) -> Result<Vec<Texture>> {
    raw.iter()
        .map(|texture| {
            if let Some(image) = texture.source.filter(|&s| s >= images.len()) {
                return Err(GltfError::reference("image", image));
            }
            if let Some(sampler) = texture.sampler.filter(|&s| s >= samplers.len()) {
                return Err(GltfError::reference("sampler", sampler));
            }
            Ok(Texture {
                name: texture.name.clone(),
                image: texture.source,
                sampler: texture.sampler,
                key: keys::asset_key(texture.extensions.as_ref()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_images() {
        let raw: Vec<RawImage> = serde_json::from_value(json!([
            { "uri": "textures/wood%20grain.png" },
            {
                "uri": "data:image/png;base64,AAEC",
                "extensions": { "KDAB_asset_key": { "key": "logo" } }
            },
            { "bufferView": 0 }
        ]))
        .unwrap();
        let mut local_files = Vec::new();
        let base = Path::new("/scenes");
        let views = BufferViewTable::default();
        let images = parse_images(&raw[..2], base, &views, None, &mut local_files).unwrap();
        assert_eq!(
            images[0].source,
            ImageSource::File(PathBuf::from("/scenes/textures/wood grain.png"))
        );
        assert_eq!(local_files, vec![PathBuf::from("/scenes/textures/wood grain.png")]);
        assert_eq!(images[1].key.as_deref(), Some("logo"));
        assert_eq!(images[1].embedded_data(&views).unwrap(), Some(&[0u8, 1, 2][..]));

        assert!(parse_images(&raw[2..], base, &views, None, &mut local_files).is_err());
    }

    #[test]
    fn test_samplers_and_textures() {
        let raw_samplers: Vec<RawSampler> =
            serde_json::from_value(json!([{ "magFilter": 9729, "wrapS": 33071 }, {}])).unwrap();
        let samplers = parse_samplers(&raw_samplers).unwrap();
        assert_eq!(samplers[0].wrap_s, 33071);
        assert_eq!(samplers[0].wrap_t, WRAP_REPEAT);
        assert_eq!(samplers[1], TextureSampler::default());

        let bad: Vec<RawSampler> = serde_json::from_value(json!([{ "minFilter": 1 }])).unwrap();
        assert!(parse_samplers(&bad).is_err());

        let raw_textures: Vec<RawTexture> =
            serde_json::from_value(json!([{ "sampler": 1 }, { "source": 0 }])).unwrap();
        let textures = parse_textures(&raw_textures[..1], &[], &samplers).unwrap();
        assert_eq!(textures[0].sampler, Some(1));
        assert!(matches!(
            parse_textures(&raw_textures[1..], &[], &samplers),
            Err(GltfError::InvalidReference { kind: "image", index: 0 })
        ));
    }
}
