//! Draco recompression of a document.
//!
//! Every primitive without a `KHR_draco_mesh_compression` extension is
//! encoded into one new buffer. The accessors whose data moved into that
//! buffer lose their `bufferView`, orphaned bufferViews are removed with
//! every reference renumbered, and the byte ranges they covered are
//! spliced out of their buffers.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::{Embed, ExportConfiguration};
use crate::context::GltfContext;
use crate::draco_bridge::{self, CompressedMesh};
use crate::error::Result;
use crate::exporter::unique_filename_in;
use crate::keys::*;
use crate::mesh_parser::MeshParser;
use crate::schema::RawPrimitive;
use crate::uri::{self, UriKind};

const COMPRESSED_BUFFER_NAME: &str = "compressedBuffer.bin";
const BLOB_ALIGNMENT: usize = 4;

/// Removes `(offset, length)` ranges from `data`, highest offset first.
pub fn splice_ranges(data: &mut Vec<u8>, ranges: &[(usize, usize)]) {
    let mut sorted = ranges.to_vec();
    sorted.sort_unstable_by(|a, b| b.0.cmp(&a.0));
    for (offset, length) in sorted {
        let end = offset.saturating_add(length).min(data.len());
        if offset < end {
            data.drain(offset..end);
        }
    }
}

/// New position of `offset` once `ranges` have been spliced out.
pub fn map_buffer_offset(offset: usize, ranges: &[(usize, usize)]) -> usize {
    let removed: usize = ranges
        .iter()
        .filter(|(o, _)| *o < offset)
        .map(|(_, l)| *l)
        .sum();
    offset.saturating_sub(removed)
}

/// New index of `old` once the indices in `removed` have been erased.
pub fn remap_index(old: usize, removed: &BTreeSet<usize>) -> usize {
    old - removed.range(..old).count()
}

/// `(offset, length)` ranges covered by `removed` and by none of `keep`,
/// merged and sorted by offset.
pub fn subtract_ranges(removed: &[(usize, usize)], keep: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut intervals: Vec<(usize, usize)> = removed
        .iter()
        .filter(|(_, l)| *l > 0)
        .map(|&(o, l)| (o, o + l))
        .collect();
    intervals.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }

    for &(offset, length) in keep.iter().filter(|(_, l)| *l > 0) {
        let (keep_start, keep_end) = (offset, offset + length);
        merged = merged
            .into_iter()
            .flat_map(|(start, end)| {
                let mut parts = Vec::with_capacity(2);
                if start < keep_start.min(end) {
                    parts.push((start, keep_start.min(end)));
                }
                if keep_end.max(start) < end {
                    parts.push((keep_end.max(start), end));
                }
                parts
            })
            .collect();
    }
    merged.into_iter().map(|(s, e)| (s, e - s)).collect()
}

fn as_index(value: &Value) -> Option<usize> {
    value.as_u64().map(|n| n as usize)
}

fn array<'a>(root: &'a Value, key: &str) -> &'a [Value] {
    root.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn array_mut<'a>(root: &'a mut Value, key: &str) -> Option<&'a mut Vec<Value>> {
    root.get_mut(key).and_then(Value::as_array_mut)
}

/// Appends to `root[key]`, creating the array when needed.
fn push_to_array(root: &mut Value, key: &str, value: Value) -> usize {
    if !root.get(key).map_or(false, Value::is_array) {
        root[key] = Value::Array(Vec::new());
    }
    match array_mut(root, key) {
        Some(values) => {
            values.push(value);
            values.len() - 1
        }
        None => 0,
    }
}

fn remap_field(object: &mut Value, key: &str, map: impl Fn(usize) -> usize) {
    if let Some(old) = object.get(key).and_then(as_index) {
        object[key] = json!(map(old));
    }
}

fn draco_extension_mut(primitive: &mut Value) -> Option<&mut Value> {
    primitive
        .get_mut(KEY_EXTENSIONS)?
        .get_mut(KEY_KHR_DRACO_MESH_COMPRESSION_EXTENSION)
}

fn primitives(root: &Value) -> impl Iterator<Item = (usize, usize, &Value)> {
    array(root, KEY_MESHES).iter().enumerate().flat_map(|(m, mesh)| {
        array(mesh, KEY_PRIMITIVES)
            .iter()
            .enumerate()
            .map(move |(p, primitive)| (m, p, primitive))
    })
}

fn primitives_mut(root: &mut Value) -> impl Iterator<Item = &mut Value> {
    array_mut(root, KEY_MESHES)
        .into_iter()
        .flatten()
        .filter_map(|mesh| array_mut(mesh, KEY_PRIMITIVES))
        .flatten()
}

fn add_extension_name(root: &mut Value, key: &str) {
    let present = array(root, key)
        .iter()
        .any(|e| e.as_str() == Some(KEY_KHR_DRACO_MESH_COMPRESSION_EXTENSION));
    if !present {
        push_to_array(root, key, json!(KEY_KHR_DRACO_MESH_COMPRESSION_EXTENSION));
    }
}

/// Accessors still read by something other than a compressed primitive.
fn referenced_accessors(root: &Value, compressed: &BTreeSet<(usize, usize)>) -> BTreeSet<usize> {
    let mut referenced = BTreeSet::new();
    let indices_of = |object: &Value| -> Vec<usize> {
        object
            .as_object()
            .into_iter()
            .flat_map(|o| o.values())
            .filter_map(as_index)
            .collect()
    };
    for (m, p, primitive) in primitives(root) {
        for target in array(primitive, KEY_TARGETS) {
            referenced.extend(indices_of(target));
        }
        if !compressed.contains(&(m, p)) {
            if let Some(attributes) = primitive.get(KEY_ATTRIBUTES) {
                referenced.extend(indices_of(attributes));
            }
            referenced.extend(primitive.get(KEY_INDICES).and_then(as_index));
        }
    }
    for skin in array(root, KEY_SKINS) {
        referenced.extend(skin.get(KEY_INVERSE_BIND_MATRICES).and_then(as_index));
    }
    for animation in array(root, KEY_ANIMATIONS) {
        for sampler in array(animation, KEY_SAMPLERS) {
            referenced.extend(sampler.get(KEY_INPUT).and_then(as_index));
            referenced.extend(sampler.get(KEY_OUTPUT).and_then(as_index));
        }
    }
    referenced
}

/// BufferViews referenced from accessors, sparse storage, images and Draco
/// extensions.
fn referenced_buffer_views(root: &Value) -> BTreeSet<usize> {
    let mut referenced = BTreeSet::new();
    for accessor in array(root, KEY_ACCESSORS) {
        referenced.extend(accessor.get(KEY_BUFFERVIEW).and_then(as_index));
        if let Some(sparse) = accessor.get(KEY_SPARSE) {
            for part in [KEY_INDICES, KEY_VALUES] {
                referenced.extend(
                    sparse
                        .get(part)
                        .and_then(|p| p.get(KEY_BUFFERVIEW))
                        .and_then(as_index),
                );
            }
        }
    }
    for image in array(root, KEY_IMAGES) {
        referenced.extend(image.get(KEY_BUFFERVIEW).and_then(as_index));
    }
    for (_, _, primitive) in primitives(root) {
        referenced.extend(
            primitive
                .get(KEY_EXTENSIONS)
                .and_then(|e| e.get(KEY_KHR_DRACO_MESH_COMPRESSION_EXTENSION))
                .and_then(|e| e.get(KEY_BUFFERVIEW))
                .and_then(as_index),
        );
    }
    referenced
}

/// Renumbers every bufferView reference, then erases `removed`.
fn remove_buffer_views(root: &mut Value, removed: &BTreeSet<usize>) {
    let map = |old: usize| remap_index(old, removed);
    for accessor in array_mut(root, KEY_ACCESSORS).into_iter().flatten() {
        remap_field(accessor, KEY_BUFFERVIEW, map);
        if let Some(sparse) = accessor.get_mut(KEY_SPARSE) {
            for part in [KEY_INDICES, KEY_VALUES] {
                if let Some(part) = sparse.get_mut(part) {
                    remap_field(part, KEY_BUFFERVIEW, map);
                }
            }
        }
    }
    for primitive in primitives_mut(root) {
        if let Some(extension) = draco_extension_mut(primitive) {
            remap_field(extension, KEY_BUFFERVIEW, map);
        }
    }
    for image in array_mut(root, KEY_IMAGES).into_iter().flatten() {
        remap_field(image, KEY_BUFFERVIEW, map);
    }
    if let Some(views) = array_mut(root, KEY_BUFFERVIEWS) {
        for &index in removed.iter().rev() {
            if index < views.len() {
                views.remove(index);
            }
        }
    }
}

/// Encodes one primitive from its accessors. `None` for primitives that
/// already carry a Draco extension.
fn encode_primitive(
    parser: &MeshParser<'_>,
    configuration: &ExportConfiguration,
    primitive: &Value,
) -> Result<Option<(RawPrimitive, CompressedMesh)>> {
    let raw = RawPrimitive::deserialize(primitive)?;
    if raw.draco_extension().is_some() {
        return Ok(None);
    }
    let geometry = parser.accessor_geometry(&raw, &mut Vec::new())?;
    let encoded = draco_bridge::compress_mesh(&geometry, configuration)?;
    Ok(Some((raw, encoded)))
}

fn view_range(view: &Value) -> Option<(usize, usize, usize)> {
    let buffer = view.get(KEY_BUFFER).and_then(as_index)?;
    let offset = view.get(KEY_BYTEOFFSET).and_then(as_index).unwrap_or(0);
    let length = view.get(KEY_BYTELENGTH).and_then(as_index)?;
    Some((buffer, offset, length))
}

/// Byte ranges per buffer that only removed bufferViews cover.
fn removed_byte_ranges(
    root: &Value,
    removed: &BTreeSet<usize>,
) -> BTreeMap<usize, Vec<(usize, usize)>> {
    let mut dropped: BTreeMap<usize, Vec<(usize, usize)>> = BTreeMap::new();
    let mut kept: BTreeMap<usize, Vec<(usize, usize)>> = BTreeMap::new();
    for (index, view) in array(root, KEY_BUFFERVIEWS).iter().enumerate() {
        let Some((buffer, offset, length)) = view_range(view) else {
            continue;
        };
        let side = if removed.contains(&index) { &mut dropped } else { &mut kept };
        side.entry(buffer).or_default().push((offset, length));
    }
    dropped
        .into_iter()
        .map(|(buffer, ranges)| {
            let keep = kept.get(&buffer).map(Vec::as_slice).unwrap_or_default();
            (buffer, subtract_ranges(&ranges, keep))
        })
        .filter(|(_, ranges)| !ranges.is_empty())
        .collect()
}

/// Recompresses the meshes of one document.
pub struct DracoPass<'a> {
    context: &'a GltfContext,
    configuration: &'a ExportConfiguration,
    source: PathBuf,
    destination: PathBuf,
    must_embed: bool,
    errors: Vec<String>,
    generated: Vec<String>,
    compressed_buffer_filename: Option<String>,
}

impl<'a> DracoPass<'a> {
    pub fn new(
        context: &'a GltfContext,
        configuration: &'a ExportConfiguration,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            context,
            configuration,
            source: source.into(),
            destination: destination.into(),
            must_embed: configuration.embedding() == Embed::All,
            errors: Vec::new(),
            generated: Vec::new(),
            compressed_buffer_filename: None,
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Buffer files written into the destination.
    pub fn generated_files(&self) -> &[String] {
        &self.generated
    }

    pub fn compressed_buffer_filename(&self) -> Option<&str> {
        self.compressed_buffer_filename.as_deref()
    }

    /// Returns the rewritten document, the untouched document when nothing
    /// could be compressed, or `None` when writing a buffer failed.
    pub fn compress(&mut self, mut root: Value) -> Option<Value> {
        let view_base = array(&root, KEY_BUFFERVIEWS).len();
        let compressed_buffer = array(&root, KEY_BUFFERS).len();
        let all_embedded = compressed_buffer > 0
            && array(&root, KEY_BUFFERS).iter().all(|b| {
                b.get(KEY_URI)
                    .and_then(Value::as_str)
                    .map_or(false, |u| uri::kind(u) == UriKind::Data)
            });

        let mut blob = Vec::new();
        let mut new_views = Vec::new();
        let mut to_clean = BTreeSet::new();
        let mut compressed = BTreeSet::new();
        self.compress_primitives(
            &mut root,
            view_base,
            compressed_buffer,
            &mut blob,
            &mut new_views,
            &mut to_clean,
            &mut compressed,
        );
        if new_views.is_empty() {
            return Some(root);
        }

        let referenced = referenced_accessors(&root, &compressed);
        let mut candidate_views = BTreeSet::new();
        if let Some(accessors) = array_mut(&mut root, KEY_ACCESSORS) {
            for &index in to_clean.difference(&referenced) {
                let Some(accessor) = accessors.get_mut(index).and_then(Value::as_object_mut) else {
                    continue;
                };
                candidate_views.extend(accessor.remove(KEY_BUFFERVIEW).as_ref().and_then(as_index));
                accessor.remove(KEY_BYTEOFFSET);
            }
        }

        for view in new_views {
            push_to_array(&mut root, KEY_BUFFERVIEWS, view);
        }
        let uri = if self.must_embed || all_embedded {
            uri::to_base64_uri(&blob)
        } else {
            self.write_compressed_buffer(&blob)?
        };
        push_to_array(
            &mut root,
            KEY_BUFFERS,
            json!({ KEY_BYTELENGTH: blob.len(), KEY_URI: uri }),
        );

        let still_used = referenced_buffer_views(&root);
        let removed: BTreeSet<usize> = candidate_views
            .into_iter()
            .filter(|v| *v < view_base && !still_used.contains(v))
            .collect();
        if !removed.is_empty() {
            let ranges = removed_byte_ranges(&root, &removed);
            remove_buffer_views(&mut root, &removed);
            self.cleanup_buffers(&mut root, &ranges);
        }

        add_extension_name(&mut root, KEY_EXTENSIONS_USED);
        add_extension_name(&mut root, KEY_EXTENSIONS_REQUIRED);
        info!(
            "Compressed {} primitives into {} bytes, removed {} bufferViews",
            compressed.len(),
            blob.len(),
            removed.len()
        );
        Some(root)
    }

    #[allow(clippy::too_many_arguments)]
    fn compress_primitives(
        &mut self,
        root: &mut Value,
        view_base: usize,
        buffer_index: usize,
        blob: &mut Vec<u8>,
        new_views: &mut Vec<Value>,
        to_clean: &mut BTreeSet<usize>,
        compressed: &mut BTreeSet<(usize, usize)>,
    ) {
        let context = self.context;
        let parser = MeshParser::new(&context.buffer_views, &context.accessors, &context.options);
        for (m, mesh) in array_mut(root, KEY_MESHES).into_iter().flatten().enumerate() {
            let label = mesh
                .get(KEY_NAME)
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| m.to_string());
            let primitives = array_mut(mesh, KEY_PRIMITIVES).into_iter().flatten();
            for (p, primitive) in primitives.enumerate() {
                let encoded = encode_primitive(&parser, self.configuration, primitive);
                let (raw, encoded) = match encoded {
                    Ok(Some(done)) => done,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!("Mesh {} primitive {} could not be compressed: {}", label, p, e);
                        self.errors
                            .push(format!("A mesh could not be compressed: {} -> {}", label, p));
                        continue;
                    }
                };

                blob.resize(blob.len().next_multiple_of(BLOB_ALIGNMENT), 0);
                let offset = blob.len();
                blob.extend_from_slice(&encoded.encoded_buffer);
                let view = view_base + new_views.len();
                new_views.push(json!({
                    KEY_BUFFER: buffer_index,
                    KEY_BYTEOFFSET: offset,
                    KEY_BYTELENGTH: encoded.encoded_buffer.len(),
                }));

                let attributes: Map<String, Value> = encoded
                    .attributes
                    .iter()
                    .map(|(semantic, id)| (semantic.clone(), json!(id)))
                    .collect();
                if !primitive.get(KEY_EXTENSIONS).map_or(false, Value::is_object) {
                    primitive[KEY_EXTENSIONS] = json!({});
                }
                primitive[KEY_EXTENSIONS][KEY_KHR_DRACO_MESH_COMPRESSION_EXTENSION] = json!({
                    KEY_BUFFERVIEW: view,
                    KEY_ATTRIBUTES: attributes,
                });

                to_clean.extend(raw.indices);
                to_clean.extend(raw.attributes.values().copied());
                compressed.insert((m, p));
                debug!(
                    "Compressed mesh {} primitive {} into {} bytes",
                    label,
                    p,
                    encoded.encoded_buffer.len()
                );
            }
        }
    }

    fn write_compressed_buffer(&mut self, blob: &[u8]) -> Option<String> {
        let name = unique_filename_in(
            &[self.destination.as_path(), self.source.as_path()],
            COMPRESSED_BUFFER_NAME,
        );
        let path = self.destination.join(&name);
        if let Err(e) = fs::write(&path, blob) {
            warn!("Failed to write {}: {}", path.display(), e);
            self.errors
                .push(format!("Could not open {} for writing.", path.display()));
            return None;
        }
        self.generated.push(name.clone());
        self.compressed_buffer_filename = Some(name.clone());
        Some(name)
    }

    fn buffer_bytes(&mut self, index: usize, buffer_uri: Option<&str>) -> Option<Vec<u8>> {
        let Some(buffer_uri) = buffer_uri else {
            return match self.context.buffer_data(index) {
                Some(data) => Some(data.to_vec()),
                None => {
                    self.errors.push(format!("Buffer {} has no data", index));
                    None
                }
            };
        };
        if uri::kind(buffer_uri) == UriKind::Path {
            let path = uri::resolve_resource(
                &uri::local_file(buffer_uri, &self.source),
                self.context.options.resource_root.as_deref(),
            );
            if !path.is_file() {
                self.errors.push(format!("File does not exist: {}", buffer_uri));
                return None;
            }
        }
        match uri::fetch_data_with_root(
            buffer_uri,
            &self.source,
            self.context.options.resource_root.as_deref(),
        ) {
            Ok(data) => Some(data),
            Err(e) => {
                self.errors.push(e.to_string());
                None
            }
        }
    }

    /// Splices removed ranges out of their buffers, fixes bufferView
    /// offsets, then drops buffers left empty. A buffer that cannot be read
    /// or rewritten keeps its bytes, length and view offsets.
    fn cleanup_buffers(&mut self, root: &mut Value, ranges: &BTreeMap<usize, Vec<(usize, usize)>>) {
        let mut spliced = BTreeSet::new();
        let mut emptied = BTreeSet::new();
        for (&index, buffer_ranges) in ranges {
            let buffer_uri = array(root, KEY_BUFFERS)
                .get(index)
                .and_then(|b| b.get(KEY_URI))
                .and_then(Value::as_str)
                .map(str::to_owned);
            let Some(mut data) = self.buffer_bytes(index, buffer_uri.as_deref()) else {
                warn!("Buffer {} left unspliced", index);
                continue;
            };
            splice_ranges(&mut data, buffer_ranges);
            if data.is_empty() {
                spliced.insert(index);
                emptied.insert(index);
                continue;
            }

            let external = buffer_uri.as_deref().filter(|u| {
                uri::kind(u) == UriKind::Path
                    && !uri::is_resource_path(&uri::local_file(u, Path::new("")))
            });
            let new_uri = match external {
                Some(path_uri) if !self.must_embed => {
                    let target = uri::local_file(path_uri, &self.destination);
                    let written = target
                        .parent()
                        .map_or(Ok(()), fs::create_dir_all)
                        .and_then(|_| fs::write(&target, &data));
                    if let Err(e) = written {
                        warn!("Failed to write {}: {}", target.display(), e);
                        self.errors
                            .push(format!("Could not open {} for writing.", target.display()));
                        continue;
                    }
                    self.generated.push(path_uri.to_owned());
                    path_uri.to_owned()
                }
                _ => uri::to_base64_uri(&data),
            };
            if let Some(buffer) = array_mut(root, KEY_BUFFERS).and_then(|b| b.get_mut(index)) {
                buffer[KEY_URI] = json!(new_uri);
                buffer[KEY_BYTELENGTH] = json!(data.len());
            }
            spliced.insert(index);
            debug!("Buffer {} shrunk to {} bytes", index, data.len());
        }

        for view in array_mut(root, KEY_BUFFERVIEWS).into_iter().flatten() {
            let Some((buffer, offset, _)) = view_range(view) else {
                continue;
            };
            if !spliced.contains(&buffer) {
                continue;
            }
            if let Some(buffer_ranges) = ranges.get(&buffer) {
                view[KEY_BYTEOFFSET] = json!(map_buffer_offset(offset, buffer_ranges));
            }
        }

        if !emptied.is_empty() {
            for view in array_mut(root, KEY_BUFFERVIEWS).into_iter().flatten() {
                remap_field(view, KEY_BUFFER, |old| remap_index(old, &emptied));
            }
            if let Some(buffers) = array_mut(root, KEY_BUFFERS) {
                for &index in emptied.iter().rev() {
                    buffers.remove(index);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtract_ranges() {
        assert_eq!(subtract_ranges(&[(0, 10), (10, 5)], &[]), vec![(0, 15)]);
        assert_eq!(subtract_ranges(&[(0, 16)], &[(4, 4)]), vec![(0, 4), (8, 8)]);
        assert_eq!(subtract_ranges(&[(8, 8)], &[(0, 12)]), vec![(12, 4)]);
        assert_eq!(subtract_ranges(&[(8, 8)], &[(0, 32)]), vec![]);
        assert_eq!(subtract_ranges(&[(4, 0)], &[]), vec![]);
    }

    #[test]
    fn test_splice_and_map() {
        let mut data: Vec<u8> = (0..12).collect();
        let ranges = [(2, 2), (8, 3)];
        splice_ranges(&mut data, &ranges);
        assert_eq!(data, vec![0, 1, 4, 5, 6, 7, 11]);
        assert_eq!(map_buffer_offset(4, &ranges), 2);
        assert_eq!(map_buffer_offset(11, &ranges), 6);
        assert_eq!(map_buffer_offset(0, &ranges), 0);
    }

    #[test]
    fn test_remove_buffer_views_renumbers_everything() {
        let mut root = json!({
            "bufferViews": [{}, {}, {}, {}, {}],
            "accessors": [
                { "bufferView": 4 },
                { "sparse": { "indices": { "bufferView": 2 }, "values": { "bufferView": 4 } } }
            ],
            "images": [{ "bufferView": 2 }],
            "meshes": [{ "primitives": [{
                "extensions": { "KHR_draco_mesh_compression": { "bufferView": 4 } }
            }] }]
        });
        let removed = BTreeSet::from([1, 3]);
        remove_buffer_views(&mut root, &removed);
        assert_eq!(root["bufferViews"].as_array().unwrap().len(), 3);
        assert_eq!(root["accessors"][0]["bufferView"], 2);
        assert_eq!(root["accessors"][1]["sparse"]["indices"]["bufferView"], 1);
        assert_eq!(root["accessors"][1]["sparse"]["values"]["bufferView"], 2);
        assert_eq!(root["images"][0]["bufferView"], 1);
        let extension = &root["meshes"][0]["primitives"][0]["extensions"];
        assert_eq!(extension["KHR_draco_mesh_compression"]["bufferView"], 2);
    }

    #[test]
    fn test_referenced_accessors() {
        let root = json!({
            "meshes": [{ "primitives": [
                { "attributes": { "POSITION": 0 }, "indices": 1, "targets": [{ "POSITION": 2 }] },
                { "attributes": { "POSITION": 3 } }
            ] }],
            "skins": [{ "inverseBindMatrices": 4 }],
            "animations": [{ "samplers": [{ "input": 5, "output": 6 }] }]
        });
        let compressed = BTreeSet::from([(0, 0)]);
        assert_eq!(
            referenced_accessors(&root, &compressed),
            BTreeSet::from([2, 3, 4, 5, 6])
        );
    }

    #[test]
    fn test_extension_names_are_added_once() {
        let mut root = json!({ "extensionsUsed": ["KHR_draco_mesh_compression"] });
        add_extension_name(&mut root, KEY_EXTENSIONS_USED);
        add_extension_name(&mut root, KEY_EXTENSIONS_REQUIRED);
        add_extension_name(&mut root, KEY_EXTENSIONS_REQUIRED);
        assert_eq!(root["extensionsUsed"], json!(["KHR_draco_mesh_compression"]));
        assert_eq!(root["extensionsRequired"], json!(["KHR_draco_mesh_compression"]));
    }
}
