use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use draco_gltf::{
    decode_draco_primitive, uri, Embed, ExportConfiguration, Exporter, GltfImporter, ImportOptions,
    VertexBaseType,
};
use serde_json::{json, Value};

const POSITIONS: [f32; 12] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
const NORMALS: [f32; 12] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
const INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

fn le_bytes_f32(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Quad mesh plus a bufferView image, all in one buffer:
/// positions 0..48, normals 48..96, indices 96..108, image 108..116.
fn scene_buffer() -> Vec<u8> {
    let mut data = le_bytes_f32(&POSITIONS);
    data.extend(le_bytes_f32(&NORMALS));
    data.extend(INDICES.iter().flat_map(|v| v.to_le_bytes()));
    data.extend_from_slice(PNG);
    data
}

fn scene_json(buffer_uri: &str, extra_meshes: Vec<Value>) -> Value {
    let mut meshes = vec![json!({
        "name": "quad",
        "primitives": [{ "attributes": { "POSITION": 0, "NORMAL": 1 }, "indices": 2 }]
    })];
    meshes.extend(extra_meshes);
    json!({
        "asset": { "version": "2.0" },
        "buffers": [{ "uri": buffer_uri, "byteLength": 116 }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 48 },
            { "buffer": 0, "byteOffset": 48, "byteLength": 48 },
            { "buffer": 0, "byteOffset": 96, "byteLength": 12 },
            { "buffer": 0, "byteOffset": 108, "byteLength": 8 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 4, "type": "VEC3" },
            { "bufferView": 2, "componentType": 5123, "count": 6, "type": "SCALAR" }
        ],
        "images": [{ "bufferView": 3, "mimeType": "image/png" }],
        "meshes": meshes
    })
}

fn write_scene(dir: &Path, embedded: bool) -> PathBuf {
    let buffer_uri = if embedded {
        uri::to_base64_uri(&scene_buffer())
    } else {
        fs::write(dir.join("scene.bin"), scene_buffer()).unwrap();
        "scene.bin".to_string()
    };
    let path = dir.join("scene.gltf");
    fs::write(&path, scene_json(&buffer_uri, Vec::new()).to_string()).unwrap();
    path
}

fn compression(embedding: Embed) -> ExportConfiguration {
    let mut configuration = ExportConfiguration::new();
    configuration.set_mesh_compression_enabled(true);
    configuration.set_embedding(embedding);
    configuration
}

fn export(
    source: &Path,
    target: &Path,
    configuration: ExportConfiguration,
) -> draco_gltf::Export {
    let context = GltfImporter::new(ImportOptions::default())
        .load(source.join("scene.gltf"))
        .unwrap();
    Exporter::new(configuration)
        .with_context(context)
        .save_in_folder(source, target)
}

fn draco_attributes(json: &Value) -> (usize, BTreeMap<String, u32>) {
    let extension =
        &json["meshes"][0]["primitives"][0]["extensions"]["KHR_draco_mesh_compression"];
    let view = extension["bufferView"].as_u64().unwrap() as usize;
    let attributes = extension["attributes"]
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.as_u64().unwrap() as u32))
        .collect();
    (view, attributes)
}

#[test]
fn test_compressed_export_end_to_end() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_scene(source.path(), false);

    let export = export(source.path(), target.path(), compression(Embed::Keep));
    assert!(export.success(), "{:?}", export.errors());
    assert_eq!(export.compressed_buffer_filename(), Some("compressedBuffer.bin"));
    let json = export.json().unwrap();

    for key in ["extensionsUsed", "extensionsRequired"] {
        assert_eq!(json[key], json!(["KHR_draco_mesh_compression"]));
    }
    for accessor in json["accessors"].as_array().unwrap() {
        assert!(accessor.get("bufferView").is_none());
        assert!(accessor.get("byteOffset").is_none());
        assert!(accessor.get("count").is_some());
    }

    // Only the image range survives in the original buffer.
    assert_eq!(json["buffers"][0], json!({ "uri": "scene.bin", "byteLength": 8 }));
    assert_eq!(fs::read(target.path().join("scene.bin")).unwrap(), PNG);
    assert_eq!(json["bufferViews"][0], json!({ "buffer": 0, "byteOffset": 0, "byteLength": 8 }));
    assert_eq!(json["images"][0]["bufferView"], 0);
    assert_eq!(fs::read(source.path().join("scene.bin")).unwrap(), scene_buffer());

    let (view_index, attributes) = draco_attributes(json);
    assert_eq!(view_index, 1);
    let view = &json["bufferViews"][view_index];
    assert_eq!(view["buffer"], 1);
    assert_eq!(json["buffers"][1]["uri"], "compressedBuffer.bin");
    let compressed = fs::read(target.path().join("compressedBuffer.bin")).unwrap();
    assert_eq!(json["buffers"][1]["byteLength"], compressed.len());
    let offset = view["byteOffset"].as_u64().unwrap() as usize;
    let length = view["byteLength"].as_u64().unwrap() as usize;

    let decoded =
        decode_draco_primitive(&compressed[offset..offset + length], &attributes).unwrap();
    let position = &decoded.attributes["POSITION"];
    assert_eq!(position.base_type, VertexBaseType::Float);
    assert_eq!(position.packed_bytes().unwrap(), le_bytes_f32(&POSITIONS));
    assert_eq!(decoded.attributes["NORMAL"].packed_bytes().unwrap(), le_bytes_f32(&NORMALS));
    let indices = decoded.indices.unwrap().read_indices().unwrap();
    assert_eq!(indices, INDICES.iter().map(|&i| i as u32).collect::<Vec<_>>());
}

#[test]
fn test_exported_document_reimports() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_scene(source.path(), false);
    let export = export(source.path(), target.path(), compression(Embed::Keep));
    export.write_json(target.path().join("scene.gltf")).unwrap();

    let context = GltfImporter::default().load(target.path().join("scene.gltf")).unwrap();
    let primitive = &context.meshes[0].primitives[0];
    assert!(primitive.is_draco_compressed);
    assert!(primitive.attribute_info.iter().all(|info| info.is_draco));
    let position = primitive.geometry.attribute_by_name("vertexPosition").unwrap();
    assert_eq!(position.packed_bytes().unwrap(), le_bytes_f32(&POSITIONS));
    assert_eq!(primitive.geometry.index_attribute().unwrap().count, 6);
}

#[test]
fn test_existing_compressed_buffer_gets_a_new_name() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_scene(source.path(), false);
    fs::write(target.path().join("compressedBuffer.bin"), b"keep me").unwrap();

    let export = export(source.path(), target.path(), compression(Embed::Keep));
    assert!(export.success());
    assert_eq!(export.compressed_buffer_filename(), Some("compressedBuffer-1.bin"));
    assert_eq!(fs::read(target.path().join("compressedBuffer.bin")).unwrap(), b"keep me");
}

#[test]
fn test_embedded_source_is_separated() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_scene(source.path(), true);

    let export = export(source.path(), target.path(), compression(Embed::None));
    assert!(export.success(), "{:?}", export.errors());
    assert_eq!(export.compressed_buffer_filename(), None);
    let json = export.json().unwrap();
    let buffers = json["buffers"].as_array().unwrap();
    assert_eq!(buffers.len(), 2);
    for buffer in buffers {
        let name = buffer["uri"].as_str().unwrap();
        assert_eq!(uri::kind(name), draco_gltf::UriKind::Path);
        let data = fs::read(target.path().join(name)).unwrap();
        assert_eq!(buffer["byteLength"], data.len());
    }
    assert_eq!(buffers[0]["uri"], "scene-0.bin");
    assert_eq!(buffers[1]["uri"], "scene-1.bin");
}

#[test]
fn test_embed_all() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_scene(source.path(), false);

    let export = export(source.path(), target.path(), compression(Embed::All));
    assert!(export.success(), "{:?}", export.errors());
    let json = export.json().unwrap();
    for buffer in json["buffers"].as_array().unwrap() {
        assert!(buffer["uri"].as_str().unwrap().starts_with("data:"));
    }
    assert!(fs::read_dir(target.path()).unwrap().next().is_none());
}

#[test]
fn test_failed_primitive_does_not_abort_export() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    fs::write(source.path().join("scene.bin"), scene_buffer()).unwrap();
    let lines = json!({
        "name": "outline",
        "primitives": [{ "attributes": { "POSITION": 0 }, "mode": 1 }]
    });
    fs::write(
        source.path().join("scene.gltf"),
        scene_json("scene.bin", vec![lines]).to_string(),
    )
    .unwrap();

    let export = export(source.path(), target.path(), compression(Embed::Keep));
    assert!(!export.success());
    assert_eq!(export.errors(), &["A mesh could not be compressed: outline -> 0".to_string()]);
    let json = export.json().unwrap();
    // The line primitive still reads its positions.
    assert_eq!(json["accessors"][0]["bufferView"], 0);
    assert!(json["accessors"][1].get("bufferView").is_none());
    assert!(json["meshes"][1]["primitives"][0].get("extensions").is_none());
    assert_eq!(json["buffers"][0]["byteLength"], 56);
}

#[test]
fn test_emptied_buffer_is_dropped() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    let data = scene_buffer();
    fs::write(source.path().join("mesh.bin"), &data[..108]).unwrap();
    fs::write(source.path().join("image.bin"), PNG).unwrap();
    let mut doc = scene_json("mesh.bin", Vec::new());
    doc["buffers"] = json!([
        { "uri": "mesh.bin", "byteLength": 108 },
        { "uri": "image.bin", "byteLength": 8 }
    ]);
    doc["bufferViews"][3] = json!({ "buffer": 1, "byteOffset": 0, "byteLength": 8 });
    fs::write(source.path().join("scene.gltf"), doc.to_string()).unwrap();

    let export = export(source.path(), target.path(), compression(Embed::Keep));
    assert!(export.success(), "{:?}", export.errors());
    let json = export.json().unwrap();

    let buffers = json["buffers"].as_array().unwrap();
    assert_eq!(buffers.len(), 2);
    assert_eq!(buffers[0], json!({ "uri": "image.bin", "byteLength": 8 }));
    assert_eq!(buffers[1]["uri"], "compressedBuffer.bin");
    assert_eq!(json["bufferViews"][0], json!({ "buffer": 0, "byteOffset": 0, "byteLength": 8 }));
    assert_eq!(json["images"][0]["bufferView"], 0);
    let (view_index, _) = draco_attributes(json);
    assert_eq!(json["bufferViews"][view_index]["buffer"], 1);
    assert!(!target.path().join("mesh.bin").exists());
    assert_eq!(fs::read(target.path().join("image.bin")).unwrap(), PNG);
}

#[test]
fn test_missing_buffer_file_keeps_buffer_unspliced() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_scene(source.path(), false);
    let context = GltfImporter::default().load(source.path().join("scene.gltf")).unwrap();
    fs::remove_file(source.path().join("scene.bin")).unwrap();

    let export = Exporter::new(compression(Embed::Keep))
        .with_context(context)
        .save_in_folder(source.path(), target.path());
    assert!(!export.success());
    assert!(export.errors().contains(&"File does not exist: scene.bin".to_string()));
    let json = export.json().unwrap();

    // The Draco data is still written and the source buffer keeps its layout.
    assert_eq!(json["buffers"][0], json!({ "uri": "scene.bin", "byteLength": 116 }));
    assert_eq!(json["bufferViews"][0], json!({ "buffer": 0, "byteOffset": 108, "byteLength": 8 }));
    assert_eq!(json["images"][0]["bufferView"], 0);
    let (view_index, _) = draco_attributes(json);
    assert_eq!(json["bufferViews"][view_index]["buffer"], 1);
    assert!(target.path().join("compressedBuffer.bin").is_file());
}

#[test]
fn test_copy_without_compression() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_scene(source.path(), false);

    let exporter = Exporter::new(ExportConfiguration::new())
        .with_context(GltfImporter::default().load(source.path().join("scene.gltf")).unwrap());
    assert!(exporter.overwritable_files(target.path()).is_empty());
    let export = exporter.save_in_folder(source.path(), target.path());
    assert!(export.success());
    assert_eq!(export.json(), Some(&exporter.context().unwrap().json));
    assert_eq!(fs::read(target.path().join("scene.bin")).unwrap(), scene_buffer());
    assert_eq!(
        exporter.overwritable_files(target.path()),
        vec![target.path().join("scene.bin")]
    );
}

#[test]
fn test_unusable_targets() {
    let source = tempfile::tempdir().unwrap();
    write_scene(source.path(), false);
    let mut context = GltfImporter::default().load(source.path().join("scene.gltf")).unwrap();

    let exporter = Exporter::new(ExportConfiguration::new()).with_context(context.clone());
    let missing = source.path().join("nope");
    let export = exporter.save_in_folder(source.path(), &missing);
    assert!(export.json().is_none());
    assert!(export.errors()[0].starts_with("Cannot write to output directory"));

    context.json = json!({});
    let export = Exporter::new(ExportConfiguration::new())
        .with_context(context)
        .save_in_folder(source.path(), source.path());
    assert_eq!(export.errors(), &["Nothing to save".to_string()]);
}
