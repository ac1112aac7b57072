use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::{json, Value};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gltf-draco"))
        .args(args)
        .output()
        .unwrap()
}

fn write_triangle(dir: &Path) -> String {
    let mut data: Vec<u8> = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    data.extend([0u16, 1, 2].iter().flat_map(|v| v.to_le_bytes()));
    fs::write(dir.join("tri.bin"), &data).unwrap();
    let doc = json!({
        "asset": { "version": "2.0" },
        "buffers": [{ "uri": "tri.bin", "byteLength": 42 }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ],
        "meshes": [{
            "name": "tri",
            "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }]
        }]
    });
    let path = dir.join("tri.gltf");
    fs::write(&path, doc.to_string()).unwrap();
    path.to_str().unwrap().to_owned()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn test_compress() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    let input = write_triangle(source.path());
    let output = target.path().join("out");

    let result = run(&[
        "compress",
        &input,
        output.to_str().unwrap(),
        "--encoding-speed",
        "10",
        "--quantize",
        "position=10",
    ]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let doc = read_json(&output.join("tri.gltf"));
    assert_eq!(doc["extensionsRequired"], json!(["KHR_draco_mesh_compression"]));
    assert_eq!(doc["buffers"].as_array().unwrap().len(), 1);
    assert_eq!(doc["buffers"][0]["uri"], "compressedBuffer.bin");
    assert!(output.join("compressedBuffer.bin").is_file());
    assert!(!output.join("tri.bin").exists());
}

#[test]
fn test_inspect() {
    let source = tempfile::tempdir().unwrap();
    let input = write_triangle(source.path());
    let result = run(&["inspect", &input]);
    assert!(result.status.success());
    let stdout = String::from_utf8(result.stdout).unwrap();
    assert!(stdout.contains("mesh 0 \"tri\": 1 primitives, 0 morph targets"));
    assert!(stdout.contains("POSITION -> vertexPosition Floatx3 count 3"));
    assert!(stdout.contains("draco: no"));
}

#[test]
fn test_embed_then_separate() {
    let source = tempfile::tempdir().unwrap();
    let embedded = tempfile::tempdir().unwrap();
    let separated = tempfile::tempdir().unwrap();
    let input = write_triangle(source.path());

    let result = run(&["embed", &input, embedded.path().to_str().unwrap()]);
    assert!(result.status.success());
    let doc = read_json(&embedded.path().join("tri.gltf"));
    assert!(doc["buffers"][0]["uri"].as_str().unwrap().starts_with("data:"));

    let embedded_doc = embedded.path().join("tri.gltf");
    let result = run(&[
        "separate",
        embedded_doc.to_str().unwrap(),
        separated.path().to_str().unwrap(),
    ]);
    assert!(result.status.success());
    let doc = read_json(&separated.path().join("tri.gltf"));
    assert_eq!(doc["buffers"][0]["uri"], "tri-0.bin");
    assert_eq!(
        fs::read(separated.path().join("tri-0.bin")).unwrap(),
        fs::read(source.path().join("tri.bin")).unwrap()
    );
}

#[test]
fn test_failures_exit_non_zero() {
    let target = tempfile::tempdir().unwrap();
    let result = run(&["compress", "missing.gltf", target.path().to_str().unwrap()]);
    assert!(!result.status.success());
    let stderr = String::from_utf8(result.stderr).unwrap();
    assert!(stderr.lines().any(|line| line == "Cannot open missing.gltf"));

    let result = run(&["compress", "a.gltf", "out", "--quantize", "weights=3"]);
    assert!(!result.status.success());
}
