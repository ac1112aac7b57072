//! glTF 2.0 mesh import and export with `KHR_draco_mesh_compression`.
//!
//! [`GltfImporter`] loads a `.gltf` or `.glb` document into a
//! [`GltfContext`]: buffers, bufferViews and accessors resolved into typed
//! attribute streams, and meshes parsed into per-primitive [`Geometry`]
//! (Draco payloads decoded, morph targets checked, normals and tangents
//! generated on request). [`Exporter`] writes the document back out,
//! recompressing its meshes with Draco and embedding, separating or
//! copying its resources.
//!
//! ```no_run
//! use draco_gltf::{ExportConfiguration, Exporter, GltfImporter, ImportOptions};
//! use std::path::Path;
//!
//! let context = GltfImporter::new(ImportOptions::default()).load("scene.gltf")?;
//! let mut configuration = ExportConfiguration::new();
//! configuration.set_mesh_compression_enabled(true);
//! let export = Exporter::new(configuration)
//!     .with_context(context)
//!     .save_in_folder(Path::new("."), Path::new("out"));
//! export.write_json("out/scene.gltf")?;
//! # Ok::<(), draco_gltf::GltfError>(())
//! ```

pub mod accessors;
pub mod assets;
pub mod buffers;
pub mod config;
pub mod context;
pub mod draco_bridge;
pub mod error;
pub mod exporter;
pub mod geometry;
pub mod glb;
pub mod importer;
pub mod keys;
pub mod mesh_parser;
pub mod mesh_utils;
pub mod passes;
pub mod uri;

mod schema;

pub use accessors::{Accessor, AccessorTable};
pub use buffers::{Buffer, BufferView, BufferViewTable};
pub use config::{Embed, ExportConfiguration, ImportOptions, MeshAttribute};
pub use context::GltfContext;
pub use draco_bridge::{compress_mesh, decode_draco_primitive, CompressedMesh};
pub use error::{GltfError, Result};
pub use exporter::{generate_unique_filename, Export, Exporter};
pub use geometry::{AttributeKind, Geometry, GeometryAttribute, PrimitiveType, VertexBaseType};
pub use importer::GltfImporter;
pub use mesh_parser::{AttributeInfo, Mesh, MorphTarget, Primitive};
pub use uri::UriKind;
