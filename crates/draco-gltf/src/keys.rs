//! JSON keys shared by the importer and the export passes.

use serde_json::Value;

pub const KEY_ACCESSORS: &str = "accessors";
pub const KEY_ANIMATIONS: &str = "animations";
pub const KEY_ASSET: &str = "asset";
pub const KEY_ATTRIBUTES: &str = "attributes";
pub const KEY_BUFFER: &str = "buffer";
pub const KEY_BUFFERS: &str = "buffers";
pub const KEY_BUFFERVIEW: &str = "bufferView";
pub const KEY_BUFFERVIEWS: &str = "bufferViews";
pub const KEY_BYTELENGTH: &str = "byteLength";
pub const KEY_BYTEOFFSET: &str = "byteOffset";
pub const KEY_BYTESTRIDE: &str = "byteStride";
pub const KEY_EXTENSIONS: &str = "extensions";
pub const KEY_EXTENSIONS_REQUIRED: &str = "extensionsRequired";
pub const KEY_EXTENSIONS_USED: &str = "extensionsUsed";
pub const KEY_IMAGES: &str = "images";
pub const KEY_INDICES: &str = "indices";
pub const KEY_INPUT: &str = "input";
pub const KEY_INVERSE_BIND_MATRICES: &str = "inverseBindMatrices";
pub const KEY_MESHES: &str = "meshes";
pub const KEY_MIMETYPE: &str = "mimeType";
pub const KEY_NAME: &str = "name";
pub const KEY_OUTPUT: &str = "output";
pub const KEY_PRIMITIVES: &str = "primitives";
pub const KEY_SAMPLERS: &str = "samplers";
pub const KEY_SKINS: &str = "skins";
pub const KEY_SPARSE: &str = "sparse";
pub const KEY_TARGETS: &str = "targets";
pub const KEY_URI: &str = "uri";
pub const KEY_VALUES: &str = "values";

pub const KEY_KHR_DRACO_MESH_COMPRESSION_EXTENSION: &str = "KHR_draco_mesh_compression";
pub const KEY_KDAB_ASSET_KEY_EXTENSION: &str = "KDAB_asset_key";
pub const KEY_KDAB_ASSET_KEY: &str = "key";

/// Reads the `KDAB_asset_key` of any glTF object carrying an
/// `extensions` member.
pub fn asset_key(extensions: Option<&Value>) -> Option<String> {
    extensions?
        .get(KEY_KDAB_ASSET_KEY_EXTENSION)?
        .get(KEY_KDAB_ASSET_KEY)?
        .as_str()
        .map(str::to_owned)
}
