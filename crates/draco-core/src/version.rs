// Draco bitstream version constants.
//
// Only the 2.x bitstream family is produced and accepted. Mesh and point
// cloud streams carry different latest minor versions.

// =============================================================================
// Latest Draco Bitstream Versions
// =============================================================================

/// Latest major version of the Draco Point Cloud bitstream.
pub const DRACO_POINT_CLOUD_BITSTREAM_VERSION_MAJOR: u8 = 2;

/// Latest minor version of the Draco Point Cloud bitstream.
pub const DRACO_POINT_CLOUD_BITSTREAM_VERSION_MINOR: u8 = 3;

/// Latest major version of the Draco Mesh bitstream.
pub const DRACO_MESH_BITSTREAM_VERSION_MAJOR: u8 = 2;

/// Latest minor version of the Draco Mesh bitstream.
pub const DRACO_MESH_BITSTREAM_VERSION_MINOR: u8 = 2;

/// Version written by the mesh encoder.
pub const DEFAULT_MESH_VERSION: (u8, u8) = (
    DRACO_MESH_BITSTREAM_VERSION_MAJOR,
    DRACO_MESH_BITSTREAM_VERSION_MINOR,
);

/// Version written by the point cloud encoder.
pub const DEFAULT_POINT_CLOUD_VERSION: (u8, u8) = (
    DRACO_POINT_CLOUD_BITSTREAM_VERSION_MAJOR,
    DRACO_POINT_CLOUD_BITSTREAM_VERSION_MINOR,
);

// =============================================================================
// Milestone Versions
// =============================================================================

/// Oldest version this decoder understands (varint headers everywhere).
pub const VERSION_VARINT_ENCODING: (u8, u8) = (2, 0);

/// Version from which raw connectivity may store indices as varints.
pub const VERSION_VARINT_RAW_INDICES: (u8, u8) = (2, 2);

// =============================================================================
// Utility Functions
// =============================================================================

/// Returns true if (major, minor) >= target.
#[inline]
pub fn version_at_least(major: u8, minor: u8, target: (u8, u8)) -> bool {
    major > target.0 || (major == target.0 && minor >= target.1)
}

/// Returns true if a stream with this version can be decoded, given the latest
/// version known for its geometry type.
#[inline]
pub fn is_supported_version(major: u8, minor: u8, latest: (u8, u8)) -> bool {
    major == latest.0
        && minor <= latest.1
        && version_at_least(major, minor, VERSION_VARINT_ENCODING)
}
