use crate::status::DracoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodedGeometryType {
    PointCloud = 0,
    TriangularMesh = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshEncodingMethod {
    MeshSequentialEncoding = 0,
    MeshEdgebreakerEncoding = 1,
}

/// Id of the sequential coder used for one attribute, written after the
/// attribute descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequentialAttributeEncoderType {
    Generic = 0,
    Integer = 1,
    Quantization = 2,
    Normals = 3,
}

/// Connectivity layout of a sequential mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequentialConnectivityMethod {
    Compressed = 0,
    Uncompressed = 1,
}

impl TryFrom<u8> for EncodedGeometryType {
    type Error = DracoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EncodedGeometryType::PointCloud),
            1 => Ok(EncodedGeometryType::TriangularMesh),
            _ => Err(DracoError::DracoError(format!(
                "Unknown geometry type: {}",
                value
            ))),
        }
    }
}

impl TryFrom<u8> for SequentialAttributeEncoderType {
    type Error = DracoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SequentialAttributeEncoderType::Generic),
            1 => Ok(SequentialAttributeEncoderType::Integer),
            2 => Ok(SequentialAttributeEncoderType::Quantization),
            3 => Ok(SequentialAttributeEncoderType::Normals),
            _ => Err(DracoError::DracoError(format!(
                "Unknown sequential attribute decoder type: {}",
                value
            ))),
        }
    }
}
