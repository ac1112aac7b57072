use crate::status::DracoError;

/// Numeric type of the values stored in a point attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Invalid = 0,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    Bool,
}

impl DataType {
    pub fn byte_length(&self) -> usize {
        match self {
            DataType::Invalid => 0,
            DataType::Int8 | DataType::Uint8 | DataType::Bool => 1,
            DataType::Int16 | DataType::Uint16 => 2,
            DataType::Int32 | DataType::Uint32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::Uint64 | DataType::Float64 => 8,
        }
    }

    /// True for the integer types the integer attribute coder accepts.
    pub fn is_integer_up_to_32_bits(&self) -> bool {
        matches!(
            self,
            DataType::Int8
                | DataType::Uint8
                | DataType::Int16
                | DataType::Uint16
                | DataType::Int32
                | DataType::Uint32
        )
    }
}

impl TryFrom<u8> for DataType {
    type Error = DracoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => DataType::Int8,
            2 => DataType::Uint8,
            3 => DataType::Int16,
            4 => DataType::Uint16,
            5 => DataType::Int32,
            6 => DataType::Uint32,
            7 => DataType::Int64,
            8 => DataType::Uint64,
            9 => DataType::Float32,
            10 => DataType::Float64,
            11 => DataType::Bool,
            _ => {
                return Err(DracoError::DracoError(format!(
                    "Invalid attribute data type: {}",
                    value
                )))
            }
        })
    }
}
