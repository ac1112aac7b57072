use crate::draco_types::DataType;
use crate::status::DracoError;
use num_traits::NumCast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryAttributeType {
    Position = 0,
    Normal,
    Color,
    TexCoord,
    Generic,
}

impl TryFrom<u8> for GeometryAttributeType {
    type Error = DracoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GeometryAttributeType::Position),
            1 => Ok(GeometryAttributeType::Normal),
            2 => Ok(GeometryAttributeType::Color),
            3 => Ok(GeometryAttributeType::TexCoord),
            4 => Ok(GeometryAttributeType::Generic),
            _ => Err(DracoError::DracoError(format!(
                "Invalid attribute type: {}",
                value
            ))),
        }
    }
}

/// Rust scalar types that can back a point attribute.
pub trait AttributeValue: bytemuck::Pod + NumCast {
    const DATA_TYPE: DataType;
}

macro_rules! impl_attribute_value {
    ($($t:ty => $dt:ident),* $(,)?) => {
        $(impl AttributeValue for $t {
            const DATA_TYPE: DataType = DataType::$dt;
        })*
    };
}

impl_attribute_value!(
    i8 => Int8,
    u8 => Uint8,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    i64 => Int64,
    u64 => Uint64,
    f32 => Float32,
    f64 => Float64,
);

/// One per-point attribute with tightly packed little-endian values.
///
/// Values are stored with an identity point-to-value mapping: entry `i`
/// belongs to point `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointAttribute {
    attribute_type: GeometryAttributeType,
    data_type: DataType,
    num_components: u8,
    normalized: bool,
    unique_id: u32,
    buffer: Vec<u8>,
}

impl PointAttribute {
    pub fn new(
        attribute_type: GeometryAttributeType,
        data_type: DataType,
        num_components: u8,
        normalized: bool,
    ) -> Self {
        Self {
            attribute_type,
            data_type,
            num_components,
            normalized,
            unique_id: 0,
            buffer: Vec::new(),
        }
    }

    /// Creates an attribute from typed values, `num_components` per entry.
    pub fn from_values<T: AttributeValue>(
        attribute_type: GeometryAttributeType,
        num_components: u8,
        normalized: bool,
        values: &[T],
    ) -> Self {
        let mut att = Self::new(attribute_type, T::DATA_TYPE, num_components, normalized);
        att.buffer = bytemuck::cast_slice(values).to_vec();
        att
    }

    pub fn attribute_type(&self) -> GeometryAttributeType {
        self.attribute_type
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn num_components(&self) -> u8 {
        self.num_components
    }

    pub fn normalized(&self) -> bool {
        self.normalized
    }

    pub fn unique_id(&self) -> u32 {
        self.unique_id
    }

    pub fn set_unique_id(&mut self, id: u32) {
        self.unique_id = id;
    }

    /// Size in bytes of one entry.
    pub fn byte_stride(&self) -> usize {
        self.data_type.byte_length() * self.num_components as usize
    }

    /// Number of entries stored.
    pub fn size(&self) -> usize {
        let stride = self.byte_stride();
        if stride == 0 {
            0
        } else {
            self.buffer.len() / stride
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.buffer = data;
    }

    /// Reads every component converted to `T`.
    ///
    /// Returns `None` when a stored value does not fit in `T`.
    pub fn values<T: NumCast>(&self) -> Option<Vec<T>> {
        let width = self.data_type.byte_length();
        if width == 0 {
            return None;
        }
        self.buffer
            .chunks_exact(width)
            .map(|bytes| convert_component(self.data_type, bytes))
            .collect()
    }
}

fn convert_component<T: NumCast>(data_type: DataType, bytes: &[u8]) -> Option<T> {
    match data_type {
        DataType::Int8 => T::from(bytes[0] as i8),
        DataType::Uint8 | DataType::Bool => T::from(bytes[0]),
        DataType::Int16 => T::from(i16::from_le_bytes([bytes[0], bytes[1]])),
        DataType::Uint16 => T::from(u16::from_le_bytes([bytes[0], bytes[1]])),
        DataType::Int32 => T::from(i32::from_le_bytes(bytes.try_into().ok()?)),
        DataType::Uint32 => T::from(u32::from_le_bytes(bytes.try_into().ok()?)),
        DataType::Int64 => T::from(i64::from_le_bytes(bytes.try_into().ok()?)),
        DataType::Uint64 => T::from(u64::from_le_bytes(bytes.try_into().ok()?)),
        DataType::Float32 => T::from(f32::from_le_bytes(bytes.try_into().ok()?)),
        DataType::Float64 => T::from(f64::from_le_bytes(bytes.try_into().ok()?)),
        DataType::Invalid => None,
    }
}
