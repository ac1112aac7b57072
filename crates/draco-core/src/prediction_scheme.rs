use crate::status::DracoError;

/// Prediction method byte written in front of integer attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSchemeMethod {
    None = -2,
    Undefined = -1,
    Difference = 0,
}

impl PredictionSchemeMethod {
    /// Parses the method byte. Only the methods a sequential stream may carry
    /// are accepted; `Undefined` is read as no prediction.
    pub fn from_byte(value: i8) -> Result<Self, DracoError> {
        match value {
            -2 | -1 => Ok(PredictionSchemeMethod::None),
            0 => Ok(PredictionSchemeMethod::Difference),
            1..=6 => Err(DracoError::UnsupportedFeature(format!(
                "Mesh prediction scheme {}",
                value
            ))),
            _ => Err(DracoError::DracoError(format!(
                "Invalid prediction scheme: {}",
                value
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSchemeTransformType {
    None = -1,
    Delta = 0,
    Wrap = 1,
}

impl PredictionSchemeTransformType {
    pub fn from_byte(value: i8) -> Result<Self, DracoError> {
        match value {
            -1 => Ok(PredictionSchemeTransformType::None),
            0 => Ok(PredictionSchemeTransformType::Delta),
            1 => Ok(PredictionSchemeTransformType::Wrap),
            _ => Err(DracoError::UnsupportedFeature(format!(
                "Prediction transform {}",
                value
            ))),
        }
    }
}
