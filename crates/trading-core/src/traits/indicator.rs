//! Indicator trait definitions.

use crate::error::IndicatorError;

/// Batch technical indicator over a price slice.
///
/// Output is shorter than the input by the warm-up length: the first output
/// value corresponds to input index `data.len() - output.len()`.
pub trait Indicator: Send + Sync {
    type Output;

    /// Calculate indicator values; empty when there is not enough data.
    fn calculate(&self, data: &[f64]) -> Vec<Self::Output>;

    /// Minimum number of input points needed for one output.
    fn period(&self) -> usize;

    fn name(&self) -> &str;

    /// Validate that there's enough data.
    fn validate_data(&self, data: &[f64]) -> Result<(), IndicatorError> {
        if data.len() < self.period() {
            return Err(IndicatorError::InsufficientData {
                required: self.period(),
                available: data.len(),
            });
        }
        Ok(())
    }
}

/// Indicator producing several related lines per point (MACD, Bollinger).
pub trait MultiOutputIndicator: Send + Sync {
    type Outputs;

    fn calculate(&self, data: &[f64]) -> Vec<Self::Outputs>;

    fn period(&self) -> usize;

    fn name(&self) -> &str;

    fn validate_data(&self, data: &[f64]) -> Result<(), IndicatorError> {
        if data.len() < self.period() {
            return Err(IndicatorError::InsufficientData {
                required: self.period(),
                available: data.len(),
            });
        }
        Ok(())
    }
}
