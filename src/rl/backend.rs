//! Backend type aliases and device management
//!
//! NdArray is sufficient for this environment: the observation is an
//! 11-element vector and the networks are small MLPs, so CPU training is
//! fast enough. A GPU backend could be swapped in later if needed.

use burn::backend::{
    ndarray::{NdArray, NdArrayDevice},
    Autodiff,
};

/// Backend type for training (with autodiff)
pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// Backend type for inference (without autodiff)
pub type InferenceBackend = NdArray<f32>;

/// Get the default device for computation
///
/// Returns the default NdArray device (CPU). Safe to call multiple times.
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_device() {
        let device1 = default_device();
        let device2 = default_device();
        assert_eq!(
            std::mem::discriminant(&device1),
            std::mem::discriminant(&device2)
        );
    }
}
