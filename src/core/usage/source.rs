use super::types::GpuSample;
use crate::error::Result;

/// Trait for GPU sample providers
///
/// Implementations query the hardware and return normalized samples, one per
/// device. Rows without a device identifier must be dropped before they are
/// returned. Implementations are provided in the platform layer.
#[allow(async_fn_in_trait)]
pub trait SampleSource {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Query the hardware once
    async fn collect_samples(&mut self) -> Result<Vec<GpuSample>>;
}
