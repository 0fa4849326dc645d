//! GPU-specific platform code.
//!
//! Provides sample sources for NVIDIA GPUs, either through the `nvidia-smi`
//! tool or through NVML.

mod nvidia_smi;
mod nvml;

pub use nvidia_smi::{parse_number, parse_query_output, NvidiaSmiSource};
pub use nvml::NvmlSource;

use crate::core::config::{Config, SourceKind};
use crate::core::usage::{GpuSample, SampleSource};
use crate::error::Result;

/// Sample source selected from configuration
pub enum GpuSource {
    NvidiaSmi(NvidiaSmiSource),
    Nvml(NvmlSource),
}

impl SampleSource for GpuSource {
    fn name(&self) -> &'static str {
        match self {
            GpuSource::NvidiaSmi(source) => source.name(),
            GpuSource::Nvml(source) => source.name(),
        }
    }

    async fn collect_samples(&mut self) -> Result<Vec<GpuSample>> {
        match self {
            GpuSource::NvidiaSmi(source) => source.collect_samples().await,
            GpuSource::Nvml(source) => source.collect_samples().await,
        }
    }
}

/// Build the configured sample source
///
/// Falls back to `nvidia-smi` when NVML was requested but cannot be
/// initialized.
pub fn get_sample_source(config: &Config) -> GpuSource {
    let smi = || NvidiaSmiSource::new(config.nvidia_smi_path.clone(), config.query_timeout());

    match config.source {
        SourceKind::NvidiaSmi => GpuSource::NvidiaSmi(smi()),
        SourceKind::Nvml => match NvmlSource::new() {
            Ok(source) => GpuSource::Nvml(source),
            Err(e) => {
                log::warn!("{}; falling back to nvidia-smi", e);
                GpuSource::NvidiaSmi(smi())
            }
        },
    }
}
