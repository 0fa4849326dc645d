#[cfg(feature = "nvml")]
use nvml_wrapper::{enum_wrappers::device::TemperatureSensor, Nvml};

use crate::core::usage::{GpuSample, SampleSource};
use crate::error::{Result, UsageError};

/// GPU sample source using NVML directly
pub struct NvmlSource {
    #[cfg(feature = "nvml")]
    nvml: Nvml,
}

impl NvmlSource {
    /// Initialize NVML
    pub fn new() -> Result<Self> {
        #[cfg(feature = "nvml")]
        {
            let nvml = Nvml::init()
                .map_err(|e| UsageError::sample_source(format!("Failed to init NVML: {}", e)))?;
            Ok(Self { nvml })
        }
        #[cfg(not(feature = "nvml"))]
        {
            Err(UsageError::sample_source(
                "NVML support not enabled. Recompile with --features nvml",
            ))
        }
    }

    #[cfg(feature = "nvml")]
    fn read_devices(&self) -> Result<Vec<GpuSample>> {
        let count = self
            .nvml
            .device_count()
            .map_err(|e| UsageError::sample_source(format!("Failed to count GPUs: {}", e)))?;

        let mut samples = Vec::with_capacity(count as usize);
        for index in 0..count {
            let device = match self.nvml.device_by_index(index) {
                Ok(device) => device,
                Err(e) => {
                    log::debug!("Skipping GPU {}: {}", index, e);
                    continue;
                }
            };

            let id = device.uuid().unwrap_or_else(|_| index.to_string());
            let utilization = device.utilization_rates().ok();

            // Memory controller busy time matches nvidia-smi's utilization.memory
            let utilization_memory = utilization.as_ref().map(|u| f64::from(u.memory)).or_else(|| {
                device
                    .memory_info()
                    .ok()
                    .filter(|m| m.total > 0)
                    .map(|m| m.used as f64 / m.total as f64 * 100.0)
            });

            samples.push(GpuSample {
                id,
                index: index.to_string(),
                name: device.name().unwrap_or_default(),
                utilization_gpu: utilization.as_ref().map(|u| f64::from(u.gpu)),
                utilization_memory,
                temperature: device
                    .temperature(TemperatureSensor::Gpu)
                    .ok()
                    .map(f64::from),
            });
        }

        Ok(samples)
    }
}

impl SampleSource for NvmlSource {
    fn name(&self) -> &'static str {
        "nvml"
    }

    async fn collect_samples(&mut self) -> Result<Vec<GpuSample>> {
        #[cfg(feature = "nvml")]
        {
            self.read_devices()
        }
        #[cfg(not(feature = "nvml"))]
        {
            Err(UsageError::sample_source("NVML support not enabled"))
        }
    }
}
