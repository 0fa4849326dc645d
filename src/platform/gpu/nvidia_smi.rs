use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::core::usage::{GpuSample, SampleSource};
use crate::error::{Result, UsageError};

const QUERY_FIELDS: &str = "index,uuid,name,utilization.gpu,utilization.memory,memory.total,memory.used,temperature.gpu";

/// GPU sample source backed by the `nvidia-smi` command line tool
pub struct NvidiaSmiSource {
    binary: Option<PathBuf>,
    timeout: Duration,
}

impl NvidiaSmiSource {
    /// Create a source, resolving `nvidia-smi` on PATH when no binary is given
    pub fn new(binary: Option<PathBuf>, timeout: Duration) -> Self {
        let binary = binary.or_else(|| which::which("nvidia-smi").ok());
        if binary.is_none() {
            log::warn!("nvidia-smi not found on PATH; no GPU samples will be collected");
        }

        Self { binary, timeout }
    }

    async fn query(&self) -> Result<String> {
        let binary = self
            .binary
            .as_ref()
            .ok_or_else(|| UsageError::sample_source("nvidia-smi not available"))?;

        let child = Command::new(binary)
            .arg(format!("--query-gpu={}", QUERY_FIELDS))
            .arg("--format=csv,noheader,nounits")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| UsageError::sample_source(format!("Failed to run {:?}: {}", binary, e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                UsageError::sample_source(format!("nvidia-smi timed out after {:?}", self.timeout))
            })??;

        if !output.status.success() {
            return Err(UsageError::sample_source(format!(
                "nvidia-smi exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl SampleSource for NvidiaSmiSource {
    fn name(&self) -> &'static str {
        "nvidia-smi"
    }

    async fn collect_samples(&mut self) -> Result<Vec<GpuSample>> {
        let stdout = self.query().await?;
        Ok(parse_query_output(&stdout))
    }
}

/// Parse a numeric cell, treating unit suffixes and "not available" markers
/// as absence.
pub fn parse_number(value: &str) -> Option<f64> {
    let text = value.trim();
    if text.is_empty() || text == "N/A" || text.starts_with('[') {
        return None;
    }

    let text = text.strip_suffix('%').unwrap_or(text).trim();
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Turn `nvidia-smi` CSV output into samples.
///
/// Rows with fewer than four columns or without any identifier are skipped.
/// Memory utilization falls back to `used / total` when the tool does not
/// report it directly.
pub fn parse_query_output(output: &str) -> Vec<GpuSample> {
    let mut samples = Vec::new();

    for line in output.lines() {
        let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
        if parts.len() < 4 {
            continue;
        }

        let cell = |i: usize| parts.get(i).copied().unwrap_or("");
        let number = |i: usize| parts.get(i).and_then(|s| parse_number(s));

        let index = cell(0).to_string();
        let uuid = cell(1);
        let id = if uuid.is_empty() || uuid.starts_with('[') {
            index.clone()
        } else {
            uuid.to_string()
        };
        if id.is_empty() {
            continue;
        }

        let utilization_memory = number(4).or_else(|| match (number(5), number(6)) {
            (Some(total), Some(used)) if total > 0.0 => Some(used / total * 100.0),
            _ => None,
        });

        samples.push(GpuSample {
            id,
            index,
            name: cell(2).to_string(),
            utilization_gpu: number(3),
            utilization_memory,
            temperature: number(7),
        });
    }

    samples
}
