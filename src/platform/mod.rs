// Platform-specific code module

pub mod gpu;

// Re-exports for clean imports
pub use gpu::{get_sample_source, GpuSource};
