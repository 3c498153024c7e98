use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use wgpu::{Backends, PowerPreference};

use crate::Error;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Raw `wgpu::Backends` bits. Zero disables every backend.
    pub backends_bits: u32,
    pub high_performance: bool,
    /// Declare and bind the `zero` uniform for every case, not only for
    /// snippets that read it.
    pub always_bind_zero: bool,
    pub timeout_ms: Option<u64>,
    /// `None` runs all cases on a single-threaded runtime.
    pub worker_threads: Option<usize>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            backends_bits: Backends::all().bits(),
            high_performance: true,
            always_bind_zero: true,
            timeout_ms: None,
            worker_threads: None,
        }
    }
}

impl HarnessConfig {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        let config: HarnessConfig = serde_json::from_str(&text)?;
        if config.worker_threads == Some(0) {
            return Err(Error::InvalidConfig("worker_threads must be at least 1".into()));
        }
        Ok(config)
    }

    pub fn backends(&self) -> Backends {
        Backends::from_bits(self.backends_bits).unwrap_or(Backends::all())
    }

    pub fn power_preference(&self) -> PowerPreference {
        if self.high_performance {
            PowerPreference::HighPerformance
        } else {
            PowerPreference::LowPower
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Parses a comma separated backend list such as `vulkan,metal`. `none`
/// yields an empty set.
pub fn parse_backends(list: &str) -> Result<Backends, Error> {
    let mut backends = Backends::empty();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        backends |= match name.to_ascii_lowercase().as_str() {
            "all" => Backends::all(),
            "primary" => Backends::PRIMARY,
            "secondary" => Backends::SECONDARY,
            "vulkan" | "vk" => Backends::VULKAN,
            "metal" | "mtl" => Backends::METAL,
            "dx12" | "d3d12" => Backends::DX12,
            "gl" | "gles" | "opengl" => Backends::GL,
            "webgpu" | "browser" => Backends::BROWSER_WEBGPU,
            "none" => Backends::empty(),
            other => {
                return Err(Error::InvalidConfig(format!("unknown backend '{other}'")));
            }
        };
    }
    Ok(backends)
}
