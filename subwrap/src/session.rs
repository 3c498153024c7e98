use tracing::{info, warn};
use wgpu::{DeviceDescriptor, InstanceDescriptor, RequestAdapterOptions};

use crate::{Error, HarnessConfig};

pub const NO_ADAPTER_STATUS: &str = "WebGPU is not supported on this platform.";
pub const NO_DEVICE_STATUS: &str = "Failed to create WebGPU device.";

/// The adapter, device and queue shared by every case of a run.
pub struct DeviceSession {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    // Error scopes are a per-device stack; only one case may hold one open.
    error_scope: tokio::sync::Mutex<()>,
}

impl DeviceSession {
    pub async fn acquire(config: &HarnessConfig) -> Result<Self, Error> {
        let backends = config.backends();
        info!(?backends, "initializing GPU session");

        let instance = wgpu::Instance::new(InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: config.power_preference(),
                ..Default::default()
            })
            .await
            .ok_or_else(|| Error::UnsupportedPlatform(NO_ADAPTER_STATUS.into()))?;

        let adapter_info = adapter.get_info();
        info!(
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            "GPU adapter acquired"
        );

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("subwrap"),
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| {
                warn!(error = %e, "device request failed");
                Error::UnsupportedPlatform(NO_DEVICE_STATUS.into())
            })?;

        // Errors outside a case's compile scope are logged instead of panicking
        // a case task.
        device.on_uncaptured_error(Box::new(|e| {
            warn!(error = %e, "uncaptured GPU error");
        }));
        info!("GPU device created");

        Ok(Self {
            adapter,
            device,
            queue,
            error_scope: tokio::sync::Mutex::new(()),
        })
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub(crate) async fn lock_error_scope(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.error_scope.lock().await
    }
}
