use tracing::debug;
use wgpu::{ComputePipelineDescriptor, ErrorFilter, PipelineCompilationOptions, ShaderModuleDescriptor};

use crate::outcome::CaseError;
use crate::shader::{ShaderSource, ENTRY_POINT};
use crate::DeviceSession;

pub struct CompiledPipeline {
    pub pipeline: wgpu::ComputePipeline,
}

impl CompiledPipeline {
    /// Layout inferred from the module's declared bindings.
    pub fn bind_group_layout(&self) -> wgpu::BindGroupLayout {
        self.pipeline.get_bind_group_layout(0)
    }
}

/// Compiles `source` into a compute pipeline with an automatic layout.
///
/// Shader and pipeline validation errors are captured in an error scope and
/// returned as [`CaseError::Compile`]; they never reach the device's
/// uncaptured-error handler.
pub async fn compile(
    session: &DeviceSession,
    name: &str,
    source: &ShaderSource,
) -> Result<CompiledPipeline, CaseError> {
    let device = session.device();
    let _scope = session.lock_error_scope().await;

    device.push_error_scope(ErrorFilter::Validation);
    let module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some(name),
        source: wgpu::ShaderSource::Wgsl(source.text.as_str().into()),
    });
    let pipeline = device.create_compute_pipeline(&ComputePipelineDescriptor {
        label: Some(name),
        layout: None,
        module: &module,
        entry_point: ENTRY_POINT,
        compilation_options: PipelineCompilationOptions::default(),
    });

    if let Some(err) = device.pop_error_scope().await {
        debug!(case = name, error = %err, "compile failed");
        return Err(CaseError::Compile(err.to_string()));
    }
    debug!(case = name, shader_len = source.text.len(), "pipeline compiled");

    Ok(CompiledPipeline { pipeline })
}
