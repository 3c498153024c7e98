use tracing::debug;
use wgpu::{
    BindGroupDescriptor, BindGroupEntry, CommandEncoderDescriptor, ComputePassDescriptor,
    ErrorFilter,
};

use crate::outcome::CaseError;
use crate::pipeline::CompiledPipeline;
use crate::resources::{CaseResources, WORD_SIZE};
use crate::shader::{RESULT_BINDING, ZERO_BINDING};
use crate::DeviceSession;

/// One workgroup of `@workgroup_size(1)`: the only invocation has
/// `global_invocation_id == vec3u(0)`.
pub const WORKGROUPS: (u32, u32, u32) = (1, 1, 1);

/// Records the compute pass and the result copy, then submits them.
///
/// Validation errors from bind group creation, encoding or submission are
/// captured and returned as [`CaseError::Dispatch`]. A rejected command buffer
/// never copies the result, so its staging buffer must not be read.
pub async fn submit(
    session: &DeviceSession,
    compiled: &CompiledPipeline,
    resources: &CaseResources,
    name: &str,
) -> Result<wgpu::SubmissionIndex, CaseError> {
    let device = session.device();
    let _scope = session.lock_error_scope().await;
    device.push_error_scope(ErrorFilter::Validation);

    let mut entries = vec![BindGroupEntry {
        binding: RESULT_BINDING,
        resource: resources.result.as_entire_binding(),
    }];
    if let Some(zero) = &resources.zero {
        entries.push(BindGroupEntry {
            binding: ZERO_BINDING,
            resource: zero.as_entire_binding(),
        });
    }

    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some(name),
        layout: &compiled.bind_group_layout(),
        entries: &entries,
    });

    let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor { label: Some(name) });
    {
        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
            label: Some(name),
            timestamp_writes: None,
        });
        pass.set_pipeline(&compiled.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        let (x, y, z) = WORKGROUPS;
        pass.dispatch_workgroups(x, y, z);
    }
    encoder.copy_buffer_to_buffer(&resources.result, 0, &resources.staging, 0, WORD_SIZE);

    let index = session.queue().submit(Some(encoder.finish()));

    if let Some(err) = device.pop_error_scope().await {
        debug!(case = name, error = %err, "dispatch rejected");
        return Err(CaseError::Dispatch(err.to_string()));
    }
    debug!(case = name, bindings = entries.len(), "dispatch submitted");

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_invocation_dispatch() {
        let (x, y, z) = WORKGROUPS;
        assert_eq!(x * y * z, 1);
    }
}
