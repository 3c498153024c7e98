use std::sync::Arc;

use tracing::debug;
use wgpu::{Maintain, MapMode};

use crate::outcome::CaseError;
use crate::resources::WORD_SIZE;
use crate::DeviceSession;

/// Read access to a mapped staging buffer. Dropping it unmaps the buffer.
struct MappedWord<'a> {
    buffer: &'a wgpu::Buffer,
}

impl MappedWord<'_> {
    fn word(&self) -> u32 {
        let view = self.buffer.slice(..WORD_SIZE).get_mapped_range();
        bytemuck::pod_read_unaligned(&view[..WORD_SIZE as usize])
    }
}

impl Drop for MappedWord<'_> {
    fn drop(&mut self) {
        self.buffer.unmap();
    }
}

/// Maps `staging` once `submission` has completed and reads its first word in
/// native byte order.
pub async fn read_word(
    session: &Arc<DeviceSession>,
    staging: &wgpu::Buffer,
    submission: wgpu::SubmissionIndex,
) -> Result<u32, CaseError> {
    let slice = staging.slice(..WORD_SIZE);
    let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
    slice.map_async(MapMode::Read, move |res| {
        sender.send(res).ok();
    });

    // The map callback only fires from a device poll; waiting on the
    // submission blocks, so it runs off the async executor.
    let waiter = Arc::clone(session);
    tokio::task::spawn_blocking(move || {
        waiter
            .device()
            .poll(Maintain::WaitForSubmissionIndex(submission));
    })
    .await
    .map_err(|e| CaseError::Readback(format!("device poll failed: {e}")))?;

    match receiver.receive().await {
        Some(Ok(())) => {}
        Some(Err(err)) => return Err(CaseError::Readback(err.to_string())),
        None => return Err(CaseError::Readback("map callback dropped".into())),
    }

    let mapped = MappedWord { buffer: staging };
    let word = mapped.word();
    drop(mapped);

    debug!(word, "readback complete");
    Ok(word)
}
