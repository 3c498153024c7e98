use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::{BufferDescriptor, BufferUsages};

pub const WORD_SIZE: u64 = std::mem::size_of::<u32>() as u64;

/// Initial content of every result buffer. A case that reads this back never
/// had its shader write the result.
pub const SENTINEL: u32 = 0xDEAD_BEEF;

pub const RESULT_USAGE: BufferUsages = BufferUsages::STORAGE.union(BufferUsages::COPY_SRC);
pub const STAGING_USAGE: BufferUsages = BufferUsages::MAP_READ.union(BufferUsages::COPY_DST);
pub const ZERO_USAGE: BufferUsages = BufferUsages::UNIFORM;

/// Buffers owned by a single case.
pub struct CaseResources {
    pub result: wgpu::Buffer,
    pub staging: wgpu::Buffer,
    pub zero: Option<wgpu::Buffer>,
}

impl CaseResources {
    /// All contents are in place at creation; nothing is written later.
    pub fn allocate(device: &wgpu::Device, name: &str, with_zero: bool) -> Self {
        let result = device.create_buffer_init(&BufferInitDescriptor {
            label: Some(&format!("{name} result")),
            contents: bytemuck::bytes_of(&SENTINEL),
            usage: RESULT_USAGE,
        });

        let staging = device.create_buffer(&BufferDescriptor {
            label: Some(&format!("{name} staging")),
            size: WORD_SIZE,
            usage: STAGING_USAGE,
            mapped_at_creation: false,
        });

        let zero = with_zero.then(|| {
            device.create_buffer_init(&BufferInitDescriptor {
                label: Some(&format!("{name} zero")),
                contents: bytemuck::bytes_of(&0u32),
                usage: ZERO_USAGE,
            })
        });

        Self {
            result,
            staging,
            zero,
        }
    }
}
