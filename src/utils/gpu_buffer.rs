use std::mem;
use crate::wgpu_context::WgpuContext;
use wgpu::Buffer;

/// A GPU storage buffer mirrored by a CPU-side `Vec`.
///
/// The fluid subsystem never grows or shrinks its buffers after creation, so
/// unlike a general-purpose dynamic buffer this one only supports rewriting
/// the whole contents (`upload_all`) and reading them back (`download`).
#[derive(Debug)]
pub struct GpuBuffer<T> {
    data: Vec<T>,
    buffer: wgpu::Buffer,
}

impl<T: bytemuck::Pod> GpuBuffer<T> {
    pub fn new(wgpu_context: &WgpuContext, data: Vec<T>, usage: wgpu::BufferUsages) -> Self {
        let usage = usage | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC;
        let buffer = wgpu_context.get_device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("GpuBuffer"),
            size: (data.len() * mem::size_of::<T>().max(1)) as u64,
            usage,
            mapped_at_creation: false,
        });
        wgpu_context
            .get_queue()
            .write_buffer(&buffer, 0, bytemuck::cast_slice(&data));

        Self { data, buffer }
    }

    /// Replaces the CPU mirror and rewrites the entire GPU buffer.
    ///
    /// The new data must have the same length as the old: the buffer size is
    /// fixed for the lifetime of the subsystem.
    pub fn upload_all(&mut self, wgpu_context: &WgpuContext, data: Vec<T>) {
        debug_assert_eq!(data.len(), self.data.len());
        self.data = data;
        wgpu_context
            .get_queue()
            .write_buffer(&self.buffer, 0, bytemuck::cast_slice(&self.data));
    }

    /// Downloads the GPU contents into the CPU-side `Vec`, overwriting it.
    ///
    /// Blocks until the GPU has flushed all submitted work. Only used outside
    /// the frame path (tests, diagnostics).
    pub fn download(&mut self, wgpu_context: &WgpuContext) -> anyhow::Result<&Vec<T>> {
        let device = wgpu_context.get_device();
        let queue = wgpu_context.get_queue();

        let size = (self.data.len() * mem::size_of::<T>()) as u64;
        if size == 0 {
            return Ok(&self.data);
        }

        // Staging buffer the CPU is allowed to map.
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging Buffer (Download)"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Download Encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging_buffer, 0, size);
        queue.submit(Some(encoder.finish()));

        // map_async completes once the GPU is done; the channel turns that
        // into a synchronous wait.
        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        device.poll(wgpu::PollType::Wait)?;
        receiver.recv()??;

        let mapped_range = buffer_slice.get_mapped_range();
        let downloaded_data: &[T] = bytemuck::cast_slice(&mapped_range);
        self.data.clear();
        self.data.extend_from_slice(downloaded_data);
        drop(mapped_range);

        Ok(&self.data)
    }

    pub fn data(&self) -> &Vec<T> {
        &self.data
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
