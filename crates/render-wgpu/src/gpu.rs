use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use helicity_common::{FillMode, ShapeKind};
use helicity_render::{DrawCommand, DrawList, FrameInfo, mesh};
use std::collections::BTreeMap;
use std::ops::Range;
use wgpu::util::DeviceExt;

const INITIAL_INSTANCE_CAPACITY: usize = 4096;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.55,
    g: 0.75,
    b: 0.95,
    a: 1.0,
};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

/// Per-instance model matrix columns and color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub model_0: [f32; 4],
    pub model_1: [f32; 4],
    pub model_2: [f32; 4],
    pub model_3: [f32; 4],
    pub color: [f32; 4],
}

impl InstanceData {
    fn from_command(cmd: &DrawCommand) -> Self {
        let cols = cmd.model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color: cmd.color.to_array(),
        }
    }
}

/// One instanced draw: a primitive, a fill mode and a range of instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub kind: ShapeKind,
    pub fill: FillMode,
    pub instances: Range<u32>,
}

/// Group draw commands by `(kind, fill)` into one contiguous instance array.
///
/// Batches come out in `(kind, fill)` order; within a batch instances keep
/// their recording order.
pub fn batch_commands(commands: &[DrawCommand]) -> (Vec<InstanceData>, Vec<Batch>) {
    let mut groups: BTreeMap<(ShapeKind, FillMode), Vec<InstanceData>> = BTreeMap::new();
    for cmd in commands {
        groups
            .entry((cmd.kind, cmd.fill))
            .or_default()
            .push(InstanceData::from_command(cmd));
    }

    let mut combined = Vec::with_capacity(commands.len());
    let mut batches = Vec::with_capacity(groups.len());
    for ((kind, fill), instances) in groups {
        let start = combined.len() as u32;
        combined.extend_from_slice(&instances);
        batches.push(Batch {
            kind,
            fill,
            instances: start..combined.len() as u32,
        });
    }
    (combined, batches)
}

struct PrimitiveBuffers {
    vertices: wgpu::Buffer,
    triangles: wgpu::Buffer,
    triangle_count: u32,
    lines: wgpu::Buffer,
    line_count: u32,
}

/// wgpu-based primitive renderer.
pub struct WgpuRenderer {
    solid_pipeline: wgpu::RenderPipeline,
    wireframe_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    primitives: BTreeMap<ShapeKind, PrimitiveBuffers>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("primitive_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::PRIMITIVE_SHADER.into()),
        });

        let solid_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            FillMode::Solid,
        );
        let wireframe_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            FillMode::Wireframe,
        );

        let instance_buffer = Self::create_instance_buffer(device, INITIAL_INSTANCE_CAPACITY);
        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            solid_pipeline,
            wireframe_pipeline,
            uniform_buffer,
            uniform_bind_group,
            primitives: BTreeMap::new(),
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Upload the mesh for `kind` unless it is already resident.
    pub fn init_primitive(&mut self, device: &wgpu::Device, kind: ShapeKind) {
        if self.primitives.contains_key(&kind) {
            return;
        }
        let m = mesh(kind);
        let vertices: Vec<Vertex> = m
            .positions
            .iter()
            .zip(&m.normals)
            .map(|(&position, &normal)| Vertex { position, normal })
            .collect();
        let label = kind.name();
        let buffers = PrimitiveBuffers {
            vertices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            triangles: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&m.triangles),
                usage: wgpu::BufferUsages::INDEX,
            }),
            triangle_count: m.triangles.len() as u32,
            lines: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&m.lines),
                usage: wgpu::BufferUsages::INDEX,
            }),
            line_count: m.lines.len() as u32,
        };
        self.primitives.insert(kind, buffers);
        tracing::info!(kind = label, vertices = vertices.len(), "primitive uploaded");
    }

    /// Draw one frame: clear, then every recorded command.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        frame: &FrameInfo,
        draws: &DrawList,
    ) {
        for kind in ShapeKind::ALL {
            if draws.is_initialized(kind) {
                self.init_primitive(device, kind);
            }
        }

        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: frame.view_projection().to_cols_array_2d(),
            }),
        );

        let (instances, batches) = batch_commands(draws.commands());
        self.ensure_instance_capacity(device, instances.len());
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for batch in &batches {
                let Some(buffers) = self.primitives.get(&batch.kind) else {
                    continue;
                };
                let (pipeline, indices, count) = match batch.fill {
                    FillMode::Solid => (
                        &self.solid_pipeline,
                        &buffers.triangles,
                        buffers.triangle_count,
                    ),
                    FillMode::Wireframe => (
                        &self.wireframe_pipeline,
                        &buffers.lines,
                        buffers.line_count,
                    ),
                };
                pass.set_pipeline(pipeline);
                pass.set_vertex_buffer(0, buffers.vertices.slice(..));
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..count, 0, batch.instances.clone());
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn ensure_instance_capacity(&mut self, device: &wgpu::Device, required: usize) {
        if required <= self.instance_capacity {
            return;
        }
        let capacity = required.next_power_of_two();
        tracing::debug!(from = self.instance_capacity, to = capacity, "growing instance buffer");
        self.instance_buffer = Self::create_instance_buffer(device, capacity);
        self.instance_capacity = capacity;
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (capacity * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
        fill: FillMode,
    ) -> wgpu::RenderPipeline {
        let (label, fragment_entry, topology) = match fill {
            FillMode::Solid => ("solid_pipeline", "fs_main", wgpu::PrimitiveTopology::TriangleList),
            FillMode::Wireframe => ("wireframe_pipeline", "fs_wire", wgpu::PrimitiveTopology::LineList),
        };
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                // Scaled primitives mix windings; draw both faces.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use helicity_common::Color;

    fn cmd(kind: ShapeKind, fill: FillMode, x: f32) -> DrawCommand {
        DrawCommand {
            kind,
            fill,
            model: Mat4::from_translation(Vec3::new(x, 0.0, 0.0)),
            color: Color::rgb(x / 10.0, 0.0, 0.0),
        }
    }

    #[test]
    fn empty_list_has_no_batches() {
        let (instances, batches) = batch_commands(&[]);
        assert!(instances.is_empty());
        assert!(batches.is_empty());
    }

    #[test]
    fn commands_are_grouped_per_kind_and_fill() {
        let commands = [
            cmd(ShapeKind::Cube, FillMode::Solid, 1.0),
            cmd(ShapeKind::Sphere, FillMode::Solid, 2.0),
            cmd(ShapeKind::Cube, FillMode::Solid, 3.0),
            cmd(ShapeKind::Cube, FillMode::Wireframe, 4.0),
        ];
        let (instances, batches) = batch_commands(&commands);
        assert_eq!(instances.len(), 4);
        assert_eq!(
            batches,
            vec![
                Batch {
                    kind: ShapeKind::Sphere,
                    fill: FillMode::Solid,
                    instances: 0..1
                },
                Batch {
                    kind: ShapeKind::Cube,
                    fill: FillMode::Solid,
                    instances: 1..3
                },
                Batch {
                    kind: ShapeKind::Cube,
                    fill: FillMode::Wireframe,
                    instances: 3..4
                },
            ]
        );
        // recording order survives inside a batch
        assert_eq!(instances[1].model_3[0], 1.0);
        assert_eq!(instances[2].model_3[0], 3.0);
    }

    #[test]
    fn instance_carries_model_and_color() {
        let c = cmd(ShapeKind::Pyramid, FillMode::Solid, 5.0);
        let data = InstanceData::from_command(&c);
        assert_eq!(data.model_3, [5.0, 0.0, 0.0, 1.0]);
        assert_eq!(data.color, [0.5, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn batches_cover_every_instance_once() {
        let commands: Vec<DrawCommand> = (0..50)
            .map(|i| {
                let kind = ShapeKind::ALL[i % 4];
                let fill = if i % 3 == 0 { FillMode::Wireframe } else { FillMode::Solid };
                cmd(kind, fill, i as f32)
            })
            .collect();
        let (instances, batches) = batch_commands(&commands);
        let mut next = 0;
        for b in &batches {
            assert_eq!(b.instances.start, next);
            next = b.instances.end;
        }
        assert_eq!(next as usize, instances.len());
        assert_eq!(instances.len(), commands.len());
    }
}
