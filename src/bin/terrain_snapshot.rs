//! Terrain Snapshot
//!
//! Headless demonstration host: builds a synthetic seabed around a centre
//! point, renders one terrain frame offscreen and writes it as a PNG.
//!
//! Usage: `terrain_snapshot [output.png] [config.json]`
//!
//! Set `RUST_LOG=info` (or `debug`) to see the renderer's setup and frame logs.

use std::sync::Arc;

use seabed_terrain_engine::mercator::{lat_from_mercator_y, mercator_x_from_lng, mercator_y_from_lat};
use seabed_terrain_engine::render::DemTexture;
use seabed_terrain_engine::{
    CameraFrame, ElevationSummary, ElevationTileEntry, FrameContext, FrameOutcome, GpuContext,
    PropAsset, PropMesh, PropPlacement, PropVertex, RegionOfInterest, TerrainAssets, TerrainConfig,
    TerrainHost, TerrainRenderer, TileKey, VisibleTile,
};

const WIDTH: u32 = 1024;
const HEIGHT: u32 = 768;
const CENTER: [f64; 2] = [120.43, 32.03];
const ZOOM: f64 = 9.5;
/// DEM samples per edge, plus a one-texel border on each side
const DEM_SIZE: u32 = 64;
const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

type SnapshotResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Host with a fixed camera and a fixed set of procedurally filled tiles.
struct SnapshotHost {
    camera: CameraFrame,
    tiles: Vec<VisibleTile<DemTexture>>,
    summaries: Vec<ElevationSummary>,
    repaints: u32,
}

impl TerrainHost for SnapshotHost {
    type Texture = DemTexture;

    fn camera(&self) -> CameraFrame {
        self.camera
    }

    fn visible_tiles(&self) -> Vec<VisibleTile<DemTexture>> {
        self.tiles.clone()
    }

    fn elevation_summaries(&self) -> Vec<ElevationSummary> {
        self.summaries.clone()
    }

    fn request_repaint(&mut self) {
        self.repaints += 1;
    }

    fn register_overlay_region(&mut self, ring: &[[f64; 2]]) {
        log::info!("[SnapshotHost] Overlay region registered ({} vertices)", ring.len());
    }
}

/// Seabed elevation in metres: a shelf dropping into a channel, with ripples.
fn seabed_elevation(mercator_x: f64, mercator_y: f64) -> f32 {
    let lng = mercator_x * 360.0 - 180.0;
    let lat = lat_from_mercator_y(mercator_y);
    let dx = (lng - CENTER[0]) * 8.0;
    let dy = (lat - CENTER[1]) * 8.0;
    let channel = -14.0 * (-(dx - 0.3 * dy).powi(2)).exp();
    let shelf = 3.0 - 2.5 * (dx * 0.7).tanh();
    let ripples = 0.6 * (dx * 9.0).sin() * (dy * 7.0).cos();
    (channel + shelf + ripples) as f32
}

/// DEM samples of one tile, border included.
fn tile_samples(key: &TileKey) -> Vec<f32> {
    let size = DEM_SIZE + 2;
    let tiles = key.tiles_per_axis() as f64;
    (0..size)
        .flat_map(|row| (0..size).map(move |col| (col, row)))
        .map(|(col, row)| {
            let u = (col as f64 - 0.5) / DEM_SIZE as f64;
            let v = (row as f64 - 0.5) / DEM_SIZE as f64;
            seabed_elevation((key.x as f64 + u) / tiles, (key.y as f64 + v) / tiles)
        })
        .collect()
}

fn build_host(ctx: &GpuContext) -> SnapshotHost {
    let camera = CameraFrame::looking_at(CENTER, ZOOM, 55.0, -20.0, 36.87, WIDTH as f64, HEIGHT as f64);
    let z = ZOOM.floor() as u8;
    let tiles_per_axis = 1u32 << z;
    let cx = (mercator_x_from_lng(CENTER[0]) * tiles_per_axis as f64) as i64;
    let cy = (mercator_y_from_lat(CENTER[1]) * tiles_per_axis as f64) as i64;

    let mut tiles = Vec::new();
    let mut summaries = Vec::new();
    for dy in -2..=2i64 {
        for dx in -2..=2i64 {
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x >= tiles_per_axis as i64 || y >= tiles_per_axis as i64 {
                continue;
            }
            let key = TileKey::new(z, x as u32, y as u32);
            let samples = tile_samples(&key);
            let (_, view) = ctx.create_elevation_texture(&format!("DEM {key}"), DEM_SIZE + 2, &samples);
            if let Some(summary) = ElevationSummary::from_samples(&samples) {
                summaries.push(summary);
            }
            let entry = ElevationTileEntry::new(key, Arc::new(view), DEM_SIZE + 2);
            tiles.push(VisibleTile::new(key, camera.world_size).with_elevation(entry));
        }
    }

    log::info!("[SnapshotHost] {} tiles at zoom {z}", tiles.len());

    SnapshotHost {
        camera,
        tiles,
        summaries,
        repaints: 0,
    }
}

/// A small textured marker box standing on the seabed.
fn marker_prop() -> PropAsset {
    let corners = [
        [-1.0, 0.0, -1.0],
        [1.0, 0.0, -1.0],
        [1.0, 0.0, 1.0],
        [-1.0, 0.0, 1.0],
        [-1.0, 2.0, -1.0],
        [1.0, 2.0, -1.0],
        [1.0, 2.0, 1.0],
        [-1.0, 2.0, 1.0],
    ];
    let vertices = corners
        .iter()
        .map(|&[x, y, z]| PropVertex {
            position: [x, y, z],
            normal: [x * 0.577, (y - 1.0) * 0.577, z * 0.577],
            uv: [(x + 1.0) * 0.5, y * 0.5],
        })
        .collect();
    let indices = vec![
        0, 1, 2, 2, 3, 0, 4, 6, 5, 6, 4, 7, 0, 4, 5, 5, 1, 0, 1, 5, 6, 6, 2, 1, 2, 6, 7, 7, 3, 2, 3, 7, 4, 4, 0, 3,
    ];
    let texture = image::RgbaImage::from_pixel(2, 2, image::Rgba([230, 90, 40, 255]));
    PropAsset::new(
        PropPlacement {
            lng: CENTER[0],
            lat: CENTER[1],
            scale: 5e-6,
            heading_deg: 20.0,
        },
        vec![PropMesh::new("marker", vertices, indices, texture).spinning()],
    )
}

fn create_attachment(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Copy the colour output into a tightly packed RGBA image.
fn read_back(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture) -> SnapshotResult<image::RgbaImage> {
    let unpadded = WIDTH * 4;
    let bytes_per_row = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Snapshot Readback"),
        size: (bytes_per_row * HEIGHT) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Snapshot Copy Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(HEIGHT),
            },
        },
        wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::PollType::wait_indefinitely())?;
    rx.recv()??;

    let data = slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((unpadded * HEIGHT) as usize);
    for row in 0..HEIGHT {
        let start = (row * bytes_per_row) as usize;
        pixels.extend_from_slice(&data[start..start + unpadded as usize]);
    }
    drop(data);
    buffer.unmap();

    image::RgbaImage::from_raw(WIDTH, HEIGHT, pixels).ok_or_else(|| "readback size mismatch".into())
}

fn main() -> SnapshotResult<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let output = args.next().unwrap_or_else(|| "terrain_snapshot.png".to_string());
    let config = match args.next() {
        Some(path) => TerrainConfig::from_json_file(&path)?,
        None => TerrainConfig::default(),
    };

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))?;
    log::info!("[Snapshot] Adapter: {}", adapter.get_info().name);

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("Terrain Snapshot Device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        ..Default::default()
    }))?;

    let ctx = GpuContext::new(&device, &queue, COLOR_FORMAT, WIDTH, HEIGHT);
    let mut host = build_host(&ctx);

    let shelf_region = RegionOfInterest::from_convex_ring(&[
        [CENTER[0] - 0.4, CENTER[1] - 0.3],
        [CENTER[0] + 0.4, CENTER[1] - 0.3],
        [CENTER[0] + 0.4, CENTER[1] + 0.3],
        [CENTER[0] - 0.4, CENTER[1] + 0.3],
    ])?;
    let assets = TerrainAssets::placeholder(config.deep_color.0, config.shallow_color.0)
        .with_region(shelf_region)
        .with_prop(marker_prop());

    let mut renderer = TerrainRenderer::new(config)?;
    renderer.setup(&ctx, &assets, &mut host)?;

    let (color_texture, color_view) = create_attachment(
        &device,
        "Snapshot Colour",
        COLOR_FORMAT,
        wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
    );
    let (_depth_texture, depth_view) = create_attachment(
        &device,
        "Snapshot Depth",
        ctx.depth_format,
        wgpu::TextureUsages::RENDER_ATTACHMENT,
    );

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Snapshot Frame Encoder"),
    });
    {
        // the host's own background, which the terrain composites over
        let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Snapshot Clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.86,
                        g: 0.88,
                        b: 0.9,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
    }

    let mut frame = FrameContext {
        encoder: &mut encoder,
        color_view: &color_view,
        depth_view: &depth_view,
        time: 0.0,
    };
    let outcome = renderer.render(&ctx, &mut frame, &mut host);
    queue.submit(std::iter::once(encoder.finish()));

    match outcome {
        FrameOutcome::Rendered(stats) => log::info!(
            "[Snapshot] Frame {}: {} of {} tiles drawn, {} repaint requests",
            stats.frame_index,
            stats.drawn_tiles,
            stats.visible_tiles,
            host.repaints
        ),
        FrameOutcome::Idle(reason) => {
            return Err(format!("renderer idled: {reason:?}").into());
        }
    }

    let snapshot = read_back(&device, &queue, &color_texture)?;
    snapshot.save(&output)?;
    println!("Wrote {output}");
    Ok(())
}
