// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// LightGrid Sandbox
// Drives the culling agent over an orbiting synthetic light field.
//
// Usage: sandbox [config.ron] [light-count] [frames]

use std::sync::Arc;

use anyhow::{Context, Result};
use lightgrid_agents::culling_agent::{CullingAgent, FrameStats};
use lightgrid_core::math::{degrees_to_radians, Mat4, Vec3};
use lightgrid_core::renderer::{
    CullingCamera, CullingLight, LightFlags, MemoryDevice, PackedGridView,
};
use lightgrid_lanes::GridConfig;

const DEFAULT_LIGHT_COUNT: u16 = 256;
const DEFAULT_FRAMES: u64 = 8;

fn load_config(path: Option<&str>) -> Result<GridConfig> {
    let Some(path) = path else {
        return Ok(GridConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read grid config '{path}'"))?;
    let config = GridConfig::from_ron_str(&text)
        .with_context(|| format!("Invalid grid config '{path}'"))?;
    log::info!("Loaded grid config from '{}'", path);
    Ok(config)
}

/// Lights on rings around the world origin, advancing with `time`.
fn light_field(count: u16, time: f32) -> Vec<(Vec3, f32, LightFlags)> {
    (0..count)
        .map(|i| {
            let t = i as f32;
            let ring = 4.0 + (i % 8) as f32 * 3.0;
            let angle = t * 2.399 + time * (0.2 + (i % 5) as f32 * 0.05);
            let position = Vec3::new(angle.cos() * ring, (t * 0.61).sin() * 2.0, angle.sin() * ring);
            let mut flags = LightFlags::ENABLED;
            if i % 16 == 0 {
                flags |= LightFlags::CASTS_SHADOW;
            }
            (position, 1.0 + (t * 0.37) % 3.0, flags)
        })
        .collect()
}

fn log_frame(stats: &FrameStats) {
    log::info!(
        "frame {:>3} | {:<16} | {:>5} lights | {:>6} fragments | {:>6} cells lit | longest {:>3} | {:>8} bytes | {:?}",
        stats.frame_index,
        stats.strategy,
        stats.light_count,
        stats.fragments,
        stats.pack.non_empty_sub_cells,
        stats.pack.max_list_length,
        stats.uploaded_bytes,
        stats.frame_time
    );
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(args.first().map(String::as_str))?;
    let light_count = match args.get(1) {
        Some(arg) => arg.parse().with_context(|| format!("Invalid light count '{arg}'"))?,
        None => DEFAULT_LIGHT_COUNT,
    };
    let frames = match args.get(2) {
        Some(arg) => arg.parse().with_context(|| format!("Invalid frame count '{arg}'"))?,
        None => DEFAULT_FRAMES,
    };

    let device = Arc::new(MemoryDevice::new());
    let mut agent = CullingAgent::new(config, device.clone())?;

    let camera = CullingCamera::perspective(degrees_to_radians(60.0), 16.0 / 9.0, 0.5, 60.0);
    let view = Mat4::look_at_rh(Vec3::new(0.0, 6.0, 30.0), Vec3::ZERO, Vec3::Y)
        .context("Degenerate camera orientation")?;

    for frame in 0..frames {
        let lights: Vec<CullingLight> = light_field(light_count, frame as f32 * 0.1)
            .into_iter()
            .enumerate()
            .map(|(i, (position, radius, flags))| {
                CullingLight::from_world(&view, position, radius, flags, i as u16)
            })
            .collect();

        let stats = agent.run_frame(&lights, &camera)?;
        log_frame(&stats);
    }

    let dims = agent.grid();
    let grid = PackedGridView::new(agent.packed_bytes(), dims);
    let (x, y, z) = (dims.width / 2, dims.height / 2, dims.depth / 2);
    log::info!(
        "centre sub-cell ({}, {}, {}) lists lights {:?}",
        x,
        y,
        z,
        grid.lights(x, y, z)
    );
    log::info!(
        "{} bytes written over {} uploads",
        device.bytes_written(),
        device.write_count()
    );

    agent.shutdown();
    Ok(())
}
