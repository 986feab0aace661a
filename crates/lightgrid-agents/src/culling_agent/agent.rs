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

//! Defines the `CullingAgent`, the frame-level driver of light culling.

use lightgrid_core::grid::GridDimensions;
use lightgrid_core::lane::{Lane, LaneError};
use lightgrid_core::renderer::{
    BufferId, BufferSlot, CullingCamera, CullingLight, DoubleBufferedUpload, GraphicsDevice,
};
use lightgrid_lanes::{
    GridConfig, LightGridAccumulator, LightGridPacker, PackStats, RasterLane, RasterStrategy,
    ScalarRasterLane, VectorisedRasterLane,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Label of the packed grid buffers.
const GRID_BUFFER_LABEL: &str = "Light Grid";

/// Strategy names of the built-in rasterizers.
const SCALAR_LANE: &str = "ScalarRaster";
const VECTORISED_LANE: &str = "VectorisedRaster";

/// Statistics of one culled frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Zero-based index of the frame since the agent was created.
    pub frame_index: u64,
    /// Strategy name of the rasterizer that ran.
    pub strategy: &'static str,
    /// Lights handed to the rasterizer.
    pub light_count: usize,
    /// Non-empty (cluster, light) fragments produced.
    pub fragments: usize,
    /// Packing summary.
    pub pack: PackStats,
    /// Bytes written to the GPU buffer.
    pub uploaded_bytes: usize,
    /// Slot holding this frame's grid.
    pub slot: BufferSlot,
    /// Wall time of the whole frame.
    pub frame_time: Duration,
}

/// The agent responsible for turning a light list into an uploaded light grid.
pub struct CullingAgent {
    // Current configuration, kept in sync with `set_grid`.
    config: GridConfig,
    // Graphics device owning the grid buffers.
    device: Arc<dyn GraphicsDevice>,
    // Available raster lanes (strategies).
    lanes: Vec<Box<dyn RasterLane>>,
    // Per-cluster lists, cleared every frame.
    accumulator: LightGridAccumulator,
    // Packs the lists into the GPU layout.
    packer: LightGridPacker,
    // The two GPU buffers. `None` after `shutdown`.
    upload: Option<DoubleBufferedUpload>,
    // Strategy that ran last, for change logging.
    last_strategy: Option<&'static str>,
    // --- Performance Metrics ---
    // Duration of the last `run_frame` call.
    last_frame_time: Duration,
    // Total number of frames culled since agent creation.
    frame_count: u64,
}

impl CullingAgent {
    /// Creates an agent with the built-in scalar and vectorised lanes.
    ///
    /// # Errors
    ///
    /// Returns [`LaneError::InitializationFailed`] if `config` is invalid or
    /// the grid buffers cannot be created.
    pub fn new(config: GridConfig, device: Arc<dyn GraphicsDevice>) -> Result<Self, LaneError> {
        config
            .validate()
            .map_err(|e| LaneError::InitializationFailed(Box::new(e)))?;
        let dims = config
            .dimensions()
            .map_err(|e| LaneError::InitializationFailed(Box::new(e)))?;
        let upload = DoubleBufferedUpload::new(
            device.as_ref(),
            config.initial_capacity_bytes,
            GRID_BUFFER_LABEL,
        )
        .map_err(|e| LaneError::InitializationFailed(Box::new(e)))?;

        let lanes: Vec<Box<dyn RasterLane>> = vec![
            Box::new(ScalarRasterLane::new()),
            Box::new(VectorisedRasterLane::new()),
        ];

        log::info!(
            "CullingAgent: created with grid {} and {:?} strategy",
            dims,
            config.strategy
        );

        Ok(Self {
            config,
            device,
            lanes,
            accumulator: LightGridAccumulator::with_dimensions(dims),
            packer: LightGridPacker::new(),
            upload: Some(upload),
            last_strategy: None,
            last_frame_time: Duration::ZERO,
            frame_count: 0,
        })
    }

    /// Changes the grid resolution. Takes effect on the next frame.
    pub fn set_grid(&mut self, dims: GridDimensions) {
        self.accumulator.reset(dims);
        self.config.width = dims.width;
        self.config.height = dims.height;
        self.config.depth = dims.depth;
    }

    /// The current grid resolution.
    pub fn grid(&self) -> GridDimensions {
        self.accumulator.dimensions().unwrap_or_default()
    }

    /// The current configuration.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Adds a custom raster lane to the available lanes.
    pub fn add_lane(&mut self, lane: Box<dyn RasterLane>) {
        self.lanes.push(lane);
    }

    /// Returns a reference to the available lanes.
    pub fn lanes(&self) -> &[Box<dyn RasterLane>] {
        &self.lanes
    }

    /// Sets the rasterizer strategy.
    pub fn set_strategy(&mut self, strategy: RasterStrategy) {
        self.config.strategy = strategy;
    }

    /// Returns the current rasterizer strategy.
    pub fn strategy(&self) -> RasterStrategy {
        self.config.strategy
    }

    /// Finds a lane index by strategy name, falling back to the first lane.
    fn lane_index(&self, name: &str) -> usize {
        self.lanes
            .iter()
            .position(|lane| lane.strategy_name() == name)
            .unwrap_or_else(|| {
                log::warn!(
                    "CullingAgent: no lane named '{}', falling back to {}",
                    name,
                    self.lanes[0].strategy_name()
                );
                0
            })
    }

    /// Index of the lane with the lowest cost estimate for this frame.
    fn cheapest_lane_index(&self, light_count: usize) -> usize {
        let dims = self.grid();
        self.lanes
            .iter()
            .map(|lane| lane.estimate_cost(light_count, &dims))
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map_or(0, |(index, _)| index)
    }

    fn select_lane_index(&self, light_count: usize) -> usize {
        match self.config.strategy {
            RasterStrategy::Scalar => self.lane_index(SCALAR_LANE),
            RasterStrategy::Vectorised => self.lane_index(VECTORISED_LANE),
            RasterStrategy::Auto => {
                if light_count > self.config.auto_vectorise_threshold {
                    self.lane_index(VECTORISED_LANE)
                } else {
                    self.cheapest_lane_index(light_count)
                }
            }
        }
    }

    /// Selects the raster lane for a frame with `light_count` lights.
    ///
    /// With [`RasterStrategy::Auto`], counts above the configured threshold
    /// always get the vectorised lane. Otherwise the lane with the lowest
    /// [`estimate_cost`](Lane::estimate_cost) wins, ties going to the lane
    /// added first.
    pub fn select_lane(&self, light_count: usize) -> &dyn RasterLane {
        self.lanes[self.select_lane_index(light_count)].as_ref()
    }

    /// Culls one frame and uploads the packed grid.
    ///
    /// The pipeline is:
    /// 1. Clears every per-cluster list.
    /// 2. Rasterizes `lights` with the selected lane.
    /// 3. Packs the lists and uploads the used prefix into the buffer the
    ///    shading stage is not reading, then makes it current.
    ///
    /// # Arguments
    ///
    /// * `lights`: Lights in culling space.
    /// * `camera`: Projection terms and depth range of the view.
    ///
    /// # Errors
    ///
    /// - [`LaneError::NotInitialized`] after [`shutdown`](Self::shutdown).
    /// - [`LaneError::InvalidInput`] for a camera with an empty depth range.
    /// - [`LaneError::ExecutionFailed`] if the upload fails. The previous
    ///   grid stays current in that case.
    pub fn run_frame(
        &mut self,
        lights: &[CullingLight],
        camera: &CullingCamera,
    ) -> Result<FrameStats, LaneError> {
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(LaneError::InvalidInput {
                expected: "camera with 0 < near < far",
                received: format!("near {} far {}", camera.near, camera.far),
            });
        }
        let lane_index = self.select_lane_index(lights.len());
        let upload = self.upload.as_mut().ok_or(LaneError::NotInitialized)?;
        let frame_start = Instant::now();

        // Step 1: Start from empty lists.
        self.accumulator.clear_all_fragments();

        // Step 2: Rasterize with the selected lane.
        let lane = &self.lanes[lane_index];
        let strategy = lane.strategy_name();
        if self.last_strategy != Some(strategy) {
            log::debug!(
                "CullingAgent: switching to {} for {} lights",
                strategy,
                lights.len()
            );
            self.last_strategy = Some(strategy);
        }
        lane.rasterize(lights, camera, &mut self.accumulator);

        // Step 3: Pack and upload.
        let pack = self
            .packer
            .build_and_upload(&self.accumulator, upload, self.device.as_ref())
            .map_err(|e| {
                log::error!("CullingAgent: failed to upload light grid: {}", e);
                LaneError::ExecutionFailed(Box::new(e))
            })?;

        self.last_frame_time = frame_start.elapsed();
        let stats = FrameStats {
            frame_index: self.frame_count,
            strategy,
            light_count: lights.len(),
            fragments: self.accumulator.fragment_count(),
            pack,
            uploaded_bytes: pack.allocated_bytes,
            slot: upload.current(),
            frame_time: self.last_frame_time,
        };
        self.frame_count += 1;

        log::trace!(
            "CullingAgent: frame {} {} fragments, {} bytes uploaded to {:?}",
            stats.frame_index,
            stats.fragments,
            stats.uploaded_bytes,
            stats.slot
        );
        Ok(stats)
    }

    /// The buffer the shading stage should read, or `None` after shutdown.
    pub fn current_buffer(&self) -> Option<BufferId> {
        self.upload.as_ref().map(DoubleBufferedUpload::current_buffer)
    }

    /// The slot the shading stage should read, or `None` after shutdown.
    pub fn current_slot(&self) -> Option<BufferSlot> {
        self.upload.as_ref().map(DoubleBufferedUpload::current)
    }

    /// The per-cluster lists of the last frame.
    pub fn accumulator(&self) -> &LightGridAccumulator {
        &self.accumulator
    }

    /// The packed bytes of the last frame, as uploaded.
    pub fn packed_bytes(&self) -> &[u8] {
        self.packer.packed_bytes()
    }

    /// Returns the duration of the last frame.
    pub fn last_frame_time(&self) -> Duration {
        self.last_frame_time
    }

    /// Returns the total number of frames culled.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Releases the GPU buffers. Later frames fail with
    /// [`LaneError::NotInitialized`].
    pub fn shutdown(&mut self) {
        if let Some(upload) = self.upload.take() {
            upload.destroy(self.device.as_ref());
            log::info!(
                "CullingAgent: shut down after {} frames",
                self.frame_count
            );
        }
    }
}

impl std::fmt::Debug for CullingAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CullingAgent")
            .field("config", &self.config)
            .field(
                "lanes",
                &self.lanes.iter().map(|l| l.strategy_name()).collect::<Vec<_>>(),
            )
            .field("upload", &self.upload)
            .field("frame_count", &self.frame_count)
            .finish()
    }
}
