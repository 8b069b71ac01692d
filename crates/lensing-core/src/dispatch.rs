use glam::UVec2;

/// What the loaded kernel can run per workgroup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelCapability {
    /// Execution-width granularity the hardware prefers for the x axis.
    pub preferred_width: u32,
    /// Upper bound on work items in a single workgroup.
    pub max_items_per_group: u32,
}

impl KernelCapability {
    /// Workgroup tile: preferred width across, as many rows as the item
    /// budget allows. Both sides are at least 1.
    pub fn tile(&self) -> UVec2 {
        let max_items = self.max_items_per_group.max(1);
        let width = self.preferred_width.clamp(1, max_items);
        UVec2::new(width, (max_items / width).max(1))
    }
}

/// How one frame's compute work covers the drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchShape {
    /// Work items per workgroup along x/y.
    pub tile: UVec2,
    /// Workgroups along x/y.
    pub groups: UVec2,
    /// Pixel size the grid was planned for.
    pub drawable: UVec2,
}

impl DispatchShape {
    /// Total work items dispatched along x/y (>= `drawable`).
    pub fn covered(&self) -> UVec2 {
        self.groups * self.tile
    }

    pub fn is_empty(&self) -> bool {
        self.groups.x == 0 || self.groups.y == 0
    }
}

/// One work item per pixel, rounded up to whole tiles.
pub fn plan(capability: KernelCapability, drawable: UVec2) -> DispatchShape {
    plan_with_tile(capability.tile(), drawable)
}

fn plan_with_tile(tile: UVec2, drawable: UVec2) -> DispatchShape {
    DispatchShape {
        tile,
        groups: UVec2::new(drawable.x.div_ceil(tile.x), drawable.y.div_ceil(tile.y)),
        drawable,
    }
}

/// Caches the tile (fixed once the kernel is loaded) and re-plans the grid
/// for each new drawable size.
#[derive(Debug, Clone)]
pub struct DispatchPlanner {
    tile: UVec2,
}

impl DispatchPlanner {
    pub fn new(capability: KernelCapability) -> Self {
        Self {
            tile: capability.tile(),
        }
    }

    pub fn tile(&self) -> UVec2 {
        self.tile
    }

    pub fn plan(&self, drawable: UVec2) -> DispatchShape {
        plan_with_tile(self.tile, drawable)
    }
}
