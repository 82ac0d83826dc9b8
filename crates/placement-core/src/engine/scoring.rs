use super::*;

/// Penalty for every free region smaller than `MIN_FREE_REGION` cells.
const FRAGMENT_PENALTY: f64 = 0.5;
const MIN_FREE_REGION: usize = 2;

/// Penalty for every container whose long side exceeds `MAX_ASPECT_RATIO` times its short side.
const ELONGATION_PENALTY: f64 = 0.3;
const MAX_ASPECT_RATIO: f64 = 3.0;

impl PlacementEngine {
    /// Wasted cells + fragmentation penalty + aspect-ratio penalty.
    pub(super) fn score_layout(&self, containers: &[Container]) -> LayoutScore {
        let grid = OccupancyGrid::occupancy_of(self.grid_size, containers);
        let sizes: Vec<Size> = containers.iter().map(Container::size).collect();
        self.score_occupancy(&grid, &sizes)
    }

    /// Scores a layout given its occupancy and the sizes placed on it. The
    /// reorganization search calls this directly with its working grid.
    pub(super) fn score_occupancy(&self, grid: &OccupancyGrid, sizes: &[Size]) -> LayoutScore {
        let used: usize = sizes.iter().map(Size::area).sum();
        let wasted_cells = self.total_cells().saturating_sub(used);

        let fragmentation_penalty = grid
            .free_regions()
            .into_iter()
            .filter(|&cells| cells < MIN_FREE_REGION)
            .count() as f64
            * FRAGMENT_PENALTY;

        let aspect_ratio_penalty = sizes.iter().filter(|s| is_elongated(**s)).count() as f64
            * ELONGATION_PENALTY;

        LayoutScore {
            total: wasted_cells as f64 + fragmentation_penalty + aspect_ratio_penalty,
            wasted_cells,
            fragmentation_penalty,
            aspect_ratio_penalty,
        }
    }
}

fn is_elongated(size: Size) -> bool {
    let long = size.width.max(size.height) as f64;
    let short = size.width.min(size.height).max(1) as f64;
    long / short > MAX_ASPECT_RATIO
}
