use crate::types::{Container, FreeRectangle};

/// Boolean occupancy matrix over an N x N grid, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    size: usize,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    /// An entirely free grid.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![false; size * size],
        }
    }

    /// Marks every cell covered by any of the containers.
    ///
    /// Containers are expected to be validated; cells falling outside the
    /// grid are ignored.
    pub fn occupancy_of(size: usize, containers: &[Container]) -> Self {
        let mut grid = Self::new(size);
        if size == 0 {
            return grid;
        }
        for container in containers {
            for row in container.start_row..=container.end_row.min(size.saturating_sub(1)) {
                for col in container.start_col..=container.end_col.min(size.saturating_sub(1)) {
                    grid.cells[row * size + col] = true;
                }
            }
        }
        grid
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.size + col]
    }

    pub fn free_cell_count(&self) -> usize {
        self.cells.iter().filter(|occupied| !**occupied).count()
    }

    /// Whether a `width x height` rectangle anchored at `(row, col)` lies inside
    /// the grid and covers only free cells.
    pub fn fits(&self, row: usize, col: usize, width: usize, height: usize) -> bool {
        if width == 0 || height == 0 || row + height > self.size || col + width > self.size {
            return false;
        }
        (row..row + height).all(|r| (col..col + width).all(|c| !self.is_occupied(r, c)))
    }

    pub fn mark_occupied(&mut self, row: usize, col: usize, width: usize, height: usize) {
        self.set(row, col, width, height, true);
    }

    pub fn mark_free(&mut self, row: usize, col: usize, width: usize, height: usize) {
        self.set(row, col, width, height, false);
    }

    fn set(&mut self, row: usize, col: usize, width: usize, height: usize, value: bool) {
        for r in row..(row + height).min(self.size) {
            for c in col..(col + width).min(self.size) {
                self.cells[r * self.size + c] = value;
            }
        }
    }

    /// Returns every free rectangle anchored at every free cell.
    ///
    /// Anchors are visited row-major. From each anchor the width grows first;
    /// for every width the height grows until a covered cell is occupied. Every
    /// `(width, height)` that stays entirely free is recorded, so one anchor
    /// yields several overlapping candidates and callers can pick the tightest.
    pub fn find_free_rectangles(&self) -> Vec<FreeRectangle> {
        let mut rectangles = Vec::new();

        for row in 0..self.size {
            for col in 0..self.size {
                if self.is_occupied(row, col) {
                    continue;
                }

                for width in 1..=self.size - col {
                    if !self.fits(row, col, width, 1) {
                        break;
                    }
                    for height in 1..=self.size - row {
                        if !self.fits(row, col, width, height) {
                            break;
                        }
                        rectangles.push(FreeRectangle::new(row, col, width, height));
                    }
                }
            }
        }

        rectangles
    }

    /// Sizes of all 4-connected regions of free cells, in discovery order.
    pub fn free_regions(&self) -> Vec<usize> {
        let mut visited = vec![false; self.cells.len()];
        let mut regions = Vec::new();
        let mut stack = Vec::new();

        for start in 0..self.cells.len() {
            if self.cells[start] || visited[start] {
                continue;
            }

            let mut region = 0;
            visited[start] = true;
            stack.push(start);

            while let Some(idx) = stack.pop() {
                region += 1;
                let (row, col) = (idx / self.size, idx % self.size);

                let mut neighbors = Vec::with_capacity(4);
                if row > 0 {
                    neighbors.push(idx - self.size);
                }
                if row + 1 < self.size {
                    neighbors.push(idx + self.size);
                }
                if col > 0 {
                    neighbors.push(idx - 1);
                }
                if col + 1 < self.size {
                    neighbors.push(idx + 1);
                }

                for next in neighbors {
                    if !self.cells[next] && !visited[next] {
                        visited[next] = true;
                        stack.push(next);
                    }
                }
            }

            regions.push(region);
        }

        regions
    }
}
