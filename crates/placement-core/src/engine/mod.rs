use crate::config::EngineConfig;
use crate::types::*;
use tracing::debug;

mod fit;
mod grid;
mod preferences;
mod reorganize;
mod scoring;
#[cfg(test)]
mod tests;

pub use grid::OccupancyGrid;
pub use preferences::SizePreferences;

/// Places containers on a fixed N x N grid.
///
/// A request first tries to fit the new container into free space. When that
/// fails, every container is re-laid out by an exhaustive search and the
/// lowest scoring layout wins. The engine holds no state between calls.
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    grid_size: usize,
    config: EngineConfig,
}

impl PlacementEngine {
    /// Builds an engine with the default configuration.
    pub fn new(grid_size: usize) -> Result<Self> {
        Self::with_config(grid_size, EngineConfig::default())
    }

    /// Validates the grid size and configuration and builds an engine.
    pub fn with_config(grid_size: usize, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        if grid_size == 0 {
            return Err(PlacementError::InvalidInput(
                "Grid size must be at least 1".to_string(),
            ));
        }
        if grid_size > config.max_grid_size || grid_size.checked_mul(grid_size).is_none() {
            return Err(PlacementError::InvalidInput(format!(
                "Grid size {} exceeds the maximum of {}",
                grid_size, config.max_grid_size
            )));
        }

        Ok(Self { grid_size, config })
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn total_cells(&self) -> usize {
        self.grid_size * self.grid_size
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the full placement flow: non-disruptive first, reorganization second.
    pub fn place(&self, request: &PlacementRequest) -> Result<PlacementOutcome> {
        let existing = &request.existing_containers;
        let requirements = &request.new_container_requirements;
        self.validate_request(existing, requirements)?;

        if let Some(placement) = self.find_placement(existing, requirements) {
            debug!(
                id = %placement.id,
                row = placement.start_row,
                col = placement.start_col,
                "Placed container without moving existing ones"
            );
            let mut new_layout = existing.clone();
            new_layout.push(placement.clone());
            return Ok(PlacementOutcome::Placed {
                placement,
                new_layout,
            });
        }

        debug!(
            existing = existing.len(),
            "No free space for new container, reorganizing"
        );
        Ok(self.search_reorganization(existing, requirements))
    }

    /// Tries to fit the new container into free space without moving anything.
    /// `Ok(None)` means there is no room and a reorganization is needed.
    pub fn place_without_moving(
        &self,
        existing: &[Container],
        requirements: &NewContainer,
    ) -> Result<Option<Container>> {
        self.validate_request(existing, requirements)?;
        Ok(self.find_placement(existing, requirements))
    }

    /// Re-lays out every existing container plus the new one.
    pub fn reorganize(
        &self,
        existing: &[Container],
        requirements: &NewContainer,
    ) -> Result<PlacementOutcome> {
        self.validate_request(existing, requirements)?;
        Ok(self.search_reorganization(existing, requirements))
    }

    /// Scores a complete layout. Lower is better.
    pub fn score(&self, containers: &[Container]) -> Result<LayoutScore> {
        self.validate_containers(containers)?;
        Ok(self.score_layout(containers))
    }

    fn validate_request(&self, existing: &[Container], requirements: &NewContainer) -> Result<()> {
        if requirements.content_type.trim().is_empty() {
            return Err(PlacementError::InvalidInput(
                "New container must declare a content type".to_string(),
            ));
        }
        self.validate_containers(existing)
    }

    /// Rejects containers with inconsistent coordinates, cells outside the grid,
    /// or overlapping cell sets.
    fn validate_containers(&self, containers: &[Container]) -> Result<()> {
        for container in containers {
            if container.width == 0 || container.height == 0 {
                return Err(PlacementError::InvalidInput(format!(
                    "Container '{}' has a zero dimension",
                    container.id
                )));
            }

            // Bounds first, so the end coordinates below cannot overflow.
            let n = self.grid_size;
            if container.start_row >= n
                || container.start_col >= n
                || container.height > n - container.start_row
                || container.width > n - container.start_col
            {
                return Err(PlacementError::InvalidInput(format!(
                    "Container '{}' extends outside the {}x{} grid",
                    container.id, n, n
                )));
            }

            if container.end_row != container.start_row + container.height - 1
                || container.end_col != container.start_col + container.width - 1
            {
                return Err(PlacementError::InvalidInput(format!(
                    "Container '{}' has end coordinates inconsistent with its size",
                    container.id
                )));
            }
        }

        for (i, a) in containers.iter().enumerate() {
            if let Some(b) = containers[i + 1..].iter().find(|b| a.overlaps(b)) {
                return Err(PlacementError::InvalidInput(format!(
                    "Containers '{}' and '{}' overlap",
                    a.id, b.id
                )));
            }
        }

        Ok(())
    }

    /// Identity for the new container, synthesized when the request has none.
    fn new_identity(
        &self,
        existing: &[Container],
        requirements: &NewContainer,
    ) -> (String, String) {
        let mut k = existing.len() + 1;
        while existing.iter().any(|c| c.id == format!("container-{}", k)) {
            k += 1;
        }

        let id = requirements
            .id
            .clone()
            .unwrap_or_else(|| format!("container-{}", k));
        let title = requirements
            .title
            .clone()
            .unwrap_or_else(|| format!("Container {}", k));
        (id, title)
    }
}
