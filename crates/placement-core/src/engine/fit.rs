use super::*;

impl PlacementEngine {
    /// Best-fit placement into existing free space.
    ///
    /// The target size is the first preferred size that fits anywhere. Among the
    /// free rectangles that can hold it, the one wasting the least area wins;
    /// on equal waste the rectangle found first by the row-major scan wins.
    pub(super) fn find_placement(
        &self,
        existing: &[Container],
        requirements: &NewContainer,
    ) -> Option<Container> {
        let grid = OccupancyGrid::occupancy_of(self.grid_size, existing);
        let free = grid.find_free_rectangles();

        let target = self
            .config
            .preferences
            .resolve(&requirements.content_type, &free)?;

        let mut best: Option<(&FreeRectangle, usize)> = None;
        for rect in free.iter().filter(|rect| rect.can_hold(target)) {
            let waste = rect.area - target.area();
            match best {
                None => best = Some((rect, waste)),
                Some((_, best_waste)) if waste < best_waste => best = Some((rect, waste)),
                _ => {}
            }
        }

        let (rect, _) = best?;
        let (id, title) = self.new_identity(existing, requirements);

        Some(Container::new(
            id,
            title,
            rect.start_row,
            rect.start_col,
            target,
            requirements.content_type.clone(),
        ))
    }
}
