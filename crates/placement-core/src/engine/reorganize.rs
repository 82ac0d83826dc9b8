use super::*;
use crate::config::FactorizationFallback;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Why a budgeted search stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exhausted {
    Partitions(usize),
    Candidates(usize),
    Deadline(Duration),
}

impl Exhausted {
    fn reason(&self) -> String {
        match self {
            Self::Partitions(max) => format!("more than {} partitions", max),
            Self::Candidates(max) => format!("more than {} candidate layouts", max),
            Self::Deadline(limit) => format!("time limit of {} ms reached", limit.as_millis()),
        }
    }
}

impl PlacementEngine {
    /// Exhaustive reorganization of every existing container plus the new one.
    ///
    /// Search order is canonical: partitions first-part-ascending, factorizations
    /// width-ascending, size combinations with the last slot varying fastest,
    /// positions row-major. The strictly lowest score wins, so the first layout
    /// found in that order wins every tie.
    pub(super) fn search_reorganization(
        &self,
        existing: &[Container],
        requirements: &NewContainer,
    ) -> PlacementOutcome {
        let slots = existing.len() + 1;
        let budget = self.config.budget;

        let (id, title) = self.new_identity(existing, requirements);
        let new_container = Container::new(
            id,
            title,
            0,
            0,
            Size::new(1, 1),
            requirements.content_type.clone(),
        );

        let mut search = Search {
            engine: self,
            existing,
            new_container: &new_container,
            grid: OccupancyGrid::new(self.grid_size),
            positions: Vec::with_capacity(slots),
            layouts_found: 0,
            best: None,
            started: Instant::now(),
            time_limit: budget.time_limit(),
            max_candidates: budget.max_candidates,
        };

        if let Err(exhausted) = search.run(self.total_cells(), slots, budget.max_partitions) {
            return self.exhausted(exhausted, search.layouts_found);
        }

        let total_layouts = search.layouts_found;
        match search.best {
            None => {
                info!(slots, "Reorganization found no valid layout");
                PlacementOutcome::NoValidReorganization
            }
            Some((new_layout, score)) => {
                info!(
                    slots,
                    total_layouts,
                    score = score.total,
                    "Reorganization complete"
                );
                PlacementOutcome::Reorganized {
                    new_layout,
                    score: score.total,
                    details: ReorganizationDetails {
                        total_layouts,
                        wasted_cells: score.wasted_cells,
                    },
                }
            }
        }
    }

    fn exhausted(&self, exhausted: Exhausted, layouts_explored: usize) -> PlacementOutcome {
        let reason = exhausted.reason();
        warn!(%reason, layouts_explored, "Reorganization search budget exhausted");
        PlacementOutcome::BudgetExhausted {
            reason,
            layouts_explored,
        }
    }

    /// Candidate sizes for each part of a partition, or `None` when the
    /// partition is rejected.
    fn size_options(&self, partition: &[usize]) -> Option<Vec<Vec<Size>>> {
        let mut options = Vec::with_capacity(partition.len());

        for &cells in partition {
            let mut sizes = factorizations(cells, self.grid_size);
            if sizes.is_empty() {
                match self.config.factorization_fallback {
                    FactorizationFallback::Reject => return None,
                    FactorizationFallback::UnitPlaceholder => sizes.push(Size::new(1, 1)),
                }
            }
            options.push(sizes);
        }

        Some(options)
    }
}

/// Working state of the backtracking search.
struct Search<'a> {
    engine: &'a PlacementEngine,
    existing: &'a [Container],
    new_container: &'a Container,
    grid: OccupancyGrid,
    positions: Vec<(usize, usize)>,
    layouts_found: usize,
    best: Option<(Vec<Container>, LayoutScore)>,
    started: Instant,
    time_limit: Option<Duration>,
    max_candidates: Option<usize>,
}

impl Search<'_> {
    /// Walks partitions lazily, stopping at the first exhausted budget.
    fn run(
        &mut self,
        total: usize,
        slots: usize,
        max_partitions: Option<usize>,
    ) -> std::result::Result<(), Exhausted> {
        for (seen, partition) in Compositions::new(total, slots).enumerate() {
            if let Some(max) = max_partitions {
                if seen >= max {
                    return Err(Exhausted::Partitions(max));
                }
            }
            self.check_deadline()?;

            let Some(options) = self.engine.size_options(&partition) else {
                continue;
            };

            for sizes in SizeCombinations::new(&options) {
                self.check_deadline()?;
                self.place_slot(&sizes, 0)?;
            }
        }

        Ok(())
    }

    fn check_deadline(&self) -> std::result::Result<(), Exhausted> {
        match self.time_limit {
            Some(limit) if self.started.elapsed() >= limit => Err(Exhausted::Deadline(limit)),
            _ => Ok(()),
        }
    }

    /// Assigns `sizes[slot..]` to every free position in turn, recording each
    /// complete assignment. Always backtracks, so all placements are explored.
    fn place_slot(&mut self, sizes: &[Size], slot: usize) -> std::result::Result<(), Exhausted> {
        self.check_deadline()?;

        if slot == sizes.len() {
            return self.record(sizes);
        }

        let size = sizes[slot];
        let n = self.grid.size();

        for row in 0..n {
            for col in 0..n {
                if !self.grid.fits(row, col, size.width, size.height) {
                    continue;
                }

                self.grid.mark_occupied(row, col, size.width, size.height);
                self.positions.push((row, col));

                let result = self.place_slot(sizes, slot + 1);

                self.positions.pop();
                self.grid.mark_free(row, col, size.width, size.height);
                result?;
            }
        }

        Ok(())
    }

    fn record(&mut self, sizes: &[Size]) -> std::result::Result<(), Exhausted> {
        if let Some(max) = self.max_candidates {
            if self.layouts_found >= max {
                return Err(Exhausted::Candidates(max));
            }
        }
        self.layouts_found += 1;

        let score = self.engine.score_occupancy(&self.grid, sizes);
        let improves = match &self.best {
            None => true,
            Some((_, best)) => score.total < best.total,
        };

        if improves {
            let layout = self
                .positions
                .iter()
                .zip(sizes)
                .enumerate()
                .map(|(slot, (&(row, col), &size))| {
                    self.existing
                        .get(slot)
                        .unwrap_or(self.new_container)
                        .repositioned(row, col, size)
                })
                .collect();
            self.best = Some((layout, score));
        }

        Ok(())
    }
}

/// Every ordered way to write `total` as `parts` positive integers, in
/// lexicographic order (first part ascending). Produced one at a time.
struct Compositions {
    current: Vec<usize>,
    done: bool,
}

impl Compositions {
    fn new(total: usize, parts: usize) -> Self {
        let done = parts == 0 || total < parts;
        let mut current = vec![1; parts];
        if let Some(last) = current.last_mut() {
            *last = total.saturating_sub(parts - 1);
        }
        Self { current, done }
    }
}

impl Iterator for Compositions {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.current.clone();

        // Bump the rightmost part whose tail still has slack, then reset the
        // tail to its smallest shape: all ones with the remainder last.
        let n = self.current.len();
        let mut tail = self.current[n - 1];
        let mut i = n - 1;
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            if tail > n - 1 - i {
                self.current[i] += 1;
                self.current[i + 1..n - 1].fill(1);
                self.current[n - 1] = tail - 1 - (n - 2 - i);
                break;
            }
            tail += self.current[i];
        }

        Some(item)
    }
}

/// All `width x height == cells` with both sides at most `bound`, width ascending.
fn factorizations(cells: usize, bound: usize) -> Vec<Size> {
    (1..=bound)
        .filter(|&width| cells % width == 0 && cells / width <= bound)
        .map(|width| Size::new(width, cells / width))
        .collect()
}

/// Cartesian product over per-slot size options; the last slot varies fastest.
struct SizeCombinations<'a> {
    options: &'a [Vec<Size>],
    indices: Vec<usize>,
    done: bool,
}

impl<'a> SizeCombinations<'a> {
    fn new(options: &'a [Vec<Size>]) -> Self {
        Self {
            options,
            indices: vec![0; options.len()],
            done: options.is_empty() || options.iter().any(Vec::is_empty),
        }
    }
}

impl Iterator for SizeCombinations<'_> {
    type Item = Vec<Size>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let current = self
            .indices
            .iter()
            .zip(self.options)
            .map(|(&i, sizes)| sizes[i])
            .collect();

        // Advance the odometer.
        let mut slot = self.indices.len();
        loop {
            if slot == 0 {
                self.done = true;
                break;
            }
            slot -= 1;
            self.indices[slot] += 1;
            if self.indices[slot] < self.options[slot].len() {
                break;
            }
            self.indices[slot] = 0;
        }

        Some(current)
    }
}
