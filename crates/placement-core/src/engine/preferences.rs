use crate::types::{FreeRectangle, PlacementError, Result, Size};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

const KPI: &[Size] = &[Size::new(1, 1)];
const WIDE_CHART: &[Size] = &[Size::new(2, 1), Size::new(2, 2), Size::new(1, 2)];
const ROUND_CHART: &[Size] = &[Size::new(1, 1), Size::new(2, 2)];
const TALL: &[Size] = &[Size::new(1, 2), Size::new(1, 3), Size::new(2, 2)];
const TEXT: &[Size] = &[Size::new(2, 1), Size::new(1, 1)];
const MAP: &[Size] = &[Size::new(2, 2), Size::new(3, 2), Size::new(2, 1)];
const GENERIC: &[Size] = &[Size::new(1, 1), Size::new(2, 1), Size::new(1, 2)];

/// Ordered size preferences keyed by content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizePreferences {
    table: BTreeMap<String, Vec<Size>>,
    fallback: Vec<Size>,
}

impl Default for SizePreferences {
    fn default() -> Self {
        let groups: [(&[&str], &[Size]); 6] = [
            (&["kpi_card", "kpi", "metric", "scalar"], KPI),
            (&["line_chart", "bar_chart", "area_chart", "chart"], WIDE_CHART),
            (&["pie_chart", "donut_chart"], ROUND_CHART),
            (&["table", "list"], TALL),
            (&["text", "markdown", "note"], TEXT),
            (&["map", "heatmap"], MAP),
        ];

        let mut table = BTreeMap::new();
        for (content_types, sizes) in groups {
            for content_type in content_types {
                table.insert(content_type.to_string(), sizes.to_vec());
            }
        }

        Self {
            table,
            fallback: GENERIC.to_vec(),
        }
    }
}

impl SizePreferences {
    /// A table with no entries; every content type resolves to `fallback`.
    pub fn empty(fallback: Vec<Size>) -> Self {
        Self {
            table: BTreeMap::new(),
            fallback,
        }
    }

    /// Adds or replaces the preference list for a content type.
    pub fn with_preference(mut self, content_type: impl Into<String>, sizes: Vec<Size>) -> Self {
        self.table.insert(content_type.into(), sizes);
        self
    }

    pub fn is_known(&self, content_type: &str) -> bool {
        self.table.contains_key(content_type)
    }

    /// Preferred sizes for a content type, most preferred first.
    ///
    /// Unknown content types get the generic list; this is lenient on purpose
    /// and only logged.
    pub fn preferred_sizes(&self, content_type: &str) -> &[Size] {
        match self.table.get(content_type) {
            Some(sizes) => sizes,
            None => {
                warn!(
                    content_type,
                    "Unrecognized content type, using generic size preferences"
                );
                &self.fallback
            }
        }
    }

    /// First preferred size that at least one free rectangle can hold.
    pub fn resolve(&self, content_type: &str, free: &[FreeRectangle]) -> Option<Size> {
        self.preferred_sizes(content_type)
            .iter()
            .copied()
            .find(|size| free.iter().any(|rect| rect.can_hold(*size)))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let lists = self
            .table
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .chain(std::iter::once(("<fallback>", &self.fallback)));

        for (content_type, sizes) in lists {
            if sizes.iter().any(|s| s.width == 0 || s.height == 0) {
                return Err(PlacementError::InvalidConfig(format!(
                    "Preference list for '{}' contains a zero-sized entry",
                    content_type
                )));
            }
        }
        Ok(())
    }
}
