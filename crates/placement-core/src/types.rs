use serde::{Deserialize, Serialize};

/// Width x height of a container, measured in grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// A rectangular occupant of the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub id: String,
    pub title: String,
    pub start_row: usize,
    pub start_col: usize,
    /// Inclusive: `start_row + height - 1`
    pub end_row: usize,
    /// Inclusive: `start_col + width - 1`
    pub end_col: usize,
    pub width: usize,
    pub height: usize,
    pub content_type: String,
}

impl Container {
    /// Builds a container anchored at `(start_row, start_col)`, deriving the end coordinates.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start_row: usize,
        start_col: usize,
        size: Size,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start_row,
            start_col,
            end_row: (start_row + size.height).saturating_sub(1),
            end_col: (start_col + size.width).saturating_sub(1),
            width: size.width,
            height: size.height,
            content_type: content_type.into(),
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Returns a copy moved to a new anchor and size; identity fields are kept verbatim.
    pub fn repositioned(&self, start_row: usize, start_col: usize, size: Size) -> Self {
        Self::new(
            self.id.clone(),
            self.title.clone(),
            start_row,
            start_col,
            size,
            self.content_type.clone(),
        )
    }

    /// True when the two cell sets intersect.
    pub fn overlaps(&self, other: &Container) -> bool {
        self.start_row <= other.end_row
            && other.start_row <= self.end_row
            && self.start_col <= other.end_col
            && other.start_col <= self.end_col
    }
}

/// A candidate rectangle of entirely free cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeRectangle {
    pub start_row: usize,
    pub start_col: usize,
    pub width: usize,
    pub height: usize,
    pub area: usize,
}

impl FreeRectangle {
    pub fn new(start_row: usize, start_col: usize, width: usize, height: usize) -> Self {
        Self {
            start_row,
            start_col,
            width,
            height,
            area: width * height,
        }
    }

    /// Whether a container of `size` fits inside this rectangle.
    pub fn can_hold(&self, size: Size) -> bool {
        self.width >= size.width && self.height >= size.height
    }
}

/// Requirements for the container being added
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContainer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content_type: String,
}

impl NewContainer {
    pub fn of_type(content_type: impl Into<String>) -> Self {
        Self {
            id: None,
            title: None,
            content_type: content_type.into(),
        }
    }
}

/// Input: the current layout plus the container to add
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRequest {
    #[serde(default)]
    pub existing_containers: Vec<Container>,
    pub new_container_requirements: NewContainer,
}

/// A placement request that also carries the grid size, as read from files or HTTP bodies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPlacementRequest {
    pub grid_size: usize,
    #[serde(flatten)]
    pub request: PlacementRequest,
}

/// A finished layout to be scored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub grid_size: usize,
    #[serde(default)]
    pub containers: Vec<Container>,
}

/// Score of a full layout, lower is better
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutScore {
    pub total: f64,
    pub wasted_cells: usize,
    pub fragmentation_penalty: f64,
    pub aspect_ratio_penalty: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorganizationDetails {
    /// Number of candidate layouts discovered by the search
    pub total_layouts: usize,
    pub wasted_cells: usize,
}

/// Result of a placement call
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementOutcome {
    /// The new container fit into free space; nothing else moved.
    Placed {
        placement: Container,
        new_layout: Vec<Container>,
    },
    /// Every container was repositioned.
    Reorganized {
        new_layout: Vec<Container>,
        score: f64,
        details: ReorganizationDetails,
    },
    /// The exhaustive search produced no candidate layout.
    NoValidReorganization,
    /// The configured search budget ran out before the search finished.
    BudgetExhausted { reason: String, layouts_explored: usize },
}

impl PlacementOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Placed { .. } | Self::Reorganized { .. })
    }

    /// The layout the caller should apply, if any.
    pub fn new_layout(&self) -> Option<&[Container]> {
        match self {
            Self::Placed { new_layout, .. } | Self::Reorganized { new_layout, .. } => {
                Some(new_layout.as_slice())
            }
            _ => None,
        }
    }
}

/// Output: the flat response document returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorganization_needed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<Container>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_layout: Option<Vec<Container>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorganization_details: Option<ReorganizationDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub budget_exhausted: bool,
}

impl From<PlacementOutcome> for PlacementResponse {
    fn from(outcome: PlacementOutcome) -> Self {
        let empty = Self {
            success: false,
            reorganization_needed: None,
            placement: None,
            new_layout: None,
            score: None,
            reorganization_details: None,
            error: None,
            budget_exhausted: false,
        };

        match outcome {
            PlacementOutcome::Placed {
                placement,
                new_layout,
            } => Self {
                success: true,
                reorganization_needed: Some(false),
                placement: Some(placement),
                new_layout: Some(new_layout),
                ..empty
            },
            PlacementOutcome::Reorganized {
                new_layout,
                score,
                details,
            } => Self {
                success: true,
                reorganization_needed: Some(true),
                new_layout: Some(new_layout),
                score: Some(score),
                reorganization_details: Some(details),
                ..empty
            },
            PlacementOutcome::NoValidReorganization => Self {
                error: Some(NO_VALID_REORGANIZATION.to_string()),
                ..empty
            },
            PlacementOutcome::BudgetExhausted {
                reason,
                layouts_explored,
            } => Self {
                error: Some(format!("search budget exhausted: {}", reason)),
                reorganization_details: Some(ReorganizationDetails {
                    total_layouts: layouts_explored,
                    wasted_cells: 0,
                }),
                budget_exhausted: true,
                ..empty
            },
        }
    }
}

pub const NO_VALID_REORGANIZATION: &str = "no valid reorganization found";

/// Error type for contract violations
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PlacementError>;
