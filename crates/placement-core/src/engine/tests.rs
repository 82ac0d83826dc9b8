use super::*;
use crate::config::{FactorizationFallback, SearchBudget, DEFAULT_MAX_GRID_SIZE};
use std::time::{Duration, Instant};

fn container(id: &str, row: usize, col: usize, width: usize, height: usize) -> Container {
    Container::new(
        id,
        format!("Title {}", id),
        row,
        col,
        Size::new(width, height),
        "table",
    )
}

fn request(existing: Vec<Container>, content_type: &str) -> PlacementRequest {
    PlacementRequest {
        existing_containers: existing,
        new_container_requirements: NewContainer::of_type(content_type),
    }
}

/// Checks bounds, coordinate consistency and pairwise disjointness.
fn assert_valid_layout(grid_size: usize, layout: &[Container]) {
    for c in layout {
        assert!(c.width > 0 && c.height > 0, "{} has a zero dimension", c.id);
        assert_eq!(c.end_row, c.start_row + c.height - 1);
        assert_eq!(c.end_col, c.start_col + c.width - 1);
        assert!(c.end_row < grid_size && c.end_col < grid_size, "{} out of bounds", c.id);
    }
    for (i, a) in layout.iter().enumerate() {
        for b in &layout[i + 1..] {
            assert!(!a.overlaps(b), "{} overlaps {}", a.id, b.id);
        }
    }
}

fn unwrap_reorganized(outcome: PlacementOutcome) -> (Vec<Container>, f64, ReorganizationDetails) {
    match outcome {
        PlacementOutcome::Reorganized {
            new_layout,
            score,
            details,
        } => (new_layout, score, details),
        other => panic!("expected a reorganization, got {:?}", other),
    }
}

#[test]
fn test_kpi_card_on_empty_grid() {
    let engine = PlacementEngine::new(3).unwrap();
    let outcome = engine.place(&request(vec![], "kpi_card")).unwrap();

    match outcome {
        PlacementOutcome::Placed {
            placement,
            new_layout,
        } => {
            assert_eq!((placement.start_row, placement.start_col), (0, 0));
            assert_eq!(placement.size(), Size::new(1, 1));
            assert_eq!(placement.content_type, "kpi_card");
            assert_eq!(new_layout, vec![placement]);
        }
        other => panic!("expected a non-disruptive placement, got {:?}", other),
    }
}

#[test]
fn test_full_grid_triggers_reorganization() {
    let engine = PlacementEngine::new(3).unwrap();
    let existing = vec![container("a", 0, 0, 3, 3)];
    let outcome = engine.place(&request(existing, "line_chart")).unwrap();

    let (layout, score, details) = unwrap_reorganized(outcome);
    assert_eq!(layout.len(), 2);
    assert_valid_layout(3, &layout);

    let used: usize = layout.iter().map(Container::area).sum();
    assert_eq!(details.wasted_cells + used, 9);

    // Canonical order: partition (3, 6), sizes 1x3 then 2x3, first position wins.
    assert_eq!(details.total_layouts, 8);
    assert_eq!(score, 0.0);
    assert_eq!((layout[0].start_row, layout[0].start_col), (0, 0));
    assert_eq!(layout[0].size(), Size::new(1, 3));
    assert_eq!((layout[1].start_row, layout[1].start_col), (0, 1));
    assert_eq!(layout[1].size(), Size::new(2, 3));
}

#[test]
fn test_unknown_content_type_falls_back_to_generic_sizes() {
    let engine = PlacementEngine::new(3).unwrap();
    let outcome = engine.place(&request(vec![], "hologram")).unwrap();

    match outcome {
        PlacementOutcome::Placed { placement, .. } => {
            assert_eq!(placement.size(), Size::new(1, 1));
            assert_eq!(placement.content_type, "hologram");
        }
        other => panic!("expected a non-disruptive placement, got {:?}", other),
    }
}

#[test]
fn test_best_fit_prefers_tightest_rectangle() {
    let engine = PlacementEngine::new(3).unwrap();
    // Only column 2 is free.
    let existing = vec![container("a", 0, 0, 2, 3)];

    let placement = engine
        .place_without_moving(&existing, &NewContainer::of_type("line_chart"))
        .unwrap()
        .unwrap();

    // 2x1 and 2x2 fit nowhere, so the chart falls back to 1x2.
    assert_eq!(placement.size(), Size::new(1, 2));
    assert_eq!((placement.start_row, placement.start_col), (0, 2));
}

#[test]
fn test_best_fit_tie_goes_to_first_scanned_cell() {
    let engine = PlacementEngine::new(3).unwrap();
    let existing = vec![container("a", 0, 0, 1, 1)];

    let placement = engine
        .place_without_moving(&existing, &NewContainer::of_type("kpi_card"))
        .unwrap()
        .unwrap();

    assert_eq!((placement.start_row, placement.start_col), (0, 1));
}

#[test]
fn test_non_disruptive_keeps_existing_containers() {
    let engine = PlacementEngine::new(4).unwrap();
    let existing = vec![container("a", 0, 0, 2, 2), container("b", 2, 2, 2, 2)];
    let outcome = engine.place(&request(existing.clone(), "table")).unwrap();

    match outcome {
        PlacementOutcome::Placed {
            placement,
            new_layout,
        } => {
            assert_eq!(new_layout.len(), 3);
            assert_eq!(&new_layout[..2], &existing[..]);
            assert_eq!(new_layout[2], placement);
            assert_valid_layout(4, &new_layout);
        }
        other => panic!("expected a non-disruptive placement, got {:?}", other),
    }
}

#[test]
fn test_free_cells_in_wrong_shape_still_reorganize() {
    let engine = PlacementEngine::new(2).unwrap();
    // The free bottom row cannot hold any tall table shape.
    let existing = vec![container("a", 0, 0, 2, 1)];

    assert!(engine
        .place_without_moving(&existing, &NewContainer::of_type("table"))
        .unwrap()
        .is_none());

    let outcome = engine.place(&request(existing, "table")).unwrap();
    let (layout, score, details) = unwrap_reorganized(outcome);
    assert_eq!(details.total_layouts, 4);
    assert_eq!(score, 0.0);
    assert_eq!(layout[0].id, "a");
    assert_eq!(layout[0].size(), Size::new(1, 2));
    assert_eq!((layout[1].start_row, layout[1].start_col), (0, 1));
}

#[test]
fn test_reorganization_preserves_identity_fields() {
    let engine = PlacementEngine::new(3).unwrap();
    let mut a = container("a", 0, 0, 3, 3);
    a.content_type = "map".to_string();

    let req = PlacementRequest {
        existing_containers: vec![a],
        new_container_requirements: NewContainer {
            id: Some("sales".to_string()),
            title: Some("Sales".to_string()),
            content_type: "bar_chart".to_string(),
        },
    };
    let (layout, _, _) = unwrap_reorganized(engine.place(&req).unwrap());

    assert_eq!(layout[0].id, "a");
    assert_eq!(layout[0].title, "Title a");
    assert_eq!(layout[0].content_type, "map");
    assert_eq!(layout[1].id, "sales");
    assert_eq!(layout[1].title, "Sales");
    assert_eq!(layout[1].content_type, "bar_chart");
}

#[test]
fn test_synthesized_id_skips_taken_ids() {
    let engine = PlacementEngine::new(3).unwrap();
    let existing = vec![container("container-2", 0, 0, 1, 1)];

    let placement = engine
        .place_without_moving(&existing, &NewContainer::of_type("kpi_card"))
        .unwrap()
        .unwrap();

    assert_eq!(placement.id, "container-3");
    assert_eq!(placement.title, "Container 3");
}

#[test]
fn test_elongated_shapes_lose_to_compact_ones() {
    let engine = PlacementEngine::new(4).unwrap();
    let existing = vec![container("a", 0, 0, 4, 4)];

    let outcome = engine.place(&request(existing, "text")).unwrap();
    let (layout, score, details) = unwrap_reorganized(outcome);

    // 1x4 + 3x4 is found first but carries an aspect-ratio penalty.
    assert_eq!(details.total_layouts, 12);
    assert_eq!(score, 0.0);
    assert_eq!(layout[0].size(), Size::new(2, 4));
    assert_eq!(layout[1].size(), Size::new(2, 4));
    assert_eq!((layout[1].start_row, layout[1].start_col), (0, 2));
}

#[test]
fn test_search_space_grows_with_grid_size() {
    let mut previous = 0;
    for size in 2..=4 {
        let engine = PlacementEngine::new(size).unwrap();
        let existing = vec![container("a", 0, 0, size, size)];
        let (_, _, details) = unwrap_reorganized(
            engine
                .reorganize(&existing, &NewContainer::of_type("kpi_card"))
                .unwrap(),
        );
        assert!(details.total_layouts >= previous);
        previous = details.total_layouts;
    }
    assert_eq!(previous, 12);
}

#[test]
fn test_unit_placeholder_fallback_counts_extra_layouts() {
    let existing = vec![container("a", 0, 0, 2, 2)];
    let req = NewContainer::of_type("kpi_card");

    let strict = PlacementEngine::new(2).unwrap();
    let (_, _, details) = unwrap_reorganized(strict.reorganize(&existing, &req).unwrap());
    assert_eq!(details.total_layouts, 4);

    let config = EngineConfig::new().with_fallback(FactorizationFallback::UnitPlaceholder);
    let lenient = PlacementEngine::with_config(2, config).unwrap();
    let (layout, score, details) = unwrap_reorganized(lenient.reorganize(&existing, &req).unwrap());

    // Partitions (1, 3) and (3, 1) each become two 1x1 slots: 12 layouts apiece.
    assert_eq!(details.total_layouts, 28);
    assert_eq!(score, 0.0);
    assert_eq!(details.wasted_cells, 0);
    assert_eq!(layout[0].size(), Size::new(1, 2));
}

#[test]
fn test_no_valid_reorganization() {
    let engine = PlacementEngine::new(1).unwrap();
    let existing = vec![container("a", 0, 0, 1, 1)];
    let outcome = engine.place(&request(existing, "kpi_card")).unwrap();

    assert_eq!(outcome, PlacementOutcome::NoValidReorganization);
    assert!(!outcome.is_success());

    let response = PlacementResponse::from(outcome);
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some(NO_VALID_REORGANIZATION));
}

#[test]
fn test_candidate_budget() {
    let existing = vec![container("a", 0, 0, 3, 3)];
    let req = NewContainer::of_type("kpi_card");

    let tight = EngineConfig::new().with_budget(SearchBudget::unlimited().with_max_candidates(3));
    let engine = PlacementEngine::with_config(3, tight).unwrap();
    match engine.reorganize(&existing, &req).unwrap() {
        PlacementOutcome::BudgetExhausted {
            layouts_explored, ..
        } => assert_eq!(layouts_explored, 3),
        other => panic!("expected budget exhaustion, got {:?}", other),
    }

    let exact = EngineConfig::new().with_budget(SearchBudget::unlimited().with_max_candidates(8));
    let engine = PlacementEngine::with_config(3, exact).unwrap();
    assert!(engine.reorganize(&existing, &req).unwrap().is_success());
}

#[test]
fn test_partition_budget() {
    let config = EngineConfig::new().with_budget(SearchBudget::unlimited().with_max_partitions(2));
    let engine = PlacementEngine::with_config(3, config).unwrap();
    let outcome = engine
        .reorganize(&[container("a", 0, 0, 3, 3)], &NewContainer::of_type("kpi_card"))
        .unwrap();

    let response = PlacementResponse::from(outcome);
    assert!(!response.success);
    assert!(response.budget_exhausted);
    assert_eq!(response.reorganization_details.unwrap().total_layouts, 0);
    assert!(response.error.unwrap().contains("partitions"));
}

#[test]
fn test_zero_budget_is_rejected() {
    let config = EngineConfig::new().with_budget(SearchBudget::unlimited().with_max_candidates(0));
    assert!(matches!(
        PlacementEngine::with_config(3, config),
        Err(PlacementError::InvalidConfig(_))
    ));
}

#[test]
fn test_identical_requests_give_identical_output() {
    let engine = PlacementEngine::new(3).unwrap();
    let req = request(vec![container("a", 0, 0, 3, 1), container("b", 1, 0, 3, 2)], "pie_chart");

    let run = || {
        let response = PlacementResponse::from(engine.place(&req).unwrap());
        assert_eq!(response.reorganization_needed, Some(true));
        serde_json::to_string(&response).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_reorganization_keeps_slot_order_for_several_containers() {
    let engine = PlacementEngine::new(3).unwrap();
    let existing = vec![container("a", 0, 0, 3, 1), container("b", 1, 0, 3, 2)];
    let outcome = engine.place(&request(existing, "kpi_card")).unwrap();

    let (layout, score, details) = unwrap_reorganized(outcome);
    assert_valid_layout(3, &layout);

    let ids: Vec<_> = layout.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "container-3"]);
    let titles: Vec<_> = layout.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, ["Title a", "Title b", "Container 3"]);
    let types: Vec<_> = layout.iter().map(|c| c.content_type.as_str()).collect();
    assert_eq!(types, ["table", "table", "kpi_card"]);

    let used: usize = layout.iter().map(Container::area).sum();
    assert_eq!(details.wasted_cells + used, 9);

    // Every tiling of 3x3 into three rectangles (18) under each of the 3! slot
    // assignments. All score 0, so partition (1, 2, 6) with 1x1, 1x2, 2x3 wins.
    assert_eq!(details.total_layouts, 108);
    assert_eq!(score, 0.0);
    assert_eq!((layout[0].start_row, layout[0].start_col), (0, 0));
    assert_eq!(layout[0].size(), Size::new(1, 1));
    assert_eq!((layout[1].start_row, layout[1].start_col), (1, 0));
    assert_eq!(layout[1].size(), Size::new(1, 2));
    assert_eq!((layout[2].start_row, layout[2].start_col), (0, 1));
    assert_eq!(layout[2].size(), Size::new(2, 3));
}

#[test]
fn test_time_limit_stops_a_large_search() {
    let budget = SearchBudget::unlimited().with_time_limit(10);
    let engine = PlacementEngine::with_config(7, EngineConfig::new().with_budget(budget)).unwrap();
    let existing = vec![
        container("a", 0, 0, 7, 3),
        container("b", 3, 0, 4, 4),
        container("c", 3, 4, 3, 2),
        container("d", 5, 4, 3, 1),
        container("e", 6, 4, 3, 1),
    ];

    let started = Instant::now();
    let outcome = engine.place(&request(existing, "kpi_card")).unwrap();
    let elapsed = started.elapsed();

    match outcome {
        PlacementOutcome::BudgetExhausted { reason, .. } => {
            assert!(reason.contains("time limit"), "unexpected reason: {}", reason)
        }
        other => panic!("expected budget exhaustion, got {:?}", other),
    }
    assert!(elapsed < Duration::from_secs(1), "search ran for {:?}", elapsed);
}

#[test]
fn test_grid_size_is_capped() {
    assert!(PlacementEngine::new(DEFAULT_MAX_GRID_SIZE).is_ok());
    assert!(matches!(
        PlacementEngine::new(DEFAULT_MAX_GRID_SIZE + 1),
        Err(PlacementError::InvalidInput(_))
    ));
    assert!(matches!(
        PlacementEngine::new(usize::MAX),
        Err(PlacementError::InvalidInput(_))
    ));

    // Even an unbounded cap cannot admit a grid whose cell count overflows.
    let unbounded = EngineConfig::new().with_max_grid_size(usize::MAX);
    assert!(matches!(
        PlacementEngine::with_config(usize::MAX, unbounded.clone()),
        Err(PlacementError::InvalidInput(_))
    ));
    assert!(PlacementEngine::with_config(64, unbounded).is_ok());

    assert!(matches!(
        PlacementEngine::with_config(3, EngineConfig::new().with_max_grid_size(0)),
        Err(PlacementError::InvalidConfig(_))
    ));
}

#[test]
fn test_extreme_coordinates_are_rejected() {
    let engine = PlacementEngine::new(3).unwrap();
    let far_away = Container {
        id: "far".to_string(),
        title: "Far".to_string(),
        start_row: usize::MAX,
        start_col: 0,
        end_row: usize::MAX,
        end_col: 0,
        width: 1,
        height: 1,
        content_type: "table".to_string(),
    };
    let mut too_tall = far_away.clone();
    too_tall.start_row = 1;
    too_tall.height = usize::MAX;

    for bad in [far_away, too_tall] {
        assert!(matches!(
            engine.place(&request(vec![bad.clone()], "kpi_card")),
            Err(PlacementError::InvalidInput(_))
        ));
        assert!(matches!(engine.score(&[bad]), Err(PlacementError::InvalidInput(_))));
    }
}

#[test]
fn test_invalid_input_fails_fast() {
    assert!(PlacementEngine::new(0).is_err());

    let engine = PlacementEngine::new(3).unwrap();

    let out_of_bounds = request(vec![container("a", 2, 2, 2, 1)], "kpi_card");
    assert!(matches!(engine.place(&out_of_bounds), Err(PlacementError::InvalidInput(_))));

    let mut inconsistent = container("a", 0, 0, 1, 1);
    inconsistent.end_col = 2;
    assert!(engine.place(&request(vec![inconsistent], "kpi_card")).is_err());

    let overlapping = request(
        vec![container("a", 0, 0, 2, 2), container("b", 1, 1, 2, 2)],
        "kpi_card",
    );
    assert!(engine.place(&overlapping).is_err());

    assert!(engine.place(&request(vec![], "  ")).is_err());
}

#[test]
fn test_score_public_entry_point() {
    let engine = PlacementEngine::new(3).unwrap();
    let score = engine.score(&[container("a", 0, 0, 3, 2)]).unwrap();
    assert_eq!(score.wasted_cells, 3);
    assert_eq!(score.total, 3.0);

    assert!(engine.score(&[container("a", 0, 0, 4, 1)]).is_err());
}

#[test]
fn test_response_wire_format() {
    let engine = PlacementEngine::new(3).unwrap();
    let outcome = engine.place(&request(vec![], "kpi_card")).unwrap();
    let json = serde_json::to_value(PlacementResponse::from(outcome)).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["reorganizationNeeded"], false);
    assert_eq!(json["placement"]["startRow"], 0);
    assert_eq!(json["placement"]["contentType"], "kpi_card");
    assert_eq!(json["newLayout"].as_array().unwrap().len(), 1);
    assert!(json.get("error").is_none());
    assert!(json.get("budgetExhausted").is_none());
}

#[test]
fn test_grid_request_parses_flattened_fields() {
    let json = r#"{
        "gridSize": 3,
        "existingContainers": [],
        "newContainerRequirements": {"contentType": "kpi_card"}
    }"#;
    let parsed: GridPlacementRequest = serde_json::from_str(json).unwrap();
    assert_eq!(parsed.grid_size, 3);
    assert!(parsed.request.existing_containers.is_empty());
    assert_eq!(parsed.request.new_container_requirements.id, None);
}
