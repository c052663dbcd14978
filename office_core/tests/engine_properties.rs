use office_core::{EngineConfig, OfficeEngine, OfficeError, OfficeState, Position, Tile};
use rand::{Rng, SeedableRng, rngs::StdRng};

const BORDERED_5X5: &str = "
WL WL WL WL WL
WL ST FL FL WL
WL FL CH FL WL
WL FL FL FL WL
WL WL WL WL WL
";

fn engine_with(blueprint: &str) -> OfficeEngine {
    let engine = OfficeEngine::new(EngineConfig {
        blueprint: blueprint.to_string(),
        ..EngineConfig::default()
    });
    engine.initialize().expect("initialize");
    engine
}

#[test]
fn bordered_office_scenario() {
    let engine = engine_with(BORDERED_5X5);
    assert_eq!(
        engine.get_state().unwrap().character_position,
        Position::new(1, 1)
    );

    engine.move_character(2, 1).expect("move to (2, 1)");
    assert_eq!(
        engine.get_state().unwrap().character_position,
        Position::new(2, 1)
    );

    engine.move_character(2, 2).expect("move onto the chair");
    assert_eq!(
        engine.get_state().unwrap().character_position,
        Position::new(2, 2)
    );

    let description = engine.interact_with_element("chair-1").expect("sit");
    assert!(description.contains("sit"));

    assert_eq!(
        engine.move_character(0, 0),
        Err(OfficeError::Blocked { x: 0, y: 0 })
    );
    assert_eq!(
        engine.get_state().unwrap().character_position,
        Position::new(2, 2)
    );
}

#[test]
fn random_moves_follow_grid_rules() {
    let engine = OfficeEngine::default();
    engine.initialize().unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..500 {
        let before = engine.get_state().unwrap();
        let x = rng.random_range(0..before.width() + 3);
        let y = rng.random_range(0..before.height() + 3);
        let result = engine.move_character(x, y);
        let after = engine.get_state().unwrap();

        match before.tile_at(Position::new(x, y)) {
            None => {
                assert!(matches!(result, Err(OfficeError::OutOfBounds { .. })));
                assert_eq!(after, before);
            }
            Some(Tile::Wall) => {
                assert_eq!(result, Err(OfficeError::Blocked { x, y }));
                assert_eq!(after, before);
            }
            Some(_) => {
                assert_eq!(result, Ok(()));
                assert_eq!(after.character_position, Position::new(x, y));
                assert_eq!(after.grid, before.grid);
                assert_eq!(after.elements, before.elements);
            }
        }
    }
}

#[test]
fn unknown_ids_are_never_found() {
    let engine = OfficeEngine::default();
    engine.initialize().unwrap();
    let office = engine.get_state().unwrap();

    for ((x, y), tile) in office.grid.enumerate() {
        if *tile == Tile::Wall {
            continue;
        }
        engine.move_character(x, y).unwrap();
        assert_eq!(
            engine.interact_with_element("filing-cabinet-1"),
            Err(OfficeError::NotFound {
                id: "filing-cabinet-1".to_string()
            })
        );
    }
}

#[test]
fn every_element_answers_in_range_and_refuses_far_away() {
    let engine = OfficeEngine::default();
    engine.initialize().unwrap();
    let office = engine.get_state().unwrap();
    let range = engine.config().interaction_range;

    for element in &office.elements {
        for ((x, y), tile) in office.grid.enumerate() {
            if *tile == Tile::Wall {
                continue;
            }
            engine.move_character(x, y).unwrap();
            let distance = element.position.manhattan_distance(&Position::new(x, y));
            let result = engine.interact_with_element(&element.id);
            if distance <= range {
                assert!(!result.expect("in range").is_empty());
            } else {
                assert_eq!(
                    result,
                    Err(OfficeError::TooFar {
                        id: element.id.clone(),
                        distance,
                        range
                    })
                );
            }
        }
    }
}

#[test]
fn initialize_is_repeatable() {
    let once = OfficeEngine::default();
    once.initialize().unwrap();

    let twice = OfficeEngine::default();
    twice.initialize().unwrap();
    twice.initialize().unwrap();

    assert_eq!(once.get_state().unwrap(), twice.get_state().unwrap());
}

#[test]
fn default_office_keeps_elements_off_walls() {
    let engine = OfficeEngine::default();
    engine.initialize().unwrap();
    let office = engine.get_state().unwrap();

    assert!(office.is_walkable(office.character_position));
    let mut ids: Vec<&str> = office.elements.iter().map(|e| e.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), office.elements.len());
    for element in &office.elements {
        assert_ne!(office.tile_at(element.position), Some(Tile::Wall));
    }
}

#[test]
fn snapshot_serializes_layout_as_tile_codes() {
    let engine = engine_with(BORDERED_5X5);
    let office = engine.get_state().unwrap();

    let json = serde_json::to_value(&office).expect("serialize");
    assert_eq!(json["layout"][0][0], 1);
    assert_eq!(json["layout"][1][2], 0);
    assert_eq!(json["layout"][2][2], 3);
    assert_eq!(json["characterPosition"]["x"], 1);
    assert_eq!(json["elements"][0]["id"], "chair-1");
    assert_eq!(json["elements"][0]["kind"], "chair");

    let back: OfficeState = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, office);
}
