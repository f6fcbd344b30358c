//! Engine-level behavior: setup, command surface, fog and replay.

use rust_empire::core::{Coord, EngineConfig, PlayerId, RejectReason};
use rust_empire::fog::Visibility;
use rust_empire::terrain::Terrain;
use rust_empire::turn::{Command, CommandEffect, Engine, Mode, WorldBuilder};
use rust_empire::units::UnitClass;
use rust_empire::{CommandError, RaiderCommander};

const P1: PlayerId = PlayerId::new(0);
const P2: PlayerId = PlayerId::new(1);

fn self_play(engine: &mut Engine, player_turns: usize) {
    let mut raider = RaiderCommander;
    for _ in 0..player_turns {
        if engine.is_over() {
            break;
        }
        engine.play_commander_turn(&mut raider);
    }
}

// =============================================================================
// Setup
// =============================================================================

/// Every player gets a distinct home city, its starting Army and an Army order.
#[test]
fn test_generated_game_seats_players() {
    for players in [2, 3, 4] {
        let engine = Engine::new(EngineConfig::default().with_players(players)).unwrap();

        assert_eq!(engine.active_player(), P1);
        assert_eq!(engine.mode(), Mode::Orders);
        assert_eq!(engine.turn_number(), 0);

        for player in PlayerId::all(players) {
            let cities: Vec<_> = engine.registry().cities_of(player).collect();
            assert_eq!(cities.len(), 1, "{player} home count");
            assert_eq!(cities[0].production, Some(UnitClass::Army));

            let units: Vec<_> = engine.registry().units_of(player).collect();
            assert_eq!(units.len(), 1);
            assert!(units[0].coord.distance(cities[0].coord) <= 1);
        }
        assert!(engine.registry().cities().any(|c| c.is_neutral()));
    }
}

#[test]
fn test_same_seed_same_game() {
    let a = Engine::new(EngineConfig::default().with_seed(11)).unwrap();
    let b = Engine::new(EngineConfig::default().with_seed(11)).unwrap();
    let c = Engine::new(EngineConfig::default().with_seed(12)).unwrap();

    assert_eq!(a.snapshot(), b.snapshot());
    assert_ne!(a.grid(), c.grid());
}

#[test]
fn test_invalid_player_count_rejected() {
    assert!(Engine::new(EngineConfig::default().with_players(1)).is_err());
    assert!(Engine::new(EngineConfig::default().with_players(9)).is_err());
}

// =============================================================================
// Command surface
// =============================================================================

fn skirmish() -> Engine {
    let mut config = EngineConfig::default().with_grid(10, 6);
    config.city_vision_radius = 1;
    WorldBuilder::new(config)
        .paint_rect(Coord::new(0, 0), Coord::new(6, 5), Terrain::Land)
        .city(Coord::new(0, 0), Some(P1))
        .producing(UnitClass::Army)
        .city(Coord::new(6, 5), Some(P2))
        .unit(P1, UnitClass::Army, Coord::new(2, 2))
        .unit(P1, UnitClass::Destroyer, Coord::new(7, 0))
        .unit(P2, UnitClass::Army, Coord::new(3, 3))
        .build()
        .unwrap()
}

/// Rejected commands leave every piece of state untouched.
#[test]
fn test_rejections_are_all_or_nothing() {
    let mut engine = skirmish();
    let destroyer = engine.registry().unit_at(Coord::new(7, 0)).unwrap().id;
    let before = engine.snapshot();

    let attempts = [
        (Command::MoveUnit(Coord::new(1, 1)), RejectReason::NoUnitSelected),
        (Command::SelectUnit(engine.registry().unit_at(Coord::new(3, 3)).unwrap().id), RejectReason::NotOwned),
    ];
    for (command, reason) in attempts {
        assert_eq!(engine.execute(command), Err(CommandError::Illegal(reason)));
        assert_eq!(engine.snapshot(), before);
    }

    engine.select_unit(destroyer).unwrap();
    let selected = engine.snapshot();
    let moves = [
        (Coord::new(6, 0), RejectReason::WrongTerrain),
        (Coord::new(10, 0), RejectReason::OutOfBounds),
        (Coord::new(7, 0), RejectReason::SameTile),
        (Coord::new(9, 4), RejectReason::InsufficientMovement),
    ];
    for (destination, reason) in moves {
        assert_eq!(engine.move_unit(destination), Err(CommandError::Illegal(reason)));
        assert_eq!(engine.snapshot(), selected);
    }
}

#[test]
fn test_friendly_stacking_forbidden() {
    let mut engine = WorldBuilder::new(EngineConfig::default().with_grid(5, 5))
        .filled(Terrain::Land)
        .city(Coord::new(0, 0), Some(P1))
        .city(Coord::new(4, 4), Some(P2))
        .unit(P1, UnitClass::Army, Coord::new(2, 2))
        .unit(P1, UnitClass::Army, Coord::new(2, 3))
        .build()
        .unwrap();
    let first = engine.registry().unit_at(Coord::new(2, 2)).unwrap().id;
    engine.select_unit(first).unwrap();

    assert_eq!(
        engine.move_unit(Coord::new(2, 3)),
        Err(CommandError::Illegal(RejectReason::FriendlyOccupied))
    );
    assert_eq!(engine.registry().unit(first).unwrap().moves_left, 1);
}

/// Attacking stops the attacker on its staging tile and removes the loser.
#[test]
fn test_engage_resolves_combat() {
    let mut engine = skirmish();
    let army = engine.registry().unit_at(Coord::new(2, 2)).unwrap().id;
    let enemy = engine.registry().unit_at(Coord::new(3, 3)).unwrap().id;
    let rng_before = engine.rng_state();

    engine.select_unit(army).unwrap();
    let effect = engine.move_unit(Coord::new(3, 3)).unwrap();

    let CommandEffect::Engaged {
        attacker,
        defender,
        staging,
        attacker_won,
        probability,
        casualty,
    } = effect
    else {
        panic!("expected an engagement, got {effect:?}");
    };
    assert_eq!((attacker, defender), (army, enemy));
    assert_eq!(staging, Coord::new(2, 2));
    assert!((probability - 0.5).abs() < 1e-12);
    assert_ne!(engine.rng_state(), rng_before);

    let (winner, loser) = if attacker_won { (army, enemy) } else { (enemy, army) };
    assert_eq!(casualty, loser);
    assert!(engine.registry().unit(loser).is_none());
    assert!(engine.registry().unit(winner).is_some());
    assert!(engine.registry().unit_at(Coord::new(2, 2)).is_some() == attacker_won);
    assert_eq!(engine.mode(), Mode::Orders);
}

/// Killing a city's garrison leaves the city with its owner; a later move
/// walks in and captures it.
#[test]
fn test_city_falls_only_to_a_later_move() {
    let world = |seed: u64| {
        let mut config = EngineConfig::default().with_grid(6, 6).with_seed(seed);
        config.combat.city_defense_bonus = 1.5;
        WorldBuilder::new(config)
            .filled(Terrain::Land)
            .city(Coord::new(0, 0), Some(P1))
            .city(Coord::new(3, 3), Some(P2))
            .city(Coord::new(5, 5), Some(P2))
            .unit(P1, UnitClass::Army, Coord::new(2, 2))
            .unit(P2, UnitClass::Army, Coord::new(3, 3))
            .build()
            .unwrap()
    };

    let (mut engine, army) = (0..64)
        .find_map(|seed| {
            let mut engine = world(seed);
            let army = engine.registry().unit_at(Coord::new(2, 2)).unwrap().id;
            engine.select_unit(army).unwrap();
            match engine.move_unit(Coord::new(3, 3)).unwrap() {
                CommandEffect::Engaged {
                    attacker_won: true,
                    probability,
                    ..
                } => {
                    assert!((probability - 0.4).abs() < 1e-12);
                    Some((engine, army))
                }
                _ => None,
            }
        })
        .expect("some seed gives the attacker the win");

    let city = engine.registry().city_at(Coord::new(3, 3)).unwrap().clone();
    assert!(city.is_owned_by(P2));
    assert!(engine.registry().unit_at(Coord::new(3, 3)).is_none());
    assert_eq!(engine.registry().unit(army).unwrap().coord, Coord::new(2, 2));

    engine.end_turn().unwrap();
    engine.end_turn().unwrap();
    engine.select_unit(army).unwrap();
    let effect = engine.move_unit(Coord::new(3, 3)).unwrap();

    assert_eq!(
        effect,
        CommandEffect::Captured {
            unit: army,
            city: city.id,
            previous_owner: Some(P2),
            at: Coord::new(3, 3),
        }
    );
    assert!(engine.registry().city(city.id).unwrap().is_owned_by(P1));
}

#[test]
fn test_cancel_returns_to_orders() {
    let mut engine = skirmish();
    let army = engine.registry().unit_at(Coord::new(2, 2)).unwrap().id;

    engine.select_unit(army).unwrap();
    engine.cancel().unwrap();

    assert_eq!(engine.mode(), Mode::Orders);
    assert_eq!(
        engine.move_unit(Coord::new(2, 1)),
        Err(CommandError::Illegal(RejectReason::NoUnitSelected))
    );
}

#[test]
fn test_move_rejected_while_editing() {
    let mut engine = skirmish();
    let home = engine.registry().city_at(Coord::new(0, 0)).unwrap().id;

    engine.edit_city(home).unwrap();

    assert_eq!(
        engine.move_unit(Coord::new(1, 1)),
        Err(CommandError::Illegal(RejectReason::WrongMode))
    );
}

#[test]
fn test_stale_id_reports_entity_not_found() {
    let mut engine = skirmish();
    let result = engine.select_unit(rust_empire::UnitId::new(999));

    assert!(matches!(result, Err(CommandError::EntityNotFound(_))));
    assert!(engine.command_log().is_empty());
}

/// The log records accepted commands only, with the acting player and turn.
#[test]
fn test_command_log_records_accepted_commands() {
    let mut engine = skirmish();
    let army = engine.registry().unit_at(Coord::new(2, 2)).unwrap().id;

    engine.select_unit(army).unwrap();
    let _ = engine.move_unit(Coord::new(9, 9));
    engine.move_unit(Coord::new(2, 1)).unwrap();
    engine.end_turn().unwrap();
    engine.end_turn().unwrap();

    let log: Vec<_> = engine.command_log().iter().cloned().collect();
    assert_eq!(log.len(), 4);
    assert_eq!(log[0].command, Command::SelectUnit(army));
    assert_eq!(log[1].command, Command::MoveUnit(Coord::new(2, 1)));
    assert_eq!(log[3].player, P2);
    assert_eq!(log[3].turn, 0);
    assert!(log.iter().enumerate().all(|(i, r)| r.sequence == i as u64));
}

// =============================================================================
// Fog of war
// =============================================================================

/// After any refresh, visible tiles are exactly those in range of an own
/// unit or city.
#[test]
fn test_visible_tiles_are_in_range() {
    let mut engine = Engine::new(EngineConfig::default().with_seed(3)).unwrap();
    self_play(&mut engine, 12);

    for player in PlayerId::all(engine.player_count()) {
        engine.refresh_visibility(player);
        let radius = engine.config().city_vision_radius;
        let vision = |class: UnitClass| engine.config().units.get(class).vision;
        let fog = engine.visibility(player).unwrap();

        for coord in engine.grid().coords() {
            let in_range = engine
                .registry()
                .units_of(player)
                .any(|u| u.coord.distance(coord) <= vision(u.class))
                || engine
                    .registry()
                    .cities_of(player)
                    .any(|c| c.coord.distance(coord) <= radius);
            assert_eq!(fog.is_visible(coord), in_range, "{player} at {coord}");
        }
    }
}

/// A tile that leaves vision keeps its terrain but no occupant.
#[test]
fn test_departed_enemy_not_remembered() {
    let mut config = EngineConfig::default().with_grid(12, 3);
    config.city_vision_radius = 0;
    config.units.army.vision = 1;
    let mut engine = WorldBuilder::new(config)
        .filled(Terrain::Land)
        .city(Coord::new(0, 0), Some(P1))
        .city(Coord::new(11, 2), Some(P2))
        .unit(P1, UnitClass::Army, Coord::new(5, 1))
        .unit(P2, UnitClass::Army, Coord::new(6, 1))
        .build()
        .unwrap();
    assert!(engine.view(P1).unit_at(Coord::new(6, 1)).is_some());

    let army = engine.registry().unit_at(Coord::new(5, 1)).unwrap().id;
    engine.select_unit(army).unwrap();
    engine.move_unit(Coord::new(4, 1)).unwrap();

    let view = engine.view(P1);
    assert_eq!(view.visibility(Coord::new(6, 1)), Visibility::Seen);
    assert_eq!(view.terrain(Coord::new(6, 1)), Some(Terrain::Land));
    assert!(view.unit_at(Coord::new(6, 1)).is_none());
    assert!(engine.registry().unit_at(Coord::new(6, 1)).is_some());
}

#[test]
fn test_seen_tiles_keep_terrain() {
    let mut config = EngineConfig::default().with_grid(8, 3);
    config.city_vision_radius = 0;
    config.units.army.vision = 1;
    let mut engine = WorldBuilder::new(config)
        .paint_rect(Coord::new(0, 1), Coord::new(7, 1), Terrain::Land)
        .city(Coord::new(0, 1), Some(P1))
        .city(Coord::new(7, 1), Some(P2))
        .unit(P1, UnitClass::Army, Coord::new(2, 1))
        .build()
        .unwrap();
    let army = engine.registry().unit_at(Coord::new(2, 1)).unwrap().id;

    engine.select_unit(army).unwrap();
    engine.move_unit(Coord::new(3, 1)).unwrap();

    let view = engine.view(P1);
    assert_eq!(view.visibility(Coord::new(1, 0)), Visibility::Seen);
    assert_eq!(view.terrain(Coord::new(1, 0)), Some(Terrain::Ocean));
    assert_eq!(view.visibility(Coord::new(5, 1)), Visibility::Unseen);
}

// =============================================================================
// Reproducibility
// =============================================================================

/// Replaying the command log against a fresh engine with the same seed
/// reproduces the game exactly.
#[test]
fn test_command_log_replays_game() {
    let config = EngineConfig::default().with_seed(5);
    let mut original = Engine::new(config.clone()).unwrap();
    self_play(&mut original, 30);

    let mut replay = Engine::new(config).unwrap();
    for record in original.command_log().iter() {
        replay.execute_as(record.player, record.command).unwrap();
    }

    assert_eq!(replay.snapshot(), original.snapshot());
}

#[test]
fn test_turn_counter_counts_full_cycles() {
    let mut engine = Engine::new(EngineConfig::default().with_players(3)).unwrap();
    let mut seats = Vec::new();
    for _ in 0..7 {
        seats.push(engine.active_player());
        engine.end_turn().unwrap();
    }

    assert_eq!(seats.iter().map(|p| p.0).collect::<Vec<_>>(), vec![0, 1, 2, 0, 1, 2, 0]);
    assert_eq!(engine.turn_number(), 2);
    assert_eq!(engine.active_player(), P2);
}

#[test]
fn test_eliminated_player_is_skipped() {
    let p3 = PlayerId::new(2);
    let mut engine = WorldBuilder::new(EngineConfig::default().with_grid(6, 6).with_players(3))
        .filled(Terrain::Land)
        .city(Coord::new(0, 0), Some(P1))
        .city(Coord::new(5, 5), Some(p3))
        .unit(P2, UnitClass::Army, Coord::new(3, 3))
        .build()
        .unwrap();

    let CommandEffect::TurnEnded(summary) = engine.end_turn().unwrap() else {
        panic!("expected turn summary");
    };

    assert_eq!(summary.eliminated, vec![P2]);
    assert_eq!(summary.next, Some(p3));
    assert!(engine.registry().units_of(P2).next().is_none());
    assert_eq!(
        engine.execute_as(P2, Command::EndTurn),
        Err(CommandError::Illegal(RejectReason::NotYourTurn))
    );
}
