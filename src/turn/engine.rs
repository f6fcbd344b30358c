//! The engine instance: owns the whole game and processes commands.
//!
//! An `Engine` is an ordinary value. There is no global state, so any
//! number of games can run side by side. Commands are processed one at a
//! time and either complete or are rejected with the state untouched;
//! readers only ever see the settled state between commands.
//!
//! ## End of turn
//!
//! `end_turn` runs, in order:
//!
//! 1. production for the ending player's cities
//! 2. fuel for the ending player's air units
//! 3. fog refresh for the next player
//! 4. victory check (cityless players are eliminated and disbanded)
//! 5. advance to the next non-eliminated player, resetting their movement

use im::Vector;
use tracing::{debug, info};

use super::command::{Command, CommandEffect, CommandRecord, TurnSummary};
use super::setup;
use super::state::{GameResult, Mode, TurnState};
use crate::ai::Commander;
use crate::combat;
use crate::core::{
    CityId, CommandError, Coord, EngineConfig, GameRng, GameRngState, PlayerId, PlayerMap,
    RejectReason, SetupError, UnitId,
};
use crate::fog::{self, VisibilityMap};
use crate::movement::{self, MoveOutcome};
use crate::production;
use crate::registry::EntityRegistry;
use crate::terrain::{generate_with_rng, Tile, TileGrid};
use crate::units::UnitClass;
use crate::view::PlayerView;

/// Result of one command.
pub type CommandOutcome = Result<CommandEffect, CommandError>;

/// Per-player counts derived from the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerSummary {
    pub player: PlayerId,
    pub cities: usize,
    pub units: usize,
    pub eliminated: bool,
}

/// A running game.
#[derive(Clone, Debug)]
pub struct Engine {
    config: EngineConfig,
    grid: TileGrid,
    registry: EntityRegistry,
    fog: PlayerMap<VisibilityMap>,
    turn: TurnState,
    log: Vector<CommandRecord>,
    rng: GameRng,
}

impl Engine {
    /// Generate a world from `config` and seat every player.
    ///
    /// The engine's random stream is seeded once from `config.seed` and
    /// drives generation first, then every later combat.
    pub fn new(config: EngineConfig) -> Result<Self, SetupError> {
        config.validate()?;
        let mut rng = GameRng::new(config.seed);
        let world = generate_with_rng(&config.map, &mut rng)?;

        let mut registry = EntityRegistry::new();
        for city in world.cities {
            registry.insert_city(city);
        }
        let homes = setup::assign_homes(&registry, config.players)?;
        for (seat, &city) in homes.iter().enumerate() {
            setup::seat_player(&mut registry, &world.grid, &config, PlayerId::new(seat as u8), city)?;
        }

        let turn = TurnState::new(config.players);
        let engine = Self::from_parts(config, world.grid, registry, rng, turn, Vector::new(), None);
        info!(
            players = engine.config.players,
            cities = engine.registry.city_count(),
            units = engine.registry.unit_count(),
            seed = engine.config.seed,
            "game ready"
        );
        Ok(engine)
    }

    /// Assemble an engine from already-validated parts.
    ///
    /// With `fog` absent, fresh maps are built and refreshed for every player.
    pub(crate) fn from_parts(
        config: EngineConfig,
        grid: TileGrid,
        registry: EntityRegistry,
        rng: GameRng,
        turn: TurnState,
        log: Vector<CommandRecord>,
        fog: Option<PlayerMap<VisibilityMap>>,
    ) -> Self {
        let (width, height) = (grid.width(), grid.height());
        let seeded = fog.is_none();
        let fog = fog.unwrap_or_else(|| {
            PlayerMap::new(config.players, |_| VisibilityMap::new(width, height))
        });
        let mut engine = Self {
            config,
            grid,
            registry,
            fog,
            turn,
            log,
            rng,
        };
        if seeded {
            for player in PlayerId::all(engine.config.players) {
                engine.refresh_fog(player);
            }
        }
        engine
    }

    // === Read-only state ===

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    #[must_use]
    pub fn turn_state(&self) -> &TurnState {
        &self.turn
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.config.players
    }

    #[must_use]
    pub fn active_player(&self) -> PlayerId {
        self.turn.active
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.turn.mode
    }

    /// Completed full player cycles.
    #[must_use]
    pub fn turn_number(&self) -> u32 {
        self.turn.turn
    }

    #[must_use]
    pub fn result(&self) -> Option<GameResult> {
        self.turn.result
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.turn.is_over()
    }

    /// A player's visibility map as of its last refresh.
    #[must_use]
    pub fn visibility(&self, player: PlayerId) -> Option<&VisibilityMap> {
        self.fog.get(player)
    }

    /// Every player's visibility map.
    #[must_use]
    pub fn visibility_maps(&self) -> &PlayerMap<VisibilityMap> {
        &self.fog
    }

    /// Accepted commands, oldest first.
    #[must_use]
    pub fn command_log(&self) -> &Vector<CommandRecord> {
        &self.log
    }

    /// Position of the random stream.
    #[must_use]
    pub fn rng_state(&self) -> GameRngState {
        self.rng.state()
    }

    /// Terrain and occupants at `coord`, or `None` out of bounds.
    #[must_use]
    pub fn tile(&self, coord: Coord) -> Option<Tile> {
        self.grid.terrain(coord).map(|terrain| Tile {
            coord,
            terrain,
            unit: self.registry.unit_at(coord).map(|u| u.id),
            city: self.registry.city_at(coord).map(|c| c.id),
        })
    }

    #[must_use]
    pub fn player_summary(&self, player: PlayerId) -> PlayerSummary {
        PlayerSummary {
            player,
            cities: self.registry.cities_of(player).count(),
            units: self.registry.units_of(player).count(),
            eliminated: self.turn.is_eliminated(player),
        }
    }

    /// Read-only snapshot of what `player` can see.
    #[must_use]
    pub fn view(&self, player: PlayerId) -> PlayerView {
        PlayerView::build(self, player)
    }

    /// Rebuild `player`'s visibility from the current state.
    ///
    /// Idempotent; the map only changes when units or cities have.
    pub fn refresh_visibility(&mut self, player: PlayerId) -> Option<&VisibilityMap> {
        self.refresh_fog(player);
        self.fog.get(player)
    }

    // === Command surface ===

    pub fn select_unit(&mut self, unit: UnitId) -> CommandOutcome {
        self.execute(Command::SelectUnit(unit))
    }

    pub fn edit_city(&mut self, city: CityId) -> CommandOutcome {
        self.execute(Command::EditCity(city))
    }

    pub fn cancel(&mut self) -> CommandOutcome {
        self.execute(Command::Cancel)
    }

    pub fn move_unit(&mut self, destination: Coord) -> CommandOutcome {
        self.execute(Command::MoveUnit(destination))
    }

    pub fn set_production(&mut self, city: CityId, class: Option<UnitClass>) -> CommandOutcome {
        self.execute(Command::SetProduction { city, class })
    }

    pub fn end_turn(&mut self) -> CommandOutcome {
        self.execute(Command::EndTurn)
    }

    /// Run a command for the active player.
    pub fn execute(&mut self, command: Command) -> CommandOutcome {
        self.execute_as(self.turn.active, command)
    }

    /// Run a command on behalf of `player`.
    ///
    /// Rejected with `NotYourTurn` unless `player` is active, and with
    /// `GameOver` once the game has ended. Accepted commands are logged.
    pub fn execute_as(&mut self, player: PlayerId, command: Command) -> CommandOutcome {
        let result = if self.turn.is_over() {
            Err(RejectReason::GameOver.into())
        } else if player != self.turn.active {
            Err(RejectReason::NotYourTurn.into())
        } else {
            let turn = self.turn.turn;
            let result = self.dispatch(player, command);
            if result.is_ok() {
                let sequence = self.log.len() as u64;
                self.log.push_back(CommandRecord::new(player, command, turn, sequence));
            }
            result
        };
        if let Err(err) = &result {
            debug!(%player, ?command, %err, "command rejected");
        }
        result
    }

    /// Let `commander` play the active player's turn.
    ///
    /// Executes the plan in order (stopping at an explicit `EndTurn` or game
    /// over) and then ends the turn. Rejected commands are reported, not
    /// fatal.
    pub fn play_commander_turn<C: Commander + ?Sized>(&mut self, commander: &mut C) -> Vec<CommandOutcome> {
        let mut outcomes = Vec::new();
        if self.is_over() {
            return outcomes;
        }
        let player = self.turn.active;
        let view = self.view(player);
        for command in commander.plan(&view) {
            if command == Command::EndTurn || self.is_over() {
                break;
            }
            outcomes.push(self.execute_as(player, command));
        }
        if !self.is_over() {
            outcomes.push(self.execute_as(player, Command::EndTurn));
        }
        outcomes
    }

    fn dispatch(&mut self, player: PlayerId, command: Command) -> CommandOutcome {
        match command {
            Command::SelectUnit(unit) => {
                if self.registry.try_unit(unit)?.owner != player {
                    return Err(RejectReason::NotOwned.into());
                }
                self.turn.mode = Mode::Move { unit };
                Ok(CommandEffect::Selected { unit })
            }
            Command::EditCity(city) => {
                if !self.registry.try_city(city)?.is_owned_by(player) {
                    return Err(RejectReason::NotOwned.into());
                }
                self.turn.mode = Mode::Edit { city };
                Ok(CommandEffect::Editing { city })
            }
            Command::Cancel => {
                self.turn.mode = Mode::Orders;
                Ok(CommandEffect::Cancelled)
            }
            Command::MoveUnit(destination) => self.move_selected(player, destination),
            Command::SetProduction { city, class } => {
                if matches!(self.turn.mode, Mode::Move { .. }) {
                    return Err(RejectReason::WrongMode.into());
                }
                production::set_production(&mut self.registry, &self.config.units, player, city, class)?;
                Ok(CommandEffect::ProductionSet { city, class })
            }
            Command::EndTurn => self.finish_turn(player).map(CommandEffect::TurnEnded),
        }
    }

    fn move_selected(&mut self, player: PlayerId, destination: Coord) -> CommandOutcome {
        let unit_id = match self.turn.mode {
            Mode::Move { unit } => unit,
            Mode::Orders => return Err(RejectReason::NoUnitSelected.into()),
            Mode::Edit { .. } => return Err(RejectReason::WrongMode.into()),
        };
        let outcome = movement::propose_move(&self.grid, &self.registry, &self.config.units, unit_id, destination)?;
        movement::apply(&mut self.registry, &outcome)?;

        let effect = match outcome {
            MoveOutcome::Move { unit, from, to, .. } => CommandEffect::Moved {
                unit,
                from,
                to,
                moves_left: self.registry.unit(unit).map_or(0, |u| u.moves_left),
            },
            MoveOutcome::Capture {
                unit,
                city,
                previous_owner,
                to,
                ..
            } => {
                info!(%player, city = %city, at = %to, ?previous_owner, "city captured");
                CommandEffect::Captured {
                    unit,
                    city,
                    previous_owner,
                    at: to,
                }
            }
            MoveOutcome::Engage {
                attacker,
                defender,
                staging,
                ..
            } => {
                let fight = combat::resolve(
                    &mut self.registry,
                    attacker,
                    defender,
                    &self.config.units,
                    &self.config.combat,
                    &mut self.rng,
                )?;
                CommandEffect::Engaged {
                    attacker,
                    defender,
                    staging,
                    attacker_won: fight.attacker_won(),
                    probability: fight.probability,
                    casualty: fight.casualty.id,
                }
            }
        };

        if !self.registry.unit(unit_id).map_or(false, |u| u.can_move()) {
            self.turn.mode = Mode::Orders;
        }
        self.refresh_fog(player);
        Ok(effect)
    }

    fn finish_turn(&mut self, ended: PlayerId) -> Result<TurnSummary, CommandError> {
        let production =
            production::advance_turn(&mut self.registry, &self.grid, &self.config.units, ended)?;
        let fuel_losses = self.burn_fuel(ended)?;

        let upcoming = self.turn.next_active().map(|(player, _)| player);
        if let Some(player) = upcoming {
            self.refresh_fog(player);
        }

        let eliminated = self.check_victory()?;

        self.turn.mode = Mode::Orders;
        let next = if self.turn.is_over() {
            None
        } else {
            self.advance_active(upcoming)
        };

        Ok(TurnSummary {
            ended,
            next,
            turn: self.turn.turn,
            production,
            fuel_losses,
            eliminated,
            result: self.turn.result,
        })
    }

    /// Refuel air units on friendly cities; burn a turn of fuel elsewhere.
    fn burn_fuel(&mut self, player: PlayerId) -> Result<Vec<UnitId>, CommandError> {
        let mut losses = Vec::new();
        for id in self.registry.unit_ids_of(player) {
            let Some(unit) = self.registry.unit(id) else {
                continue;
            };
            let Some(capacity) = self.config.units.get(unit.class).fuel else {
                continue;
            };
            let at_base = self
                .registry
                .city_at(unit.coord)
                .map_or(false, |c| c.is_owned_by(player));
            if at_base {
                self.registry.refuel(id, capacity)?;
            } else if self.registry.burn_fuel(id)? == Some(0) {
                let lost = self.registry.destroy_unit(id)?;
                debug!(unit = %id, class = %lost.class, at = %lost.coord, "out of fuel");
                losses.push(id);
            }
        }
        Ok(losses)
    }

    /// Eliminate cityless players and settle the result if one remains.
    fn check_victory(&mut self) -> Result<Vec<PlayerId>, CommandError> {
        let mut eliminated = Vec::new();
        for player in PlayerId::all(self.config.players) {
            if self.turn.is_eliminated(player) || self.registry.cities_of(player).next().is_some() {
                continue;
            }
            self.turn.eliminated[player] = true;
            for unit in self.registry.unit_ids_of(player) {
                self.registry.destroy_unit(unit)?;
            }
            info!(%player, "player eliminated");
            eliminated.push(player);
        }

        let remaining: Vec<PlayerId> = self.turn.remaining().collect();
        self.turn.result = match remaining.as_slice() {
            [winner] => Some(GameResult::Winner(*winner)),
            [] => Some(GameResult::Draw),
            _ => None,
        };
        if let Some(result) = self.turn.result {
            info!(?result, turn = self.turn.turn, "game over");
        }
        Ok(eliminated)
    }

    /// Hand play to the next seat. `refreshed` is the player whose fog was
    /// already rebuilt this end of turn.
    fn advance_active(&mut self, refreshed: Option<PlayerId>) -> Option<PlayerId> {
        let (next, wrapped) = self.turn.next_active()?;
        if wrapped {
            self.turn.turn += 1;
        }
        self.turn.active = next;
        self.registry.reset_moves(next, &self.config.units);
        if refreshed != Some(next) {
            self.refresh_fog(next);
        }
        Some(next)
    }

    fn refresh_fog(&mut self, player: PlayerId) {
        let Some(previous) = self.fog.get(player) else {
            return;
        };
        let refreshed = fog::refresh(
            previous,
            player,
            &self.grid,
            &self.registry,
            &self.config.units,
            self.config.city_vision_radius,
        );
        self.fog[player] = refreshed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::Terrain;
    use crate::turn::WorldBuilder;

    fn duel() -> Engine {
        let p1 = PlayerId::new(0);
        let p2 = PlayerId::new(1);
        WorldBuilder::new(EngineConfig::default().with_grid(8, 8))
            .filled(Terrain::Land)
            .city(Coord::new(1, 1), Some(p1))
            .city(Coord::new(6, 6), Some(p2))
            .unit(p1, UnitClass::Army, Coord::new(1, 1))
            .unit(p2, UnitClass::Army, Coord::new(6, 6))
            .build()
            .unwrap()
    }

    #[test]
    fn test_select_and_move() {
        let mut engine = duel();
        let army = engine.registry().unit_at(Coord::new(1, 1)).unwrap().id;

        engine.select_unit(army).unwrap();
        assert_eq!(engine.mode(), Mode::Move { unit: army });

        let effect = engine.move_unit(Coord::new(2, 2)).unwrap();
        assert!(matches!(effect, CommandEffect::Moved { moves_left: 0, .. }));
        assert_eq!(engine.mode(), Mode::Orders);
        assert_eq!(engine.command_log().len(), 2);
    }

    #[test]
    fn test_move_without_selection() {
        let mut engine = duel();

        assert_eq!(
            engine.move_unit(Coord::new(2, 2)),
            Err(CommandError::Illegal(RejectReason::NoUnitSelected))
        );
        assert!(engine.command_log().is_empty());
    }

    #[test]
    fn test_cannot_select_enemy_unit() {
        let mut engine = duel();
        let enemy = engine.registry().unit_at(Coord::new(6, 6)).unwrap().id;

        assert_eq!(
            engine.select_unit(enemy),
            Err(CommandError::Illegal(RejectReason::NotOwned))
        );
    }

    #[test]
    fn test_not_your_turn() {
        let mut engine = duel();

        assert_eq!(
            engine.execute_as(PlayerId::new(1), Command::EndTurn),
            Err(CommandError::Illegal(RejectReason::NotYourTurn))
        );
    }

    #[test]
    fn test_set_production_rejected_in_move_mode() {
        let mut engine = duel();
        let army = engine.registry().unit_at(Coord::new(1, 1)).unwrap().id;
        let city = engine.registry().city_at(Coord::new(1, 1)).unwrap().id;
        engine.select_unit(army).unwrap();

        assert_eq!(
            engine.set_production(city, Some(UnitClass::Army)),
            Err(CommandError::Illegal(RejectReason::WrongMode))
        );

        engine.edit_city(city).unwrap();
        engine.set_production(city, Some(UnitClass::Army)).unwrap();
        assert_eq!(engine.mode(), Mode::Edit { city });
    }

    #[test]
    fn test_end_turn_cycles_players_and_counts_turns() {
        let mut engine = duel();

        engine.end_turn().unwrap();
        assert_eq!(engine.active_player(), PlayerId::new(1));
        assert_eq!(engine.turn_number(), 0);

        engine.end_turn().unwrap();
        assert_eq!(engine.active_player(), PlayerId::new(0));
        assert_eq!(engine.turn_number(), 1);
    }

    #[test]
    fn test_movement_resets_at_turn_start() {
        let mut engine = duel();
        let army = engine.registry().unit_at(Coord::new(1, 1)).unwrap().id;
        engine.select_unit(army).unwrap();
        engine.move_unit(Coord::new(2, 2)).unwrap();
        assert_eq!(engine.registry().unit(army).unwrap().moves_left, 0);

        engine.end_turn().unwrap();
        engine.end_turn().unwrap();

        assert_eq!(engine.registry().unit(army).unwrap().moves_left, 1);
    }

    #[test]
    fn test_fighter_runs_out_of_fuel() {
        let p1 = PlayerId::new(0);
        let p2 = PlayerId::new(1);
        let mut config = EngineConfig::default().with_grid(8, 8);
        config.units.fighter.fuel = Some(2);
        let mut engine = WorldBuilder::new(config)
            .filled(Terrain::Land)
            .city(Coord::new(0, 0), Some(p1))
            .city(Coord::new(7, 7), Some(p2))
            .unit(p1, UnitClass::Fighter, Coord::new(3, 3))
            .build()
            .unwrap();
        let fighter = engine.registry().unit_at(Coord::new(3, 3)).unwrap().id;

        engine.end_turn().unwrap();
        engine.end_turn().unwrap();
        assert_eq!(engine.registry().unit(fighter).unwrap().fuel, Some(1));

        match engine.end_turn().unwrap() {
            CommandEffect::TurnEnded(summary) => assert_eq!(summary.fuel_losses, vec![fighter]),
            other => panic!("expected turn summary, got {other:?}"),
        }
        assert!(engine.registry().unit(fighter).is_none());
    }

    #[test]
    fn test_fighter_refuels_in_city() {
        let p1 = PlayerId::new(0);
        let p2 = PlayerId::new(1);
        let mut config = EngineConfig::default().with_grid(8, 8);
        config.units.fighter.fuel = Some(1);
        let mut engine = WorldBuilder::new(config)
            .filled(Terrain::Land)
            .city(Coord::new(0, 0), Some(p1))
            .city(Coord::new(7, 7), Some(p2))
            .unit(p1, UnitClass::Fighter, Coord::new(0, 0))
            .build()
            .unwrap();

        for _ in 0..6 {
            engine.end_turn().unwrap();
        }
        assert_eq!(engine.registry().units_of(p1).count(), 1);
    }

    #[test]
    fn test_commands_rejected_after_game_over() {
        let p1 = PlayerId::new(0);
        let mut engine = WorldBuilder::new(EngineConfig::default().with_grid(4, 4))
            .filled(Terrain::Land)
            .city(Coord::new(0, 0), Some(p1))
            .build()
            .unwrap();

        engine.end_turn().unwrap();
        assert_eq!(engine.result(), Some(GameResult::Winner(p1)));
        assert_eq!(
            engine.end_turn(),
            Err(CommandError::Illegal(RejectReason::GameOver))
        );
    }

    #[test]
    fn test_tile_view() {
        let engine = duel();
        let tile = engine.tile(Coord::new(1, 1)).unwrap();

        assert_eq!(tile.terrain, Terrain::Land);
        assert!(tile.unit.is_some());
        assert!(tile.city.is_some());
        assert!(engine.tile(Coord::new(8, 0)).is_none());
    }
}
