//! Seeded world generation.
//!
//! ## Algorithm
//!
//! 1. Draw a land target inside the configured land-fraction bounds.
//! 2. Seed `blob_count` land tiles at random coordinates and grow them by
//!    randomized 4-connected flood fill. Frontier tiles near the grid edge
//!    are accepted with decaying probability, which keeps continents off
//!    the border without forbidding coastline there.
//! 3. Shuffle the land tiles and greedily place cities that keep the
//!    minimum Chebyshev spacing.
//! 4. If fewer than the target number of cities fit, redraw the whole world
//!    (bounded by `max_attempts`). After the last attempt the best result is
//!    accepted if it meets the hard minimum; otherwise generation fails.
//!
//! Every random draw comes from the supplied [`GameRng`], so the same seed
//! always produces the same grid and city list.

use tracing::{debug, info, warn};

use super::grid::{Terrain, TileGrid};
use crate::core::{CityId, Coord, GameRng, GenerationError, MapConfig};
use crate::units::City;

/// Minimum acceptance probability for frontier tiles touching the edge.
const EDGE_DECAY_FLOOR: f64 = 0.1;

/// Output of world generation: terrain plus neutral cities.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedWorld {
    pub grid: TileGrid,

    /// Neutral cities with ids `0..n`.
    pub cities: Vec<City>,

    /// Attempts consumed (1-based).
    pub attempts: u32,
}

/// Generate a world from a fresh stream seeded with `seed`.
pub fn generate(config: &MapConfig, seed: u64) -> Result<GeneratedWorld, GenerationError> {
    let mut rng = GameRng::new(seed);
    generate_with_rng(config, &mut rng)
}

/// Generate a world drawing from an existing stream.
pub fn generate_with_rng(
    config: &MapConfig,
    rng: &mut GameRng,
) -> Result<GeneratedWorld, GenerationError> {
    let area = config.width as usize * config.height as usize;
    let (min_land, max_land) = land_bounds(config, area);
    if area == 0 || min_land > max_land || (max_land as u32) < config.min_city_count {
        return Err(GenerationError::GridTooSmall {
            width: config.width,
            height: config.height,
        });
    }

    let mut best: Option<(TileGrid, Vec<Coord>, u32)> = None;
    let mut grown_any = false;

    for attempt in 1..=config.max_attempts {
        let target_land = min_land + rng.gen_range_usize(0..max_land - min_land + 1);
        let Some(grid) = grow_land(config, target_land, rng) else {
            debug!(attempt, target_land, "land growth stalled");
            continue;
        };
        grown_any = true;

        let sites = place_cities(&grid, config, rng);
        debug!(attempt, land = grid.land_count(), cities = sites.len(), "world attempt");

        if sites.len() >= config.target_city_count as usize {
            return Ok(finish(grid, sites, attempt));
        }
        if best.as_ref().map_or(true, |(_, b, _)| sites.len() > b.len()) {
            best = Some((grid, sites, attempt));
        }
    }

    match best {
        Some((grid, sites, attempt)) if sites.len() >= config.min_city_count as usize => {
            warn!(
                placed = sites.len(),
                target = config.target_city_count,
                "accepting fewer cities than target"
            );
            Ok(finish(grid, sites, attempt))
        }
        Some((_, sites, _)) => Err(GenerationError::TooFewCities {
            placed: sites.len() as u32,
            required: config.min_city_count,
        }),
        None if !grown_any => Err(GenerationError::LandFraction {
            attempts: config.max_attempts,
        }),
        None => Err(GenerationError::TooFewCities {
            placed: 0,
            required: config.min_city_count,
        }),
    }
}

fn finish(grid: TileGrid, sites: Vec<Coord>, attempts: u32) -> GeneratedWorld {
    let cities: Vec<City> = sites
        .into_iter()
        .enumerate()
        .map(|(i, coord)| City::neutral(CityId::new(i as u32), coord))
        .collect();
    info!(
        width = grid.width(),
        height = grid.height(),
        land_fraction = grid.land_fraction(),
        cities = cities.len(),
        attempts,
        "world generated"
    );
    GeneratedWorld {
        grid,
        cities,
        attempts,
    }
}

/// Smallest and largest land-tile counts whose fraction lies within bounds.
fn land_bounds(config: &MapConfig, area: usize) -> (usize, usize) {
    let area_f = area as f64;
    let mut min_land = (config.land_fraction_min * area_f).ceil() as usize;
    let mut max_land = (config.land_fraction_max * area_f).floor() as usize;
    // Float rounding can push a bound one tile past the exact fraction.
    if (min_land as f64) / area_f < config.land_fraction_min {
        min_land += 1;
    }
    if max_land > 0 && (max_land as f64) / area_f > config.land_fraction_max {
        max_land -= 1;
    }
    (min_land, max_land.min(area))
}

/// Acceptance probability for growing onto `coord`.
fn edge_acceptance(grid: &TileGrid, coord: Coord) -> f64 {
    let margin = (grid.width().min(grid.height()) / 6).max(1) as f64;
    let to_edge = coord
        .col
        .min(coord.row)
        .min(grid.width() as i32 - 1 - coord.col)
        .min(grid.height() as i32 - 1 - coord.row)
        .max(0) as f64;
    ((to_edge + 1.0) / (margin + 1.0)).clamp(EDGE_DECAY_FLOOR, 1.0)
}

/// Grow exactly `target_land` land tiles, or `None` if growth stalls.
fn grow_land(config: &MapConfig, target_land: usize, rng: &mut GameRng) -> Option<TileGrid> {
    let mut grid = TileGrid::new(config.width, config.height);
    let mut land = 0usize;
    let mut frontier: Vec<Coord> = Vec::new();

    let seed_blob = |grid: &mut TileGrid, frontier: &mut Vec<Coord>, rng: &mut GameRng| {
        let col = rng.gen_range_u32(0..config.width) as i32;
        let row = rng.gen_range_u32(0..config.height) as i32;
        let coord = Coord::new(col, row);
        if grid.is_land(coord) {
            return false;
        }
        grid.set(coord, Terrain::Land);
        frontier.extend(coord.orthogonal().into_iter().filter(|c| grid.contains(*c)));
        true
    };

    let blobs = config.effective_blob_count() as usize;
    for _ in 0..blobs.min(target_land) {
        if seed_blob(&mut grid, &mut frontier, rng) {
            land += 1;
        }
    }

    let step_limit = grid.area().saturating_mul(64).max(1024);
    let mut steps = 0usize;
    while land < target_land {
        steps += 1;
        if steps > step_limit {
            return None;
        }
        if frontier.is_empty() {
            // Every blob is enclosed; start a new one.
            if seed_blob(&mut grid, &mut frontier, rng) {
                land += 1;
            }
            continue;
        }
        let pick = rng.gen_range_usize(0..frontier.len());
        let coord = frontier.swap_remove(pick);
        if grid.is_land(coord) {
            continue;
        }
        if !rng.gen_bool(edge_acceptance(&grid, coord)) {
            frontier.push(coord);
            continue;
        }
        grid.set(coord, Terrain::Land);
        land += 1;
        frontier.extend(
            coord
                .orthogonal()
                .into_iter()
                .filter(|c| grid.terrain(*c) == Some(Terrain::Ocean)),
        );
    }

    Some(grid)
}

/// Greedy spaced placement over shuffled land tiles.
fn place_cities(grid: &TileGrid, config: &MapConfig, rng: &mut GameRng) -> Vec<Coord> {
    let mut land: Vec<Coord> = grid.coords().filter(|c| grid.is_land(*c)).collect();
    rng.shuffle(&mut land);

    let target = config.target_city_count as usize;
    let mut placed: Vec<Coord> = Vec::with_capacity(target);
    for coord in land {
        if placed.len() >= target {
            break;
        }
        if placed
            .iter()
            .all(|p| p.distance(coord) >= config.min_city_distance)
        {
            placed.push(coord);
        }
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> MapConfig {
        MapConfig {
            width: 30,
            height: 16,
            target_city_count: 6,
            min_city_count: 3,
            min_city_distance: 3,
            ..MapConfig::default()
        }
    }

    #[test]
    fn test_deterministic() {
        let config = small_config();
        let a = generate(&config, 7).unwrap();
        let b = generate(&config, 7).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let config = small_config();
        let a = generate(&config, 1).unwrap();
        let b = generate(&config, 2).unwrap();

        assert_ne!(a.grid, b.grid);
    }

    #[test]
    fn test_constraints_hold() {
        let config = small_config();
        let world = generate(&config, 99).unwrap();

        let fraction = world.grid.land_fraction();
        assert!(fraction >= config.land_fraction_min && fraction <= config.land_fraction_max);
        assert!(world.cities.len() >= config.min_city_count as usize);
        for (i, city) in world.cities.iter().enumerate() {
            assert!(world.grid.is_land(city.coord));
            assert!(city.is_neutral());
            assert_eq!(city.id, CityId::new(i as u32));
            for other in &world.cities[i + 1..] {
                assert!(city.coord.distance(other.coord) >= config.min_city_distance);
            }
        }
    }

    #[test]
    fn test_impossible_city_count_fails() {
        let config = MapConfig {
            width: 8,
            height: 8,
            target_city_count: 10,
            min_city_count: 10,
            min_city_distance: 4,
            max_attempts: 3,
            ..MapConfig::default()
        };

        let err = generate(&config, 5).unwrap_err();
        assert!(matches!(err, GenerationError::TooFewCities { required: 10, .. }));
    }

    #[test]
    fn test_grid_too_small() {
        let config = MapConfig {
            width: 2,
            height: 2,
            target_city_count: 4,
            min_city_count: 4,
            ..MapConfig::default()
        };

        assert!(matches!(
            generate(&config, 1),
            Err(GenerationError::GridTooSmall { width: 2, height: 2 })
        ));
    }

    #[test]
    fn test_shared_stream_advances() {
        let config = small_config();
        let mut rng = GameRng::new(3);
        let before = rng.state();
        generate_with_rng(&config, &mut rng).unwrap();

        assert_ne!(rng.state(), before);
    }

    #[test]
    fn test_land_bounds_are_exact() {
        let config = MapConfig {
            land_fraction_min: 0.25,
            land_fraction_max: 0.45,
            ..MapConfig::default()
        };
        let (lo, hi) = land_bounds(&config, 100);

        assert_eq!((lo, hi), (25, 45));
    }
}
