//! Deterministic force-directed layout of a view, normalized into the unit square

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::config::{round_to, GenreMapConfig, LayoutConfig};
use crate::graph::Subgraph;
use crate::model::GenreId;

/// Axis ranges at or below this are treated as a single value.
pub const RANGE_EPSILON: f64 = 1e-9;

/// Pull toward the origin, keeps disconnected components from drifting apart.
const GRAVITY: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub const CENTER: Coordinate = Coordinate { x: 0.5, y: 0.5 };
}

/// Genre id → position in [0, 1]².
pub type Layout = BTreeMap<GenreId, Coordinate>;

/// Positions are not stable across different node sets.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: LayoutConfig,
    precision: u32,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig, precision: u32) -> Self {
        LayoutEngine { config, precision }
    }

    pub fn from_config(config: &GenreMapConfig) -> Self {
        Self::new(config.layout.clone(), config.decimal_precision)
    }

    pub fn layout(&self, subgraph: &Subgraph) -> Layout {
        match subgraph.nodes.as_slice() {
            [] => Layout::new(),
            [only] => Layout::from([(*only, Coordinate::CENTER)]),
            nodes => {
                let raw = self.simulate(nodes, subgraph);
                normalize_positions(nodes.iter().copied().zip(raw), self.precision)
            }
        }
    }

    /// Iterations to run for `n` nodes. Each iteration evaluates every node
    /// pair, so the configured count is capped by `max_pair_evaluations`.
    pub fn iterations_for(&self, n: usize) -> usize {
        let pairs = (n as u64 * n.saturating_sub(1) as u64 / 2).max(1);
        let affordable = (self.config.max_pair_evaluations / pairs).max(1);
        self.config
            .iterations
            .min(usize::try_from(affordable).unwrap_or(usize::MAX))
    }

    /// Fruchterman–Reingold style simulation. Nodes start evenly spaced on a
    /// circle in id order; forces are accumulated in index order.
    fn simulate(&self, nodes: &[GenreId], subgraph: &Subgraph) -> Vec<(f64, f64)> {
        let n = nodes.len();
        let radius = self.config.initial_radius.max(f64::MIN_POSITIVE);
        let k = (4.0 * radius * radius / n as f64).sqrt();
        let min_distance = k * 1e-3;

        let mut positions: Vec<(f64, f64)> = (0..n)
            .map(|i| {
                let angle = i as f64 * 2.0 * PI / n as f64;
                (radius * angle.cos(), radius * angle.sin())
            })
            .collect();

        let slot: HashMap<GenreId, usize> =
            nodes.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        // Direction and relationship type do not matter for spacing.
        let springs: BTreeSet<(usize, usize)> = subgraph
            .edges
            .iter()
            .filter_map(|e| Some((*slot.get(&e.source)?, *slot.get(&e.target)?)))
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();

        let iterations = self.iterations_for(n);
        if iterations < self.config.iterations {
            tracing::debug!(
                "Layout of {} genres capped at {} iterations",
                n,
                iterations
            );
        }

        let mut temperature = radius * 0.1;
        for _ in 0..iterations {
            let mut disp = vec![(0.0f64, 0.0f64); n];

            for i in 0..n {
                for j in (i + 1)..n {
                    let (ux, uy, dist) = direction(positions[i], positions[j], min_distance);
                    let force = k * k / dist;
                    disp[i].0 += ux * force;
                    disp[i].1 += uy * force;
                    disp[j].0 -= ux * force;
                    disp[j].1 -= uy * force;
                }
            }

            for &(i, j) in &springs {
                let (ux, uy, dist) = direction(positions[i], positions[j], min_distance);
                let force = dist * dist / k;
                disp[i].0 -= ux * force;
                disp[i].1 -= uy * force;
                disp[j].0 += ux * force;
                disp[j].1 += uy * force;
            }

            for (pos, d) in positions.iter_mut().zip(disp.iter_mut()) {
                d.0 -= pos.0 * GRAVITY * k;
                d.1 -= pos.1 * GRAVITY * k;

                let len = (d.0 * d.0 + d.1 * d.1).sqrt();
                if len > 0.0 {
                    let step = len.min(temperature);
                    pos.0 += d.0 / len * step;
                    pos.1 += d.1 / len * step;
                }
            }

            temperature *= self.config.cooling;
        }

        positions
    }
}

/// Unit vector from `b` to `a` and their distance (clamped below).
fn direction(a: (f64, f64), b: (f64, f64), min_distance: f64) -> (f64, f64, f64) {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    let dist = (dx * dx + dy * dy).sqrt();
    if dist < min_distance {
        // Coincident nodes separate along x.
        return (1.0, 0.0, min_distance);
    }
    (dx / dist, dy / dist, dist)
}

/// Min-max normalize each axis independently into [0, 1], rounded to
/// `precision`. An axis whose values all coincide maps to 0.5.
pub fn normalize_positions<I>(raw: I, precision: u32) -> Layout
where
    I: IntoIterator<Item = (GenreId, (f64, f64))>,
{
    let raw: Vec<(GenreId, (f64, f64))> = raw.into_iter().collect();
    let bounds = |axis: fn(&(f64, f64)) -> f64| {
        raw.iter().map(|(_, p)| axis(p)).fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), v| (lo.min(v), hi.max(v)),
        )
    };
    let x_bounds = bounds(|p| p.0);
    let y_bounds = bounds(|p| p.1);

    raw.iter()
        .map(|(id, (x, y))| {
            let coordinate = Coordinate {
                x: scale(*x, x_bounds, precision),
                y: scale(*y, y_bounds, precision),
            };
            (*id, coordinate)
        })
        .collect()
}

fn scale(value: f64, (min, max): (f64, f64), precision: u32) -> f64 {
    let range = max - min;
    if !(range > RANGE_EPSILON) {
        return 0.5;
    }
    round_to((value - min) / range, precision)
}
