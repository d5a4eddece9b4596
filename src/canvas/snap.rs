//! Grid and edge snapping.
//!
//! Grid snapping runs first. Edge snapping then looks at the *unsnapped*
//! coordinate on each axis independently: if an edge of another element lies
//! within the tolerance, the nearest such edge replaces the grid result for
//! that axis. Ties go to the first edge found.

use serde::{Deserialize, Serialize};

use crate::element::Bounds;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

fn snap_to_grid(v: f64, grid: f64) -> f64 {
    if grid > 0.0 && grid.is_finite() && v.is_finite() {
        (v / grid).round() * grid
    } else {
        v
    }
}

/// Nearest candidate within `tolerance` of `v`.
fn nearest_within(v: f64, candidates: impl Iterator<Item = f64>, tolerance: f64) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for c in candidates {
        let d = (c - v).abs();
        if d > tolerance {
            continue;
        }
        match best {
            Some((_, best_d)) if best_d <= d => {}
            _ => best = Some((c, d)),
        }
    }
    best.map(|(c, _)| c)
}

/// Snap a point to the grid, then to nearby element edges.
pub fn snap(point: Point, grid: f64, others: &[Bounds], tolerance: f64) -> Point {
    let mut out = Point::new(snap_to_grid(point.x, grid), snap_to_grid(point.y, grid));

    let xs = others.iter().flat_map(|b| [b.x, b.right()]);
    if let Some(x) = nearest_within(point.x, xs, tolerance) {
        out.x = x;
    }
    let ys = others.iter().flat_map(|b| [b.y, b.bottom()]);
    if let Some(y) = nearest_within(point.y, ys, tolerance) {
        out.y = y;
    }
    out
}

/// Offset that brings either moving edge onto the nearest target edge.
fn edge_offset(moving: [f64; 2], targets: &[f64], tolerance: f64) -> Option<f64> {
    let mut best: Option<f64> = None;
    for &m in &moving {
        for &t in targets {
            let d = t - m;
            if d.abs() > tolerance {
                continue;
            }
            if best.is_none_or(|b| d.abs() < b.abs()) {
                best = Some(d);
            }
        }
    }
    best
}

/// Snap a moving box: grid-snap its origin, then let either of its edges
/// catch a nearby edge of another element, per axis.
pub fn snap_box(moving: Bounds, grid: f64, others: &[Bounds], tolerance: f64) -> Bounds {
    let mut out = moving;
    out.x = snap_to_grid(moving.x, grid);
    out.y = snap_to_grid(moving.y, grid);

    let target_xs: Vec<f64> = others.iter().flat_map(|b| [b.x, b.right()]).collect();
    if let Some(dx) = edge_offset([moving.x, moving.right()], &target_xs, tolerance) {
        out.x = moving.x + dx;
    }
    let target_ys: Vec<f64> = others.iter().flat_map(|b| [b.y, b.bottom()]).collect();
    if let Some(dy) = edge_offset([moving.y, moving.bottom()], &target_ys, tolerance) {
        out.y = moving.y + dy;
    }
    out
}
