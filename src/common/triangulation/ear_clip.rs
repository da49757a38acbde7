//! Ear-clipping triangulation of a simple 2D polygon. This is the workhorse
//! for filling mesh holes once their boundary loop has been projected onto a
//! best-fit plane: the projected loop becomes a polygon, and the triangles
//! produced here become the fill faces.

use super::Point2;
use crate::Result;

const DEGENERATE_AREA: f64 = 1e-12;

/// Triangulate a simple polygon given by its vertices in loop order. The
/// returned triangles index into the input slice and are wound in the same
/// direction as the input polygon.
///
/// Fails when the polygon has fewer than three vertices, has near-zero area,
/// or is not simple enough for an ear to be found (self-intersecting
/// outlines).
///
/// # Arguments
///
/// * `points`: the polygon vertices in loop order, first and last not
///   repeated
///
/// returns: Result<Vec<[usize; 3]>, ReconError>
pub fn triangulate_polygon(points: &[Point2]) -> Result<Vec<[usize; 3]>> {
    if points.len() < 3 {
        return Err("polygon must have at least three vertices".into());
    }

    let area = signed_area(points);
    if area.abs() < DEGENERATE_AREA {
        return Err("polygon has near-zero area".into());
    }

    // Work on a CCW index list so the convexity test has a fixed sign
    let reversed = area < 0.0;
    let mut working: Vec<usize> = (0..points.len()).collect();
    if reversed {
        working.reverse();
    }

    let mut faces = Vec::with_capacity(points.len() - 2);
    while working.len() > 3 {
        let Some(ear) = find_ear(points, &working) else {
            return Err("no ear found, polygon outline is not simple".into());
        };

        let n = working.len();
        let prev = working[(ear + n - 1) % n];
        let next = working[(ear + 1) % n];
        faces.push([prev, working[ear], next]);
        working.remove(ear);
    }
    faces.push([working[0], working[1], working[2]]);

    if reversed {
        for f in &mut faces {
            f.swap(0, 2);
        }
    }

    Ok(faces)
}

fn signed_area(points: &[Point2]) -> f64 {
    let mut sum = 0.0;
    for i in 0..points.len() {
        let a = &points[i];
        let b = &points[(i + 1) % points.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

fn find_ear(points: &[Point2], working: &[usize]) -> Option<usize> {
    let n = working.len();
    for i in 0..n {
        let prev = &points[working[(i + n - 1) % n]];
        let cur = &points[working[i]];
        let next = &points[working[(i + 1) % n]];

        // Reflex vertices cannot be ears
        let cross = (cur - prev).perp(&(next - cur));
        if cross <= DEGENERATE_AREA {
            continue;
        }

        let blocked = working
            .iter()
            .filter(|&&j| j != working[(i + n - 1) % n] && j != working[i] && j != working[(i + 1) % n])
            .any(|&j| point_in_triangle(&points[j], prev, cur, next));

        if !blocked {
            return Some(i);
        }
    }
    None
}

fn point_in_triangle(p: &Point2, a: &Point2, b: &Point2, c: &Point2) -> bool {
    let d0 = (b - a).perp(&(p - a));
    let d1 = (c - b).perp(&(p - b));
    let d2 = (a - c).perp(&(p - c));

    let has_neg = d0 < 0.0 || d1 < 0.0 || d2 < 0.0;
    let has_pos = d0 > 0.0 || d1 > 0.0 || d2 > 0.0;
    !(has_neg && has_pos)
}
