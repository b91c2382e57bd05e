//! Contours: chained cross-section outlines in 3D.

use std::collections::{HashMap, VecDeque};

use brainslice_math::Point3;

/// Endpoint matching tolerance used when chaining section segments.
pub const CHAIN_TOLERANCE: f64 = 1e-4;

/// An ordered sequence of 3D points on a cutting plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// Points in traversal order. A closed contour does not repeat its first point.
    pub points: Vec<Point3>,
    /// Whether the last point connects back to the first.
    pub closed: bool,
}

impl Contour {
    /// Create a contour.
    pub fn new(points: Vec<Point3>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the contour has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total edge length, including the closing edge for closed contours.
    pub fn length(&self) -> f64 {
        let open: f64 = self
            .points
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum();
        match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(first), Some(last)) if self.points.len() > 1 => open + (first - last).norm(),
            _ => open,
        }
    }
}

type PointKey = (i64, i64, i64);

fn point_key(p: &Point3, tolerance: f64) -> PointKey {
    let scale = 1.0 / tolerance;
    (
        (p.x * scale).round() as i64,
        (p.y * scale).round() as i64,
        (p.z * scale).round() as i64,
    )
}

/// Chain loose segments into contours by matching endpoints.
///
/// Endpoints are matched by quantizing to `tolerance`. Each contour is grown
/// in both directions until no unused segment continues it; a contour whose
/// ends meet is closed. Closed contours with fewer than three distinct points
/// are dropped. The result only depends on segment order, so identical input
/// produces identical output.
pub fn chain_segments(segments: &[(Point3, Point3)], tolerance: f64) -> Vec<Contour> {
    if segments.is_empty() {
        return Vec::new();
    }

    // endpoint key -> (segment index, matched at the segment's end)
    let mut adjacency: HashMap<PointKey, Vec<(usize, bool)>> = HashMap::new();
    for (i, (p0, p1)) in segments.iter().enumerate() {
        adjacency.entry(point_key(p0, tolerance)).or_default().push((i, false));
        adjacency.entry(point_key(p1, tolerance)).or_default().push((i, true));
    }

    let mut used = vec![false; segments.len()];

    // Follow unused segments away from `from`, returning the next point.
    let step = |from: &Point3, used: &mut Vec<bool>| -> Option<Point3> {
        let neighbors = adjacency.get(&point_key(from, tolerance))?;
        let &(seg, at_end) = neighbors.iter().find(|(seg, _)| !used[*seg])?;
        used[seg] = true;
        let (s0, s1) = segments[seg];
        Some(if at_end { s0 } else { s1 })
    };

    let mut contours = Vec::new();
    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let (p0, p1) = segments[start];
        let mut chain = VecDeque::from([p0, p1]);

        let mut head = p1;
        while let Some(next) = step(&head, &mut used) {
            chain.push_back(next);
            head = next;
        }
        let mut tail = p0;
        while let Some(prev) = step(&tail, &mut used) {
            chain.push_front(prev);
            tail = prev;
        }

        let mut points: Vec<Point3> = chain.into();
        let closed = points.len() >= 3
            && point_key(&points[0], tolerance) == point_key(&points[points.len() - 1], tolerance);
        if closed {
            points.pop();
            if points.len() < 3 {
                continue;
            }
        }
        contours.push(Contour::new(points, closed));
    }

    contours
}
