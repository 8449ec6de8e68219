use std::collections::{BTreeSet, HashMap};

use gravity_core::BodyId;

use crate::body::Body;

/// Cells a single body may occupy along one axis before it is treated as
/// spanning the whole grid.
const MAX_CELLS_PER_AXIS: f64 = 64.0;

/// Extension point for collision detection.
///
/// Produces pairs of bodies whose swept bounds overlap. Nothing in the core
/// resolves these pairs; they are reported so a collision stage can be added.
pub trait BroadPhase: Send + Sync {
    /// Candidate pairs `(a, b)` with `a < b`, sorted and without duplicates
    fn candidate_pairs(&self, bodies: &[Body]) -> Vec<(BodyId, BodyId)>;
}

/// Uniform grid keyed by cell coordinates.
/// Each body is hashed into every cell its bounds touch.
#[derive(Debug, Clone)]
pub struct GridBroadPhase {
    cell_size: f64,
}

impl GridBroadPhase {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(f64::EPSILON),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    fn cell_of(&self, coordinate: f64) -> i64 {
        (coordinate / self.cell_size).floor() as i64
    }
}

impl BroadPhase for GridBroadPhase {
    fn candidate_pairs(&self, bodies: &[Body]) -> Vec<(BodyId, BodyId)> {
        let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        let mut oversized = Vec::new();

        for (i, body) in bodies.iter().enumerate() {
            if !body.exists() || !body.is_finite() {
                continue;
            }
            // Span is measured before converting to cells; huge bounds saturate the cast
            let span = (body.bounds.max - body.bounds.min) / self.cell_size;
            if !(span.x < MAX_CELLS_PER_AXIS && span.y < MAX_CELLS_PER_AXIS) {
                oversized.push(i);
                continue;
            }
            let (x0, x1) = (self.cell_of(body.bounds.min.x), self.cell_of(body.bounds.max.x));
            let (y0, y1) = (self.cell_of(body.bounds.min.y), self.cell_of(body.bounds.max.y));
            for gx in x0..=x1 {
                for gy in y0..=y1 {
                    cells.entry((gx, gy)).or_default().push(i);
                }
            }
        }

        let mut pairs = BTreeSet::new();
        let mut consider = |a: usize, b: usize| {
            if a != b && bodies[a].bounds.overlaps(&bodies[b].bounds) {
                let (ida, idb) = (bodies[a].id, bodies[b].id);
                pairs.insert((ida.min(idb), ida.max(idb)));
            }
        };

        for members in cells.values() {
            for (n, &a) in members.iter().enumerate() {
                for &b in &members[n + 1..] {
                    consider(a, b);
                }
            }
        }

        // Bodies too large for the grid are tested against everything
        for &a in &oversized {
            for (b, other) in bodies.iter().enumerate() {
                if other.exists() && other.is_finite() {
                    consider(a, b);
                }
            }
        }

        pairs.into_iter().collect()
    }
}
