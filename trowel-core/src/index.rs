/// Sorted Z-extent projections used to find the faces crossing a height
use std::cmp::Ordering;

use crate::face::{Face, ZBounds};

/// Insert `item` into the sorted `items`, to the right of any equal keys.
///
/// Binary search for the slot, then shift the tail.
pub fn insort_by_key<T, F>(items: &mut Vec<T>, item: T, key: F)
where
    F: Fn(&T) -> f64,
{
    let k = key(&item);
    let at = items.partition_point(|e| key(e).total_cmp(&k) != Ordering::Greater);
    items.insert(at, item);
}

fn lower(bounds: ZBounds) -> f64 {
    bounds.lower
}

fn upper(bounds: ZBounds) -> f64 {
    bounds.upper
}

/// Face positions ordered by lower and by upper Z bound.
///
/// Both orders always hold every position of the owning face list exactly once.
#[derive(Debug, Clone, Default)]
pub struct ZIndex {
    by_lower: Vec<usize>,
    by_upper: Vec<usize>,
}

impl ZIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resort both orders from scratch.
    pub fn rebuild(&mut self, faces: &[Face]) {
        self.by_lower = sorted_positions(faces, lower);
        self.by_upper = sorted_positions(faces, upper);
    }

    /// Insert the face stored at `position`, which must already be in `faces`.
    pub fn insert(&mut self, faces: &[Face], position: usize) {
        insort_by_key(&mut self.by_lower, position, |&i| {
            lower(faces[i].z_bounds())
        });
        insort_by_key(&mut self.by_upper, position, |&i| {
            upper(faces[i].z_bounds())
        });
    }

    pub fn by_lower(&self) -> &[usize] {
        &self.by_lower
    }

    pub fn by_upper(&self) -> &[usize] {
        &self.by_upper
    }

    pub fn len(&self) -> usize {
        self.by_lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_lower.is_empty()
    }

    /// Positions of the faces whose extent contains `z`, in ascending order.
    pub fn stab(&self, faces: &[Face], z: f64) -> Vec<usize> {
        self.overlapping(faces, z, z)
    }

    /// Positions of the faces whose extent overlaps `[low, high]`, in ascending order.
    ///
    /// The prefix of `by_lower` with `lower <= high` is intersected with the
    /// suffix of `by_upper` with `upper >= low`.
    ///
    /// Bounds are compared with IEEE operators, so `-0.0` and `0.0` match each
    /// other. Both orders are sorted by `total_cmp`, under which the predicates
    /// stay monotone.
    pub fn overlapping(&self, faces: &[Face], low: f64, high: f64) -> Vec<usize> {
        let under = self
            .by_lower
            .partition_point(|&i| faces[i].z_bounds().lower <= high);
        let over = self
            .by_upper
            .partition_point(|&i| faces[i].z_bounds().upper < low);

        let mut below_or_at = vec![false; faces.len()];
        for &i in &self.by_lower[..under] {
            below_or_at[i] = true;
        }

        let mut hits: Vec<usize> = self.by_upper[over..]
            .iter()
            .copied()
            .filter(|&i| below_or_at[i])
            .collect();
        hits.sort_unstable();
        hits
    }
}

fn sorted_positions(faces: &[Face], key: fn(ZBounds) -> f64) -> Vec<usize> {
    let mut positions: Vec<usize> = (0..faces.len()).collect();
    // stable, so equal keys keep face order
    positions.sort_by(|&a, &b| key(faces[a].z_bounds()).total_cmp(&key(faces[b].z_bounds())));
    positions
}
