//! Slicing parameters and presets.

/// Parameters for a slicing query.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceParams {
    /// Vertices closer than this to the cutting plane are treated as lying on it.
    ///
    /// Zero compares signed distances with zero exactly.
    pub tolerance: f64,
}

impl Default for SliceParams {
    fn default() -> Self {
        Self { tolerance: 0.0 }
    }
}

impl SliceParams {
    /// Snap vertices within `1e-9` model units of the plane onto it.
    ///
    /// Suited to meshes that were transformed or exported with rounding.
    #[must_use]
    pub fn tolerant() -> Self {
        Self { tolerance: 1e-9 }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.abs();
        self
    }
}
