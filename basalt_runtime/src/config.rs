//! Heap configuration parameters.

/// Configuration for the mark-sweep heap.
///
/// Thresholds are counted in cells rather than bytes: every cell is one
/// object or one boxed double, and the slot vectors they own are accounted
/// to them.
#[derive(Debug, Clone)]
pub struct GcConfig {
    /// Live-cell count that triggers `should_collect`.
    ///
    /// Default: 4096.
    pub collect_threshold: usize,

    /// After a collection the threshold becomes
    /// `max(collect_threshold, live * growth_factor)`.
    ///
    /// Default: 1.5.
    pub growth_factor: f64,

    /// Collect before every allocation. Slow; intended for tests that need
    /// to shake out missing roots.
    ///
    /// Default: false.
    pub stress: bool,
}

impl Default for GcConfig {
    fn default() -> GcConfig {
        GcConfig {
            collect_threshold: 4096,
            growth_factor: 1.5,
            stress: false,
        }
    }
}
