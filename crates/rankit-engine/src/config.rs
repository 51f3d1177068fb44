//! Engine configuration.

/// Limits and knobs for the engine services.
///
/// The HTTP layer is expected to sanitize inputs already; these bounds
/// are re-checked here as the last line of defense.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum group name length after trimming (default: 3).
    pub group_name_min_len: usize,
    /// Maximum group name length; longer input is truncated (default: 100).
    pub group_name_max_len: usize,
    /// Minimum item name length after trimming (default: 2).
    pub item_name_min_len: usize,
    /// Maximum item name length (default: 200).
    pub item_name_max_len: usize,
    /// Maximum description length for groups and items (default: 500).
    pub description_max_len: usize,
    /// Page size for group discovery listings (default: 20).
    pub discover_page_size: u64,
    /// Page size used by reconciliation sweeps (default: 100).
    pub reconcile_page_size: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            group_name_min_len: 3,
            group_name_max_len: 100,
            item_name_min_len: 2,
            item_name_max_len: 200,
            description_max_len: 500,
            discover_page_size: 20,
            reconcile_page_size: 100,
        }
    }
}
