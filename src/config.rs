use serde::Deserialize;

/// Tunables for a layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// How many times a paragraph may be laid out again with relaxed break
    /// rules before its current lines are accepted as they are.
    ///
    /// The rules relax in two steps (cluster breaks, then breaks anywhere),
    /// so only values below `2` ever stop a paragraph short and report
    /// [`Diagnostic::RelayoutLimitReached`].
    ///
    /// Defaults to `4`.
    ///
    /// [`Diagnostic::RelayoutLimitReached`]: crate::error::Diagnostic::RelayoutLimitReached
    pub max_relayout_attempts: usize,
    /// Upper bound on the candidate heights probed while balancing a
    /// multi-column box.
    ///
    /// Defaults to `24`.
    pub max_balancing_iterations: usize,
    /// The area driver gives up after this many areas.
    ///
    /// Defaults to `10000`.
    pub max_areas: usize,
    /// Grid line numbers and spans are clamped to this many tracks per axis.
    ///
    /// Defaults to `1000`.
    pub max_grid_lines: u32,
    /// Tolerance for floating point comparisons of lengths.
    pub epsilon: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_relayout_attempts: 4,
            max_balancing_iterations: 24,
            max_areas: 10_000,
            max_grid_lines: 1000,
            epsilon: 0.001,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: LayoutConfig = serde_json::from_str(r#"{"maxAreas": 3}"#).unwrap();
        assert_eq!(config.max_areas, 3);
        assert_eq!(config.max_relayout_attempts, 4);
        assert_eq!(config.max_balancing_iterations, 24);
        assert_eq!(config.max_grid_lines, 1000);
    }
}
