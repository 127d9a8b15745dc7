//! Presentation helpers shared by the REST and GraphQL layers.

/// Render a fraction as a percentage with two decimals, e.g. `0.1` -> `"10.00 %"`.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2} %", fraction * 100.0)
}
