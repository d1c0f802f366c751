//! Fixed colour palette for avalanche problem polygons.
//!
//! The map style and the legend page both colour a problem by its position
//! in the legend, so they share this table.

/// Problem fill colours, cycled by legend position.
pub const COLORS: [&str; 8] = [
    "#9B2226", "#005F73", "#E9D8A6", "#BB3E03", "#94D2BD", "#EE9B00", "#CA6702", "#8D8D8D",
];

/// Outline colour drawn around every problem polygon.
pub const STROKE_COLOR: &str = "#8D8D8D";

/// Fill opacity shared by map polygons and legend swatches.
pub const FILL_OPACITY: f32 = 0.5;

/// Colour for the legend entry at `index`.
pub fn color_for_index(index: usize) -> &'static str {
    COLORS[index % COLORS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_cycles() {
        assert_eq!(color_for_index(0), "#9B2226");
        assert_eq!(color_for_index(7), "#8D8D8D");
        assert_eq!(color_for_index(8), "#9B2226");
        assert_eq!(color_for_index(17), "#005F73");
    }
}
