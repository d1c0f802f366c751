//! Mapnik style document generation.
//!
//! The tile server renders each day's shapefile with one `<Rule>` per
//! avalanche problem, filtering polygons on their `problem_id` attribute.
//! Projection and tile metadata are fixed; only the rules and the
//! datasource file name depend on the day.

use forecast_common::palette::{FILL_OPACITY, STROKE_COLOR};
use forecast_common::Legend;

use crate::markup::{cdata, escape};

/// PROJ definition of EPSG:3857 as Mapnik expects it.
pub const WEB_MERCATOR_SRS: &str = "+proj=merc +a=6378137 +b=6378137 +lat_ts=0.0 +lon_0=0.0 +x_0=0.0 +y_0=0.0 +k=1.0 +units=m +nadgrids=@null +wktext +no_defs +over";

/// Attribute the style rules filter on.
pub const FILTER_ATTRIBUTE: &str = "problem_id";

pub const STYLE_NAME: &str = "avalanche_style_simple";
pub const LAYER_NAME: &str = "avalanche_layer";

/// Incrementally builds a Mapnik style document for one day.
#[derive(Debug, Clone)]
pub struct StyleDocumentBuilder {
    day: String,
    xml: String,
    rules: usize,
}

impl StyleDocumentBuilder {
    /// Start a document: header, parameters and the opening `<Style>`.
    pub fn new(day: &str) -> Self {
        let mut xml = String::new();

        xml.push_str(&format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE Map[]>
<Map srs="{}">
"#,
            WEB_MERCATOR_SRS
        ));

        // TileJSON parameters
        xml.push_str(
            r#"  <Parameters>
    <Parameter name="bounds">0,50,50,90</Parameter>
    <Parameter name="format"><![CDATA[png8]]></Parameter>
    <Parameter name="name"><![CDATA[Avalanche Forecast]]></Parameter>
    <Parameter name="attribution"><![CDATA[Met Norway & Varsom]]></Parameter>
    <Parameter name="tilejson"><![CDATA[2.0.0]]></Parameter>
    <Parameter name="scheme"><![CDATA[xyz]]></Parameter>
  </Parameters>
"#,
        );

        xml.push_str(&format!("  <Style name=\"{}\">\n", STYLE_NAME));

        Self {
            day: day.to_string(),
            xml,
            rules: 0,
        }
    }

    /// Add a rule filling polygons of `problem_id` with `color`.
    pub fn push_rule(&mut self, problem_id: &str, color: &str) {
        self.xml.push_str(&format!(
            r#"    <Rule>
      <Filter><![CDATA[([{}] = {})]]></Filter>
      <PolygonSymbolizer fill="{}" fill-opacity="{}" />
      <LineSymbolizer stroke="{}" stroke-linejoin="round" stroke-width="1" />
    </Rule>
"#,
            FILTER_ATTRIBUTE,
            cdata(&filter_literal(problem_id)),
            escape(color),
            FILL_OPACITY,
            STROKE_COLOR
        ));
        self.rules += 1;
    }

    pub fn rule_count(&self) -> usize {
        self.rules
    }

    /// Close the style and append the layer reading `./{day}.shp`.
    ///
    /// The layer is written whether or not the shapefile exists.
    pub fn finish(mut self) -> String {
        self.xml.push_str("  </Style>\n");

        self.xml.push_str(&format!(
            r#"  <Layer name="{}" srs="{}">
    <StyleName>{}</StyleName>
    <Datasource>
      <Parameter name="file">./{}.shp</Parameter>
      <Parameter name="type">shape</Parameter>
    </Datasource>
  </Layer>
</Map>
"#,
            LAYER_NAME,
            WEB_MERCATOR_SRS,
            STYLE_NAME,
            escape(&self.day)
        ));

        self.xml
    }
}

/// Build the style document for a day on its own.
pub fn build_style(day: &str, legend: Option<&Legend>) -> String {
    let mut builder = StyleDocumentBuilder::new(day);
    if let Some(legend) = legend {
        for entry in legend.colored_entries() {
            builder.push_rule(entry.problem_id, entry.color);
        }
    }
    builder.finish()
}

/// Render a problem id as a Mapnik filter literal.
///
/// Numeric ids compare against numeric attributes and stay bare; anything
/// else becomes a quoted string.
fn filter_literal(problem_id: &str) -> String {
    if is_numeric_literal(problem_id) {
        problem_id.to_string()
    } else {
        format!("'{}'", problem_id.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

fn is_numeric_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next();

    !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_common::LegendEntry;

    #[test]
    fn test_filter_literal() {
        assert_eq!(filter_literal("10"), "10");
        assert_eq!(filter_literal("-3.5"), "-3.5");
        assert_eq!(filter_literal("wind"), "'wind'");
        assert_eq!(filter_literal("it's"), "'it\\'s'");
        assert_eq!(filter_literal("1."), "'1.'");
        assert_eq!(filter_literal(""), "''");
        assert_eq!(filter_literal("NaN"), "'NaN'");
    }

    #[test]
    fn test_rule_uses_entry_color() {
        let mut legend = Legend::new();
        legend.insert("10", LegendEntry::new("Wind slab", "Upper elevations"));
        legend.insert("7", LegendEntry::new("Wet snow", "Below treeline"));

        let xml = build_style("2024-01-10", Some(&legend));
        assert!(xml.contains("<Filter><![CDATA[([problem_id] = 10)]]></Filter>"));
        assert!(xml.contains(r##"<PolygonSymbolizer fill="#9B2226" fill-opacity="0.5" />"##));
        assert!(xml.contains("<Filter><![CDATA[([problem_id] = 7)]]></Filter>"));
        assert!(xml.contains(r##"fill="#005F73""##));
    }

    #[test]
    fn test_layer_references_day_shapefile() {
        let xml = build_style("2024-01-10", None);
        assert!(xml.contains(r#"<Parameter name="file">./2024-01-10.shp</Parameter>"#));
        assert!(!xml.contains("<Rule>"));
        assert!(xml.trim_end().ends_with("</Map>"));
    }

    #[test]
    fn test_builder_counts_rules() {
        let mut builder = StyleDocumentBuilder::new("d");
        builder.push_rule("1", "#9B2226");
        builder.push_rule("2", "#005F73");
        assert_eq!(builder.rule_count(), 2);
    }
}
