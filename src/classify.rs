//! Breakpoint classification of a numeric metric into a color bucket.
//!
//! A table holds N ascending thresholds and N+1 colors. Bucket `i < N`
//! covers values `<= thresholds[i]` (and above the previous threshold);
//! the final bucket covers everything above the last threshold.
//!
//! Non-finite input has a fixed policy: NaN goes to the lowest bucket,
//! positive infinity to the highest. Negative values need no special case,
//! they land in the lowest bucket through the normal scan.

use crate::error::TableError;

#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointTable {
    thresholds: Vec<f64>,
    colors: Vec<String>,
}

impl BreakpointTable {
    pub fn new(thresholds: Vec<f64>, colors: Vec<String>) -> Result<Self, TableError> {
        if thresholds.is_empty() {
            return Err(TableError::Empty);
        }
        if colors.len() != thresholds.len() + 1 {
            return Err(TableError::PaletteSize {
                thresholds: thresholds.len(),
                expected: thresholds.len() + 1,
                found: colors.len(),
            });
        }
        for (index, &value) in thresholds.iter().enumerate() {
            if !value.is_finite() {
                return Err(TableError::NonFinite { index });
            }
            if index > 0 && value <= thresholds[index - 1] {
                return Err(TableError::NotAscending { index, value });
            }
        }
        if let Some(bad) = colors.iter().find(|c| parse_hex_color(c).is_none()) {
            return Err(TableError::InvalidColor(bad.clone()));
        }

        Ok(Self { thresholds, colors })
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    /// Index of the bucket `value` falls in, `0..=thresholds.len()`.
    pub fn bucket(&self, value: f64) -> usize {
        if value.is_nan() {
            return 0;
        }
        self.thresholds
            .iter()
            .position(|&t| value <= t)
            .unwrap_or(self.thresholds.len())
    }

    pub fn classify(&self, value: f64) -> &str {
        &self.colors[self.bucket(value)]
    }
}

/// `#rrggbb` to its channels.
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.strip_prefix('#')?;
    // from_str_radix alone would let a leading '+' through
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const PALETTE: [&str; 5] = ["#feedde", "#fdbe85", "#fd8d3c", "#e6550d", "#a63603"];

    pub(crate) fn table(thresholds: &[f64]) -> BreakpointTable {
        BreakpointTable::new(
            thresholds.to_vec(),
            PALETTE.iter().map(|c| c.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn extremes_map_to_first_and_last_colors() {
        let t = table(&[15.0, 30.0, 60.0, 80.0]);
        assert_eq!(t.classify(0.0), "#feedde");
        assert_eq!(t.classify(15.0), "#feedde");
        assert_eq!(t.classify(80.5), "#a63603");
        assert_eq!(t.classify(1e9), "#a63603");
    }

    #[test]
    fn equality_goes_to_the_earlier_bucket() {
        let t = table(&[15.0, 30.0, 60.0, 80.0]);
        assert_eq!(t.bucket(30.0), 1);
        assert_eq!(t.bucket(30.000001), 2);
        assert_eq!(t.bucket(60.0), 2);
        assert_eq!(t.bucket(80.0), 3);
    }

    #[test]
    fn per_capita_breaks() {
        let t = table(&[0.0004, 0.001, 0.002, 0.004]);
        assert_eq!(t.classify(0.000002), "#feedde");
        assert_eq!(t.classify(0.0015), "#fd8d3c");
        assert_eq!(t.classify(0.01), "#a63603");
    }

    #[test]
    fn non_finite_and_negative_policy() {
        let t = table(&[15.0, 30.0, 60.0, 80.0]);
        assert_eq!(t.bucket(f64::NAN), 0);
        assert_eq!(t.bucket(f64::NEG_INFINITY), 0);
        assert_eq!(t.bucket(-3.0), 0);
        assert_eq!(t.bucket(f64::INFINITY), 4);
    }

    #[test]
    fn rejects_malformed_tables() {
        let colors = |n: usize| vec!["#000000".to_string(); n];
        assert_eq!(BreakpointTable::new(vec![], colors(1)), Err(TableError::Empty));
        assert_eq!(
            BreakpointTable::new(vec![1.0, 2.0], colors(2)),
            Err(TableError::PaletteSize { thresholds: 2, expected: 3, found: 2 })
        );
        assert_eq!(
            BreakpointTable::new(vec![1.0, f64::NAN], colors(3)),
            Err(TableError::NonFinite { index: 1 })
        );
        assert_eq!(
            BreakpointTable::new(vec![2.0, 2.0], colors(3)),
            Err(TableError::NotAscending { index: 1, value: 2.0 })
        );
        assert_eq!(
            BreakpointTable::new(vec![1.0], vec!["#000000".to_string(), "orange".to_string()]),
            Err(TableError::InvalidColor("orange".to_string()))
        );
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#fd8d3c"), Some([0xfd, 0x8d, 0x3c]));
        assert_eq!(parse_hex_color("fd8d3c"), None);
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(parse_hex_color("#+f+f+f"), None);
        assert_eq!(
            BreakpointTable::new(vec![1.0], vec!["#000000".to_string(), "#+f+f+f".to_string()]),
            Err(TableError::InvalidColor("#+f+f+f".to_string()))
        );
    }
}
