//! Colour palettes: hex parsing, gradients and age legends.

use crate::types::LegendEntry;

/// Parses `#rrggbb`.
pub fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn to_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// `steps` evenly spaced colours along the piecewise linear gradient through
/// `stops`. The first and last colours are the first and last stops.
pub fn gradient(stops: &[String], steps: usize) -> Vec<String> {
    let stops: Vec<(u8, u8, u8)> = stops.iter().filter_map(|stop| parse_hex(stop)).collect();

    match (stops.as_slice(), steps) {
        (_, 0) | ([], _) => Vec::new(),
        ([only], _) => vec![to_hex(*only); steps],
        (_, 1) => vec![to_hex(stops[0])],
        _ => (0..steps)
            .map(|step| {
                let position = step as f64 / (steps - 1) as f64 * (stops.len() - 1) as f64;
                let segment = (position.floor() as usize).min(stops.len() - 2);
                let t = position - segment as f64;

                let (from, to) = (stops[segment], stops[segment + 1]);
                let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
                to_hex((mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2)))
            })
            .collect(),
    }
}

/// Colour `index` of a palette that repeats once exhausted.
pub fn cycle(palette: &[String], index: usize) -> String {
    if palette.is_empty() {
        return "#000000".to_string();
    }
    palette[index % palette.len()].clone()
}

/// One legend entry per `range` consecutive ages, coloured with the
/// gradient colour at the middle of the range.
///
/// `colors` holds one colour per age.
pub fn age_legend(colors: &[String], range: usize) -> Vec<LegendEntry> {
    let count = colors.len();
    if count == 0 || range == 0 {
        return Vec::new();
    }

    (0..count.div_ceil(range))
        .map(|index| {
            let start = index * range;
            let end = (start + range).min(count) - 1;
            let middle = (start + end + 1) / 2;

            LegendEntry {
                label: format!("[{start}-{end}]"),
                color: colors[middle.min(count - 1)].clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops(colors: &[&str]) -> Vec<String> {
        colors.iter().map(|c| (*c).to_string()).collect()
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#d24413"), Some((0xd2, 0x44, 0x13)));
        assert_eq!(parse_hex("#D24413"), Some((0xd2, 0x44, 0x13)));
        assert_eq!(parse_hex("d24413"), None);
        assert_eq!(parse_hex("#d2441"), None);
        assert_eq!(parse_hex("#zz4413"), None);
    }

    #[test]
    fn test_gradient_endpoints_and_midpoint() {
        let colors = gradient(&stops(&["#000000", "#ffffff"]), 3);
        assert_eq!(colors, ["#000000", "#808080", "#ffffff"]);

        let colors = gradient(&stops(&["#000000", "#ff0000", "#ffffff"]), 5);
        assert_eq!(colors.len(), 5);
        assert_eq!(colors[0], "#000000");
        assert_eq!(colors[2], "#ff0000");
        assert_eq!(colors[4], "#ffffff");
    }

    #[test]
    fn test_gradient_degenerate_inputs() {
        assert!(gradient(&stops(&["#000000", "#ffffff"]), 0).is_empty());
        assert_eq!(gradient(&stops(&["#123456"]), 2), ["#123456", "#123456"]);
        assert_eq!(gradient(&stops(&["#123456", "#ffffff"]), 1), ["#123456"]);
        assert!(gradient(&[], 4).is_empty());
    }

    #[test]
    fn test_cycle_wraps() {
        let palette = stops(&["#000001", "#000002"]);
        assert_eq!(cycle(&palette, 0), "#000001");
        assert_eq!(cycle(&palette, 3), "#000002");
    }

    #[test]
    fn test_age_legend_ranges() {
        let colors: Vec<String> = (0..250).map(|i| format!("#{i:06x}")).collect();
        let legend = age_legend(&colors, 100);

        let labels: Vec<&str> = legend.iter().map(|entry| entry.label.as_str()).collect();
        assert_eq!(labels, ["[0-99]", "[100-199]", "[200-249]"]);
        assert_eq!(legend[0].color, colors[50]);
        assert_eq!(legend[2].color, colors[225]);

        assert!(age_legend(&[], 100).is_empty());
        assert_eq!(age_legend(&colors[..1], 100)[0].label, "[0-0]");
    }
}
