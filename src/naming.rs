//! Human-readable color names.
//!
//! [`nearest_named_color`] scans a fixed reference table in RGB space and
//! pairs the closest entry with a coarse perceptual name from
//! [`simple_color_name`].

use serde::Serialize;

use crate::color::{rgb_to_hsl, Rgb};

/// Reference colors as `(name, hex)`. Lookups are stable in table order.
pub const REFERENCE_COLORS: &[(&str, &str)] = &[
    ("Black", "#000000"),
    ("Night", "#0c090a"),
    ("Licorice", "#1a1110"),
    ("Jet", "#343434"),
    ("Charcoal", "#36454f"),
    ("Onyx", "#353839"),
    ("Dim Gray", "#696969"),
    ("Gray", "#808080"),
    ("Dark Gray", "#a9a9a9"),
    ("Silver", "#c0c0c0"),
    ("Light Gray", "#d3d3d3"),
    ("Gainsboro", "#dcdcdc"),
    ("White Smoke", "#f5f5f5"),
    ("White", "#ffffff"),
    ("Dark Chocolate", "#3d2b1f"),
    ("Bistre", "#3d2b1f"),
    ("Cafe Noir", "#4b3621"),
    ("Dark Brown", "#654321"),
    ("Coffee", "#6f4e37"),
    ("Chestnut", "#954535"),
    ("Auburn", "#a52a2a"),
    ("Brown", "#964b00"),
    ("Saddle Brown", "#8b4513"),
    ("Sienna", "#a0522d"),
    ("Russet", "#80461b"),
    ("Chocolate", "#d2691e"),
    ("Cinnamon", "#c58c5d"),
    ("Copper", "#b87333"),
    ("Mahogany", "#c04000"),
    ("Umber", "#635147"),
    ("Raw Umber", "#826644"),
    ("Taupe", "#483c32"),
    ("Mocha", "#967969"),
    ("Walnut", "#773f1a"),
    ("Hazel", "#8e7618"),
    ("Amber", "#ffbf00"),
    ("Caramel", "#af6f09"),
    ("Bronze", "#cd7f32"),
    ("Peru", "#cd853f"),
    ("Tan", "#d2b48c"),
    ("Burlywood", "#deb887"),
    ("Sandy Brown", "#f4a460"),
    ("Camel", "#c19a6b"),
    ("Fawn", "#e5aa70"),
    ("Desert Sand", "#edc9af"),
    ("Almond", "#efdecd"),
    ("Beige", "#f5f5dc"),
    ("Bisque", "#ffe4c4"),
    ("Wheat", "#f5deb3"),
    ("Peach Puff", "#ffdab9"),
    ("Apricot", "#fbceb1"),
    ("Pale Dogwood", "#ecc5c0"),
    ("Linen", "#faf0e6"),
    ("Antique White", "#faebd7"),
    ("Ivory", "#fffff0"),
    ("Cornsilk", "#fff8dc"),
    ("Blond", "#faf0be"),
    ("Flax", "#eedc82"),
    ("Buff", "#f0dc82"),
    ("Straw", "#e4d96f"),
    ("Gold", "#ffd700"),
    ("Goldenrod", "#daa520"),
    ("Dark Goldenrod", "#b8860b"),
    ("Khaki", "#c3b091"),
    ("Dark Khaki", "#bdb76b"),
    ("Olive", "#808000"),
    ("Dark Olive Green", "#556b2f"),
    ("Yellow", "#ffff00"),
    ("Lemon Chiffon", "#fffacd"),
    ("Orange", "#ffa500"),
    ("Dark Orange", "#ff8c00"),
    ("Burnt Orange", "#cc5500"),
    ("Tangerine", "#f28500"),
    ("Coral", "#ff7f50"),
    ("Salmon", "#fa8072"),
    ("Dark Salmon", "#e9967a"),
    ("Light Salmon", "#ffa07a"),
    ("Tomato", "#ff6347"),
    ("Red", "#ff0000"),
    ("Crimson", "#dc143c"),
    ("Firebrick", "#b22222"),
    ("Dark Red", "#8b0000"),
    ("Maroon", "#800000"),
    ("Burgundy", "#800020"),
    ("Rust", "#b7410e"),
    ("Terra Cotta", "#e2725b"),
    ("Indian Red", "#cd5c5c"),
    ("Rosy Brown", "#bc8f8f"),
    ("Misty Rose", "#ffe4e1"),
    ("Pink", "#ffc0cb"),
    ("Light Pink", "#ffb6c1"),
    ("Hot Pink", "#ff69b4"),
    ("Deep Pink", "#ff1493"),
    ("Pale Violet Red", "#db7093"),
    ("Magenta", "#ff00ff"),
    ("Orchid", "#da70d6"),
    ("Plum", "#dda0dd"),
    ("Violet", "#ee82ee"),
    ("Lavender", "#e6e6fa"),
    ("Thistle", "#d8bfd8"),
    ("Medium Purple", "#9370db"),
    ("Purple", "#800080"),
    ("Indigo", "#4b0082"),
    ("Dark Slate Blue", "#483d8b"),
    ("Slate Blue", "#6a5acd"),
    ("Midnight Blue", "#191970"),
    ("Navy", "#000080"),
    ("Dark Blue", "#00008b"),
    ("Medium Blue", "#0000cd"),
    ("Blue", "#0000ff"),
    ("Royal Blue", "#4169e1"),
    ("Cornflower Blue", "#6495ed"),
    ("Steel Blue", "#4682b4"),
    ("Dodger Blue", "#1e90ff"),
    ("Deep Sky Blue", "#00bfff"),
    ("Sky Blue", "#87ceeb"),
    ("Light Sky Blue", "#87cefa"),
    ("Light Blue", "#add8e6"),
    ("Powder Blue", "#b0e0e6"),
    ("Light Steel Blue", "#b0c4de"),
    ("Slate Gray", "#708090"),
    ("Light Slate Gray", "#778899"),
    ("Dark Slate Gray", "#2f4f4f"),
    ("Alice Blue", "#f0f8ff"),
    ("Azure", "#f0ffff"),
    ("Cyan", "#00ffff"),
    ("Turquoise", "#40e0d0"),
    ("Dark Turquoise", "#00ced1"),
    ("Cadet Blue", "#5f9ea0"),
    ("Teal", "#008080"),
    ("Dark Cyan", "#008b8b"),
    ("Aquamarine", "#7fffd4"),
    ("Medium Aquamarine", "#66cdaa"),
    ("Sea Green", "#2e8b57"),
    ("Medium Sea Green", "#3cb371"),
    ("Dark Sea Green", "#8fbc8f"),
    ("Forest Green", "#228b22"),
    ("Green", "#008000"),
    ("Dark Green", "#006400"),
    ("Lime Green", "#32cd32"),
    ("Lime", "#00ff00"),
    ("Light Green", "#90ee90"),
    ("Pale Green", "#98fb98"),
    ("Olive Drab", "#6b8e23"),
    ("Yellow Green", "#9acd32"),
    ("Moss Green", "#8a9a5b"),
    ("Sage", "#bcb88a"),
    ("Jade", "#00a86b"),
    ("Emerald", "#50c878"),
    ("Honeydew", "#f0fff0"),
];

/// The closest reference color plus a coarse perceptual name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedColor {
    pub detailed_name: String,
    pub simple_name: String,
    pub hex: String,
    pub distance: f32,
}

/// Nearest entry of [`REFERENCE_COLORS`] by Euclidean RGB distance.
///
/// Ties keep the first entry in table order.
pub fn nearest_named_color(color: Rgb) -> NamedColor {
    let mut nearest = NamedColor {
        detailed_name: "unknown".to_string(),
        simple_name: simple_color_name(color).to_string(),
        hex: "#000000".to_string(),
        distance: f32::INFINITY,
    };

    for (name, hex) in REFERENCE_COLORS {
        let Some(reference) = Rgb::from_hex(hex) else {
            continue;
        };
        let distance = color.distance(&reference);
        if distance < nearest.distance {
            nearest.detailed_name = (*name).to_string();
            nearest.hex = (*hex).to_string();
            nearest.distance = distance;
        }
    }

    nearest
}

/// Basic color word for an RGB value, from hue/saturation/lightness bands.
pub fn simple_color_name(color: Rgb) -> &'static str {
    let hsl = rgb_to_hsl(color.r, color.g, color.b);
    let (h, s, l) = (hsl.h, hsl.s, hsl.l);

    if l < 10.0 {
        return "black";
    }
    if l > 94.0 {
        return "white";
    }
    if s < 12.0 {
        return if l < 30.0 {
            "dark gray"
        } else if l > 75.0 {
            "light gray"
        } else {
            "gray"
        };
    }

    match h {
        h if !(15.0..345.0).contains(&h) => {
            if l > 75.0 {
                "pink"
            } else if l < 30.0 {
                "maroon"
            } else {
                "red"
            }
        }
        h if h < 50.0 => {
            if l < 45.0 {
                "brown"
            } else if l > 70.0 || s < 45.0 {
                "beige"
            } else {
                "orange"
            }
        }
        h if h < 70.0 => {
            if l < 35.0 {
                "olive"
            } else {
                "yellow"
            }
        }
        h if h < 165.0 => "green",
        h if h < 195.0 => {
            if l < 40.0 {
                "teal"
            } else {
                "cyan"
            }
        }
        h if h < 255.0 => {
            if l < 30.0 {
                "navy"
            } else {
                "blue"
            }
        }
        h if h < 290.0 => "purple",
        _ => {
            if l < 40.0 {
                "purple"
            } else {
                "pink"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_table_is_well_formed() {
        for (name, hex) in REFERENCE_COLORS {
            assert!(Rgb::from_hex(hex).is_some(), "{name} has bad hex {hex}");
        }
    }

    #[test]
    fn exact_matches() {
        let c = nearest_named_color(Rgb::new(255, 0, 0));
        assert_eq!(c.detailed_name, "Red");
        assert_eq!(c.hex, "#ff0000");
        assert_eq!(c.distance, 0.0);
        assert_eq!(c.simple_name, "red");

        let c = nearest_named_color(Rgb::new(1, 1, 1));
        assert_eq!(c.detailed_name, "Black");
        assert_eq!(c.simple_name, "black");
    }

    #[test]
    fn ties_keep_table_order() {
        // "Dark Chocolate" and "Bistre" share a hex value
        let c = nearest_named_color(Rgb::new(0x3d, 0x2b, 0x1f));
        assert_eq!(c.detailed_name, "Dark Chocolate");
    }

    #[test]
    fn simple_names() {
        assert_eq!(simple_color_name(Rgb::new(255, 255, 255)), "white");
        assert_eq!(simple_color_name(Rgb::new(128, 128, 128)), "gray");
        assert_eq!(simple_color_name(Rgb::new(101, 67, 33)), "brown");
        assert_eq!(simple_color_name(Rgb::new(0, 0, 255)), "blue");
        assert_eq!(simple_color_name(Rgb::new(0, 128, 0)), "green");
        assert_eq!(simple_color_name(Rgb::new(210, 180, 140)), "beige");
    }
}
