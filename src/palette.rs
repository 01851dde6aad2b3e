//! Precipitation intensity categories and the map's color legend.
//!
//! The nowcast map paints each tile pixel in one of a handful of legend colors.
//! Classification is an exact lookup: anti-aliased or otherwise off-legend
//! pixels are not precipitation.

use std::{fmt, str::FromStr};

use embedded_graphics_core::pixelcolor::Rgb888;
use serde::{Serialize, Serializer};

/// An RGBA color, as captured from the map.
pub type Rgba = [u8; 4];

/// Precipitation intensity, in mm/h, as categorized by the map legend.
///
/// Variants are declared from least to most severe,
/// so the derived ordering is the severity ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Intensity {
    /// No precipitation, or nothing classifiable.
    #[default]
    Missing,
    Mm0,
    Mm1,
    Mm5,
    Mm10,
    Mm20,
    Mm30,
    Mm50,
    Mm80,
}

impl Intensity {
    /// The most severe category; nothing can exceed it.
    pub const MAX: Intensity = Intensity::Mm80;

    /// The legend token for this category.
    pub fn label(self) -> &'static str {
        match self {
            Intensity::Missing => "-",
            Intensity::Mm0 => "0",
            Intensity::Mm1 => "1",
            Intensity::Mm5 => "5",
            Intensity::Mm10 => "10",
            Intensity::Mm20 => "20",
            Intensity::Mm30 => "30",
            Intensity::Mm50 => "50",
            Intensity::Mm80 => "80",
        }
    }

    /// Numeric rank of the category: the mm/h threshold, or -1 for [Intensity::Missing].
    pub fn rank(self) -> i32 {
        match self {
            Intensity::Missing => -1,
            other => other.label().parse().unwrap_or(-1),
        }
    }

    /// Display color for this category.
    pub fn rgb(self) -> Rgb888 {
        let [r, g, b, _] = color_of(self);
        Rgb888::new(r, g, b)
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A token that is not part of the legend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intensity label {0:?}")]
pub struct UnknownLabel(pub String);

impl FromStr for Intensity {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PALETTE
            .iter()
            .map(|(intensity, _)| *intensity)
            .find(|intensity| intensity.label() == s)
            .ok_or_else(|| UnknownLabel(s.to_owned()))
    }
}

impl Serialize for Intensity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// The map legend. Every color is distinct.
pub const PALETTE: [(Intensity, Rgba); 9] = [
    (Intensity::Mm80, [180, 0, 104, 255]),
    (Intensity::Mm50, [255, 40, 0, 255]),
    (Intensity::Mm30, [255, 153, 0, 255]),
    (Intensity::Mm20, [250, 245, 0, 255]),
    (Intensity::Mm10, [0, 65, 255, 255]),
    (Intensity::Mm5, [33, 140, 255, 255]),
    (Intensity::Mm1, [160, 210, 255, 255]),
    (Intensity::Mm0, [242, 242, 255, 255]),
    (Intensity::Missing, [0, 0, 0, 255]),
];

/// Classify a single pixel. Colors outside the legend are [Intensity::Missing].
pub fn classify(pixel: Rgba) -> Intensity {
    PALETTE
        .iter()
        .find(|(_, color)| *color == pixel)
        .map(|(intensity, _)| *intensity)
        .unwrap_or(Intensity::Missing)
}

/// Legend color of a category.
pub fn color_of(intensity: Intensity) -> Rgba {
    // The table covers every variant.
    PALETTE
        .iter()
        .find(|(i, _)| *i == intensity)
        .map(|(_, color)| *color)
        .unwrap_or([0, 0, 0, 255])
}
