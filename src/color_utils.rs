//! Color utility functions shared across the application.
//!
//! Box and share-bar colors come from a fixed palette. A label takes the palette
//! slot of its first-seen position, so every cluster carrying the same label is
//! drawn in the same color.

use std::collections::BTreeMap;

use crate::model::{ClusterId, LabelAssignments};

/// RGB color with 8 bits per channel.
pub type Rgb = [u8; 3];

/// Fixed box palette (category10).
pub const PALETTE: [Rgb; 10] = [
    [31, 119, 180],
    [255, 127, 14],
    [44, 160, 44],
    [214, 39, 40],
    [148, 103, 189],
    [140, 86, 75],
    [227, 119, 194],
    [127, 127, 127],
    [188, 189, 34],
    [23, 190, 207],
];

/// Color for clusters that have no label and no palette fallback.
pub const FALLBACK_GRAY: Rgb = [160, 160, 160];

/// Format a color as `#rrggbb`.
pub fn to_hex(color: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn from_hex(hex: &str) -> Option<Rgb> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Palette slot for a cluster id, used for clusters without a label.
pub fn palette_color(palette: &[Rgb], cluster_id: ClusterId) -> Option<Rgb> {
    if palette.is_empty() {
        return None;
    }
    Some(palette[cluster_id as usize % palette.len()])
}

/// Colors of labels in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelColors {
    entries: Vec<(String, Rgb)>,
}

impl LabelColors {
    /// Color of a label, if it has been seen.
    pub fn get(&self, label: &str) -> Option<Rgb> {
        self.entries
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, color)| *color)
    }

    /// Labels and colors in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.entries.iter().map(|(name, color)| (name.as_str(), *color))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_or_insert(&mut self, label: &str, palette: &[Rgb]) -> Rgb {
        if let Some(color) = self.get(label) {
            return color;
        }
        let color = if palette.is_empty() {
            FALLBACK_GRAY
        } else {
            palette[self.entries.len() % palette.len()]
        };
        self.entries.push((label.to_string(), color));
        color
    }
}

/// Palette colors of the labels in use.
///
/// Assignments are walked in ascending cluster id. Each label receives the next
/// palette slot the first time it is encountered.
pub fn label_colors(assignments: &LabelAssignments, palette: &[Rgb]) -> LabelColors {
    let mut labels = LabelColors::default();
    for (_, label) in assignments.iter() {
        labels.get_or_insert(label, palette);
    }
    labels
}

/// Assign a color to every labeled cluster.
///
/// Every cluster carrying a label shares that label's color from [`label_colors`].
pub fn assign_colors(assignments: &LabelAssignments, palette: &[Rgb]) -> BTreeMap<ClusterId, Rgb> {
    let labels = label_colors(assignments, palette);
    assignments
        .iter()
        .filter_map(|(cluster_id, label)| labels.get(label).map(|color| (cluster_id, color)))
        .collect()
}
