//! Share-of-facings breakdown.
//!
//! Only labeled detections count: unlabeled ones are left out of both the
//! per-label counts and the total. Rows keep the order in which labels are first
//! met while walking the detections in response order.

use crate::color_utils::Rgb;
use crate::model::{Detection, LabelAssignments};

/// Label → facing count, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacingCounts {
    entries: Vec<(String, usize)>,
}

impl FacingCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count labeled detections per label.
    pub fn from_detections(detections: &[Detection], labels: &LabelAssignments) -> Self {
        let mut counts = Self::new();
        for detection in detections {
            if let Some(label) = labels.get(detection.cluster_id) {
                counts.add(label, 1);
            }
        }
        counts
    }

    /// Add `n` facings to a label, appending the label if it is new.
    pub fn add(&mut self, label: &str, n: usize) {
        match self.entries.iter_mut().find(|(name, _)| name == label) {
            Some((_, count)) => *count += n,
            None => self.entries.push((label.to_string(), n)),
        }
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, count)| *count)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One row of the share chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareRow {
    pub label: String,
    pub count: usize,
    /// Share of all labeled facings, 0-100
    pub percent: f64,
    pub color: Option<Rgb>,
}

impl ShareRow {
    /// Bar length in cells for a chart whose full (100%) bar is `full_width` cells.
    pub fn bar_cells(&self, full_width: usize) -> usize {
        ((self.percent / 100.0) * full_width as f64).round() as usize
    }
}

/// Proportional breakdown of facings per label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShareChart {
    rows: Vec<ShareRow>,
    total: usize,
}

impl ShareChart {
    /// Build rows from counts; every percentage is 0 when the total is 0.
    pub fn new(counts: &FacingCounts) -> Self {
        let total = counts.total();
        let rows = counts
            .iter()
            .map(|(label, count)| ShareRow {
                label: label.to_string(),
                count,
                percent: if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64 * 100.0
                },
                color: None,
            })
            .collect();
        Self { rows, total }
    }

    /// Attach bar colors looked up by label.
    pub fn with_colors(mut self, color_of: impl Fn(&str) -> Option<Rgb>) -> Self {
        for row in &mut self.rows {
            row.color = color_of(&row.label);
        }
        self
    }

    pub fn rows(&self) -> &[ShareRow] {
        &self.rows
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as text, one `label  ████  66.7% (2)` line per row.
    pub fn render_text(&self, full_width: usize) -> String {
        let label_width = self
            .rows
            .iter()
            .map(|row| row.label.chars().count())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for row in &self.rows {
            let cells = row.bar_cells(full_width);
            let bar = format!("{}{}", "█".repeat(cells), "·".repeat(full_width.saturating_sub(cells)));
            out.push_str(&format!(
                "{:<label_width$}  {}  {:>5.1}% ({})\n",
                row.label, bar, row.percent, row.count
            ));
        }
        out
    }
}
