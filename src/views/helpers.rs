//! Helpers shared by the step views.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::color_utils::{Rgb, to_hex};
use crate::commands::HELP;
use crate::model::{ClusterId, LabelOptions, SavedLabel};
use crate::overlay::{ColorResolver, DisplaySize, OverlayBox};
use crate::wizard::{Notice, NoticeLevel, Step, WizardState};

/// Outline color of every cluster in the current image.
///
/// Labeled clusters share their label's color. Unlabeled clusters take the
/// palette by cluster id while reviewing and the fallback color on results.
pub fn box_colors(state: &WizardState, palette: &[Rgb], fallback: Rgb) -> BTreeMap<ClusterId, Rgb> {
    let Some(shelf) = state.shelf() else {
        return BTreeMap::new();
    };
    let labeled = state.colors(palette);
    let mut resolver = ColorResolver::new(&labeled).with_fallback(fallback);
    if state.step() == Step::Review {
        resolver = resolver.with_palette(palette);
    }
    shelf
        .cluster_ids()
        .map(|id| (id, resolver.resolve(id)))
        .collect()
}

pub fn view_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Info => format!("[info] {}", notice.text),
        NoticeLevel::Error => format!("[error] {}", notice.text),
    }
}

/// List overlay boxes in detection order.
pub fn view_overlay(boxes: &[OverlayBox], rendered: Option<DisplaySize>) -> String {
    let Some(rendered) = rendered else {
        return "Overlay: image not measured yet\n".to_string();
    };
    let mut out = format!(
        "Overlay at {:.0}x{:.0} ({} boxes)\n",
        rendered.width,
        rendered.height,
        boxes.len()
    );
    for b in boxes {
        let _ = writeln!(
            out,
            "  #{:<3} {:>7.1},{:>7.1}  {:>6.1}x{:<6.1} {}",
            b.cluster_id,
            b.left,
            b.top,
            b.width,
            b.height,
            to_hex(b.color)
        );
    }
    out
}

pub fn view_label_options(options: &LabelOptions) -> String {
    let mut out = String::from("Label options:\n");
    for (i, label) in options.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {}", i + 1, label);
    }
    out
}

/// Labels the backend has stored, as last fetched.
pub fn view_saved_labels(saved: &[SavedLabel]) -> String {
    let mut out = format!("Saved on server ({}):\n", saved.len());
    for record in saved {
        let _ = writeln!(
            out,
            "  {:<4} {:<24} {}",
            record.cluster_id, record.label, record.created_at
        );
    }
    out
}

pub fn view_help() -> String {
    let width = HELP.iter().map(|(usage, _)| usage.len()).max().unwrap_or(0);
    let mut out = String::from("Commands:\n");
    for (usage, summary) in HELP {
        let _ = writeln!(out, "  {usage:<width$}  {summary}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_prefix() {
        assert_eq!(view_notice(&Notice::error("Upload failed")), "[error] Upload failed");
        assert_eq!(view_notice(&Notice::info("Labels saved")), "[info] Labels saved");
    }

    #[test]
    fn test_unmeasured_overlay() {
        assert!(view_overlay(&[], None).contains("not measured"));
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = view_help();
        assert_eq!(help.lines().count(), HELP.len() + 1);
        assert!(help.contains("new-shelf"));
    }
}
