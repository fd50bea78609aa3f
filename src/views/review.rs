//! Step 2: review clusters and assign labels.

use std::fmt::Write;

use super::helpers::{box_colors, view_overlay};
use super::ViewContext;
use crate::color_utils::to_hex;
use crate::constants::{MAX_CLUSTER_COUNT, MIN_CLUSTER_COUNT};

pub fn view_review(ctx: &ViewContext<'_>) -> String {
    let state = ctx.state;
    let mut out = format!(
        "Clusters: {} ({}-{})",
        state.cluster_count(),
        MIN_CLUSTER_COUNT,
        MAX_CLUSTER_COUNT
    );
    if state.is_loading() {
        out.push_str("  clustering...");
    }
    if state.is_saving() {
        out.push_str("  saving...");
    }
    out.push('\n');

    let Some(shelf) = state.shelf() else {
        out.push_str("Waiting for the first clustering result.\n");
        return out;
    };

    let colors = box_colors(state, ctx.palette, ctx.fallback);
    let _ = writeln!(
        out,
        "Image {}x{}, {} detections in {} clusters",
        shelf.width,
        shelf.height,
        shelf.detections.len(),
        shelf.clusters.len()
    );
    for cluster in &shelf.clusters {
        let id = cluster.cluster_id;
        let color = colors.get(&id).copied().unwrap_or(ctx.fallback);
        let crop = match cluster.crop_dimensions() {
            Ok((w, h)) => format!("{w}x{h}"),
            Err(e) => {
                log::debug!("Crop of cluster {} unreadable: {}", id, e);
                "?".to_string()
            }
        };
        let _ = writeln!(
            out,
            "  cluster {:<3} {}  {:>3} facings  crop {:<9} {}",
            id,
            to_hex(color),
            shelf.facings(id),
            crop,
            state.labels().get(id).unwrap_or("(unlabeled)")
        );
    }
    out.push_str(&view_overlay(ctx.boxes, ctx.rendered));
    out.push_str("Type `label <id> <text>`, `clusters <n>` or `save`.\n");
    out
}
