//! Step 3: share of facings and the final overlay.

use std::fmt::Write;

use super::helpers::view_overlay;
use super::ViewContext;
use crate::constants::SHARE_BAR_WIDTH;

pub fn view_results(ctx: &ViewContext<'_>) -> String {
    let state = ctx.state;
    let chart = state.share_chart(ctx.palette);

    let mut out = String::from("Share of facings\n");
    if chart.is_empty() {
        out.push_str("  No labeled facings.\n");
    } else {
        for line in chart.render_text(SHARE_BAR_WIDTH).lines() {
            let _ = writeln!(out, "  {line}");
        }
        let _ = writeln!(out, "  {} labeled facings", chart.total());
    }

    out.push_str(&view_overlay(ctx.boxes, ctx.rendered));
    out.push_str("Type `start-over`, `new-shelf` or `export <file.png>`.\n");
    out
}
