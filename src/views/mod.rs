//! Text views for the labeler.
//!
//! Each wizard step has its own view:
//! - upload: file selection
//! - review: clusters, labels and the scaled overlay
//! - results: share of facings and the final overlay
//! - helpers: notice line, overlay listing and color helpers

mod helpers;
mod results;
mod review;
mod upload;

pub use helpers::{
    box_colors, view_help, view_label_options, view_notice, view_overlay, view_saved_labels,
};
pub use results::view_results;
pub use review::view_review;
pub use upload::view_upload;

use crate::color_utils::Rgb;
use crate::overlay::{DisplaySize, OverlayBox};
use crate::wizard::{Step, WizardState};

/// Everything a view needs to draw the current step.
pub struct ViewContext<'a> {
    pub state: &'a WizardState,
    /// Overlay boxes laid out for the current rendered size
    pub boxes: &'a [OverlayBox],
    pub rendered: Option<DisplaySize>,
    pub palette: &'a [Rgb],
    pub fallback: Rgb,
}

/// Draw the current step, header and notice included.
pub fn view(ctx: &ViewContext<'_>) -> String {
    let step = ctx.state.step();
    let mut out = format!("== Step {} of 3: {} ==\n", step.number(), step.name());
    if let Some(notice) = ctx.state.notice() {
        out.push_str(&view_notice(notice));
        out.push('\n');
    }
    let body = match step {
        Step::Upload => view_upload(ctx.state),
        Step::Review => view_review(ctx),
        Step::Results => view_results(ctx),
    };
    out.push_str(&body);
    if let Some(saved) = ctx.state.saved_labels() {
        out.push_str(&view_saved_labels(saved));
    }
    out
}
