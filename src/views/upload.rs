//! Step 1: choose the shelf image.

use crate::wizard::WizardState;

pub fn view_upload(state: &WizardState) -> String {
    match state.file() {
        Some(file) => format!(
            "Selected: {}\nType `next` to upload with {} clusters.\n",
            file.path.display(),
            state.cluster_count()
        ),
        None => "No image selected. Type `open <path>` or `open` to browse.\n".to_string(),
    }
}
