//! Global constants for the shelf labeler

/// Cluster count requested on the first upload of an image
pub const DEFAULT_CLUSTER_COUNT: u32 = 10;

/// Smallest cluster count the backend is asked for
pub const MIN_CLUSTER_COUNT: u32 = 2;

/// Largest cluster count the backend is asked for
pub const MAX_CLUSTER_COUNT: u32 = 20;

/// Default backend base URL
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Default network timeout for backend calls, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default maximum width the shelf image is rendered at
pub const DEFAULT_DISPLAY_WIDTH: u32 = 800;

/// Outline thickness of overlay boxes in display pixels
pub const OVERLAY_LINE_WIDTH: u32 = 2;

/// Width of a full (100%) share bar in terminal cells
pub const SHARE_BAR_WIDTH: usize = 40;

/// Labels every session starts with
pub const MASTER_LABELS: &[&str] = &["Coca-Cola Can", "Sprite Bottle", "Fanta Bottle"];
