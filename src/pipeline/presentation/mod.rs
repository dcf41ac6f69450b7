mod chart;
mod format;
mod view;

pub use chart::{ChartEntry, DetectionEntry, chart_entries, detection_entries};
pub use format::display_percent;
pub use view::{ActiveTab, OverlayView};
