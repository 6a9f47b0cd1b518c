// THEORY:
// This file is the main entry point for the `jet_heatmap` library crate. It turns a
// stream of scalar grid readings into jet colors and, once a whole grid has been
// seen, into a smoothed heatmap image.
//
// The public surface has three layers:
// 1.  **Colormap**: `convert` and `convert_single` are pure functions from a value and
//     a range to a color. They need no session.
// 2.  **Session**: `Session` accumulates cells onto a canvas, finalizes exactly once
//     and emits the heatmap to a display and a file. `SessionRegistry` and
//     `HeatmapService` share sessions between threads and tasks.
// 3.  **C ABI**: `ffi` exposes both layers to spreadsheet hosts when the crate is
//     built as a `cdylib`.
//
// The geometry, smoothing and image plumbing live in `core_modules`. The `opencv`
// feature hands blurring and display to OpenCV.

pub mod core_modules;
pub mod error;
pub mod ffi;
pub mod registry;
pub mod service;
pub mod session;

pub use core_modules::color::color::{Color, PackedColor, ValueRange, convert, convert_single};
pub use core_modules::grid_layout::{GridLayout, GridOrigin};
pub use core_modules::sinks::{DisplaySink, NullDisplay, OUTPUT_WINDOW_TITLE, TracingDisplay};
#[cfg(feature = "opencv")]
pub use core_modules::sinks::HighGuiDisplay;
pub use error::{HeatmapError, Result};
pub use registry::{SessionHandle, SessionRegistry};
pub use service::{HeatmapService, SessionStatus};
pub use session::{
    CellInfo, CellReport, Completion, HeatmapSettings, OutputStatus, Session, SessionPhase,
};
