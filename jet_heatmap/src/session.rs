// THEORY:
// The `session` module is the top-level API for heatmap accumulation. A `Session`
// receives a stream of per-cell readings, one call at a time, in whatever order the
// host happens to evaluate its cells, and assembles them into a finished heatmap.
//
// Lifecycle (an explicit tagged state, never inferred from sentinel values):
// 1.  **Empty**: nothing allocated. The first cell validates the settings, allocates
//     a black `width × height` canvas and fixes the layout (steps, extents) and the
//     value range for the rest of the session.
// 2.  **Accumulating**: each cell is colored on the jet palette, positioned relative
//     to the origin (the first cell seen, unless the settings pin one) and painted
//     as a solid rectangle. Received cells are tracked individually, so duplicates
//     and cells outside the grid are rejected instead of silently repainting.
// 3.  **Finalized**: once every distinct cell of the `columns × rows` grid has
//     arrived, the canvas is blurred into a new image, shown on the display sink and
//     written to the output path if one was given. Further cells are rejected until
//     `reset` returns the session to Empty.
//
// Completion is count-based. The geometrically last cell arriving early does not
// finish the heatmap; the last *missing* cell does.
//
// Smoothing parameters and the output path are read from the settings that
// accompany the completing cell, while the layout and range come from the first.

use crate::core_modules::canvas::canvas::Canvas;
use crate::core_modules::color::color::{self, Color, PackedColor, Scalar, ValueRange};
use crate::core_modules::grid_layout::{GridLayout, GridOrigin};
use crate::core_modules::sinks::{DisplaySink, NullDisplay, OUTPUT_WINDOW_TITLE};
use crate::core_modules::smoothing::{BlurParams, GaussianBlur};
use crate::core_modules::utils::image_helper::image_helper;
use crate::error::{HeatmapError, Result};
use image::RgbImage;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One reading from the caller, addressed by absolute row and column.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CellInfo {
    pub row: i32,
    pub col: i32,
    pub value: Scalar,
}

impl CellInfo {
    pub fn new(row: i32, col: i32, value: Scalar) -> Self {
        Self { row, col, value }
    }
}

/// Configuration sent along with every cell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeatmapSettings {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Number of grid columns the canvas is divided into.
    pub columns_count: u32,
    /// Number of grid rows the canvas is divided into.
    pub rows_count: u32,
    /// Value mapped to the blue end of the palette.
    pub min_value: Scalar,
    /// Value mapped to the red end of the palette.
    pub max_value: Scalar,
    /// Horizontal smoothing kernel size (odd, or 0 to derive from `sigma_x`).
    pub kernel_x: u32,
    /// Vertical smoothing kernel size (odd, or 0 to derive from `sigma_y`).
    pub kernel_y: u32,
    /// Horizontal Gaussian sigma (<= 0 derives it from `kernel_x`).
    pub sigma_x: f64,
    /// Vertical Gaussian sigma (<= 0 reuses `sigma_x`).
    pub sigma_y: f64,
    /// Where to write the finished heatmap. The extension picks the format.
    pub path: Option<PathBuf>,
    /// Absolute cell painted at the top-left corner. Defaults to the first cell
    /// received.
    pub origin: Option<GridOrigin>,
}

impl Default for HeatmapSettings {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
            columns_count: 10,
            rows_count: 10,
            min_value: 0.0,
            max_value: 1.0,
            kernel_x: 31,
            kernel_y: 31,
            sigma_x: 0.0,
            sigma_y: 0.0,
            path: None,
            origin: None,
        }
    }
}

impl HeatmapSettings {
    /// Parses settings from JSON. Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn blur_params(&self) -> BlurParams {
        BlurParams {
            kernel_x: self.kernel_x,
            kernel_y: self.kernel_y,
            sigma_x: self.sigma_x,
            sigma_y: self.sigma_y,
        }
    }

    pub fn layout(&self) -> Result<GridLayout> {
        GridLayout::new(self.width, self.height, self.columns_count, self.rows_count)
    }

    pub fn value_range(&self) -> Result<ValueRange> {
        ValueRange::new(self.min_value, self.max_value)
    }
}

/// What happened to the output file of a finished heatmap.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputStatus {
    NotRequested,
    Written(PathBuf),
    Failed(String),
}

/// The data package produced by the cell that completes a session.
#[derive(Debug, Clone)]
pub struct Completion {
    pub color: PackedColor,
    /// Shared with the finalized session; not a second copy.
    pub heatmap: Arc<RgbImage>,
    pub output: OutputStatus,
}

/// The outcome of a single accepted cell.
#[derive(Debug, Clone)]
pub enum CellReport {
    Painted { color: PackedColor },
    Completed(Completion),
}

impl CellReport {
    /// The packed color of the cell, whichever variant this is.
    pub fn color(&self) -> PackedColor {
        match self {
            CellReport::Painted { color } => *color,
            CellReport::Completed(completion) => completion.color,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, CellReport::Completed(_))
    }
}

/// Public view of the session's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    Accumulating,
    Finalized,
}

/// Everything fixed by the first cell, plus what has been painted since.
struct Accumulation {
    layout: GridLayout,
    range: ValueRange,
    canvas: Canvas,
    origin: Option<GridOrigin>,
    received: Vec<bool>,
    received_count: usize,
}

impl Accumulation {
    fn allocate(settings: &HeatmapSettings) -> Result<Self> {
        let layout = settings.layout()?;
        let range = settings.value_range()?;

        debug!(
            width = layout.width,
            height = layout.height,
            columns = layout.columns,
            rows = layout.rows,
            w_step = layout.w_step,
            h_step = layout.h_step,
            min = range.min(),
            max = range.max(),
            "allocating heatmap canvas"
        );

        Ok(Self {
            canvas: Canvas::new(layout.width, layout.height, Color::BLACK),
            received: vec![false; layout.cell_count()],
            received_count: 0,
            origin: settings.origin,
            layout,
            range,
        })
    }

    fn paint(&mut self, cell: CellInfo) -> Result<Color> {
        let color = self.range.convert(cell.value);
        let origin = *self.origin.get_or_insert(GridOrigin {
            row: cell.row,
            col: cell.col,
        });

        let relative = self.layout.relative(origin, cell.row, cell.col)?;
        let index = self.layout.index(relative);
        if self.received[index] {
            return Err(HeatmapError::DuplicateCell {
                row: cell.row,
                col: cell.col,
            });
        }

        let rect = self.layout.cell_rect(relative);
        let painted = self.canvas.fill_rect(rect, color);
        self.received[index] = true;
        self.received_count += 1;

        debug!(
            row = cell.row,
            col = cell.col,
            value = cell.value,
            x = rect.x,
            y = rect.y,
            painted,
            received = self.received_count,
            expected = self.received.len(),
            "cell painted"
        );

        Ok(color)
    }

    fn is_complete(&self) -> bool {
        self.received_count == self.received.len()
    }
}

enum SessionState {
    Empty,
    Accumulating(Accumulation),
    Finalized {
        layout: GridLayout,
        range: ValueRange,
        origin: Option<GridOrigin>,
        heatmap: Arc<RgbImage>,
    },
}

/// One heatmap accumulation, owned by the caller.
pub struct Session {
    state: SessionState,
    display: Box<dyn DisplaySink>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A headless session: finished heatmaps are not displayed.
    pub fn new() -> Self {
        Self::with_display(NullDisplay)
    }

    pub fn with_display(display: impl DisplaySink + 'static) -> Self {
        Self {
            state: SessionState::Empty,
            display: Box::new(display),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            SessionState::Empty => SessionPhase::Empty,
            SessionState::Accumulating(_) => SessionPhase::Accumulating,
            SessionState::Finalized { .. } => SessionPhase::Finalized,
        }
    }

    /// `(received, expected)` distinct cells; `(0, 0)` before the first cell.
    pub fn progress(&self) -> (usize, usize) {
        match &self.state {
            SessionState::Empty => (0, 0),
            SessionState::Accumulating(acc) => (acc.received_count, acc.received.len()),
            SessionState::Finalized { layout, .. } => (layout.cell_count(), layout.cell_count()),
        }
    }

    pub fn layout(&self) -> Option<GridLayout> {
        match &self.state {
            SessionState::Empty => None,
            SessionState::Accumulating(acc) => Some(acc.layout),
            SessionState::Finalized { layout, .. } => Some(*layout),
        }
    }

    pub fn origin(&self) -> Option<GridOrigin> {
        match &self.state {
            SessionState::Empty => None,
            SessionState::Accumulating(acc) => acc.origin,
            SessionState::Finalized { origin, .. } => *origin,
        }
    }

    /// The unsmoothed canvas while cells are still arriving.
    pub fn preview(&self) -> Option<&RgbImage> {
        match &self.state {
            SessionState::Accumulating(acc) => Some(acc.canvas.as_image()),
            _ => None,
        }
    }

    /// The smoothed heatmap once the session is finalized.
    pub fn heatmap(&self) -> Option<&RgbImage> {
        self.shared_heatmap().map(|heatmap| heatmap.as_ref())
    }

    /// The same image as [`Session::heatmap`], shared rather than borrowed.
    pub fn shared_heatmap(&self) -> Option<&Arc<RgbImage>> {
        match &self.state {
            SessionState::Finalized { heatmap, .. } => Some(heatmap),
            _ => None,
        }
    }

    /// Drops everything and returns to Empty. The next cell starts a new session.
    pub fn reset(&mut self) {
        if !matches!(self.state, SessionState::Empty) {
            debug!("session reset");
        }
        self.state = SessionState::Empty;
    }

    /// Packed color for `value` on the session's range, or on the settings'
    /// range before the first cell fixed one. Never fails.
    pub fn color_for(&self, value: Scalar, settings: &HeatmapSettings) -> PackedColor {
        let (min, max) = match &self.state {
            SessionState::Empty => (settings.min_value, settings.max_value),
            SessionState::Accumulating(acc) => (acc.range.min(), acc.range.max()),
            SessionState::Finalized { range, .. } => (range.min(), range.max()),
        };
        color::convert_single(value, min, max)
    }

    /// Colors, positions and paints one cell; finalizes the heatmap when it was
    /// the last missing one. Rejected cells leave the session untouched.
    pub fn handle_cell(&mut self, cell: CellInfo, settings: &HeatmapSettings) -> Result<CellReport> {
        if matches!(self.state, SessionState::Finalized { .. }) {
            return Err(HeatmapError::AlreadyFinalized);
        }

        let blur = settings.blur_params().resolve()?;

        let color = match &mut self.state {
            SessionState::Empty => {
                // Committed only once the first cell has been accepted.
                let mut accumulation = Accumulation::allocate(settings)?;
                let color = accumulation.paint(cell)?;
                self.state = SessionState::Accumulating(accumulation);
                color
            }
            SessionState::Accumulating(accumulation) => accumulation.paint(cell)?,
            SessionState::Finalized { .. } => return Err(HeatmapError::AlreadyFinalized),
        }
        .encode();

        let SessionState::Accumulating(accumulation) = &self.state else {
            return Err(HeatmapError::AlreadyFinalized);
        };
        if !accumulation.is_complete() {
            return Ok(CellReport::Painted { color });
        }

        let heatmap = Arc::new(blur.apply(accumulation.canvas.as_image()));
        let (layout, range, origin) = (accumulation.layout, accumulation.range, accumulation.origin);
        self.state = SessionState::Finalized {
            layout,
            range,
            origin,
            heatmap: Arc::clone(&heatmap),
        };

        let output = self.emit(&heatmap, &blur, settings.path.as_deref());
        Ok(CellReport::Completed(Completion {
            color,
            heatmap,
            output,
        }))
    }

    fn emit(&mut self, heatmap: &RgbImage, blur: &GaussianBlur, path: Option<&Path>) -> OutputStatus {
        info!(
            width = heatmap.width(),
            height = heatmap.height(),
            kernel_width = blur.kernel_width(),
            kernel_height = blur.kernel_height(),
            "heatmap finalized"
        );

        if let Err(err) = self.display.show(OUTPUT_WINDOW_TITLE, heatmap) {
            warn!("failed to display heatmap: {err}");
        }

        let Some(path) = path else {
            return OutputStatus::NotRequested;
        };

        match image_helper::save(path, heatmap) {
            Ok(()) => {
                info!(path = %path.display(), "heatmap written");
                OutputStatus::Written(path.to_path_buf())
            }
            Err(err) => {
                warn!(path = %path.display(), "failed to write heatmap: {err}");
                OutputStatus::Failed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts how many heatmaps were shown.
    #[derive(Clone, Default)]
    struct CountingDisplay {
        shown: Arc<AtomicUsize>,
    }

    impl DisplaySink for CountingDisplay {
        fn show(&mut self, title: &str, _image: &RgbImage) -> Result<()> {
            assert_eq!(title, OUTPUT_WINDOW_TITLE);
            self.shown.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn settings_2x2() -> HeatmapSettings {
        HeatmapSettings {
            width: 100,
            height: 100,
            columns_count: 2,
            rows_count: 2,
            min_value: 0.0,
            max_value: 3.0,
            kernel_x: 3,
            kernel_y: 3,
            sigma_x: 0.0,
            sigma_y: 0.0,
            path: None,
            origin: None,
        }
    }

    fn counting_session() -> (Session, Arc<AtomicUsize>) {
        let display = CountingDisplay::default();
        let shown = display.shown.clone();
        (Session::with_display(display), shown)
    }

    #[test]
    fn finalizes_once_after_the_last_cell() {
        let (mut session, shown) = counting_session();
        let settings = settings_2x2();
        let cells = [(0, 0, 0.0), (0, 1, 1.0), (1, 0, 2.0), (1, 1, 3.0)];

        for (i, (row, col, value)) in cells.into_iter().enumerate() {
            let report = session
                .handle_cell(CellInfo::new(row, col, value), &settings)
                .unwrap();
            assert_eq!(report.color(), color::convert_single(value, 0.0, 3.0));
            assert_eq!(report.is_completed(), i == 3, "cell {i}");
            assert_eq!(shown.load(Ordering::SeqCst), usize::from(i == 3));
        }

        assert_eq!(session.phase(), SessionPhase::Finalized);
        assert_eq!(session.progress(), (4, 4));
        assert!(session.heatmap().is_some());
        assert!(session.preview().is_none());
    }

    #[test]
    fn geometrically_last_cell_arriving_early_does_not_finalize() {
        let (mut session, shown) = counting_session();
        let settings = settings_2x2();

        for (row, col) in [(0, 0), (0, 1), (1, 1)] {
            let report = session.handle_cell(CellInfo::new(row, col, 1.0), &settings).unwrap();
            assert!(!report.is_completed());
        }
        assert_eq!(shown.load(Ordering::SeqCst), 0);
        assert_eq!(session.progress(), (3, 4));

        let report = session.handle_cell(CellInfo::new(1, 0, 1.0), &settings).unwrap();
        assert!(report.is_completed());
        assert_eq!(shown.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rectangles_are_placed_relative_to_the_first_cell() {
        let mut session = Session::new();
        let settings = settings_2x2();

        session.handle_cell(CellInfo::new(5, 5, 0.0), &settings).unwrap();
        session.handle_cell(CellInfo::new(5, 6, 3.0), &settings).unwrap();
        assert_eq!(session.origin(), Some(GridOrigin { row: 5, col: 5 }));

        let blue = color::convert(0.0, 0.0, 3.0).to_bytes();
        let red = color::convert(3.0, 0.0, 3.0).to_bytes();
        let preview = session.preview().unwrap();
        assert_eq!(preview.get_pixel(10, 10).0, blue);
        assert_eq!(preview.get_pixel(49, 49).0, blue);
        assert_eq!(preview.get_pixel(50, 0).0, red);
        assert_eq!(preview.get_pixel(99, 49).0, red);
        assert_eq!(preview.get_pixel(25, 75).0, [0, 0, 0]);

        session.handle_cell(CellInfo::new(6, 5, 3.0), &settings).unwrap();
        let preview = session.preview().unwrap();
        assert_eq!(preview.get_pixel(0, 50).0, red);
        assert_eq!(preview.get_pixel(49, 99).0, red);
        assert_eq!(preview.get_pixel(75, 75).0, [0, 0, 0]);
    }

    #[test]
    fn explicit_origin_overrides_first_cell() {
        let mut session = Session::new();
        let settings = HeatmapSettings {
            origin: Some(GridOrigin { row: 0, col: 0 }),
            ..settings_2x2()
        };

        session.handle_cell(CellInfo::new(1, 1, 3.0), &settings).unwrap();

        let preview = session.preview().unwrap();
        assert_eq!(preview.get_pixel(75, 75).0, color::convert(3.0, 0.0, 3.0).to_bytes());
        assert_eq!(preview.get_pixel(25, 25).0, [0, 0, 0]);
    }

    #[test]
    fn duplicates_and_strays_are_rejected_without_painting() {
        let mut session = Session::new();
        let settings = settings_2x2();

        session.handle_cell(CellInfo::new(0, 0, 0.0), &settings).unwrap();
        assert!(matches!(
            session.handle_cell(CellInfo::new(0, 0, 3.0), &settings),
            Err(HeatmapError::DuplicateCell { row: 0, col: 0 })
        ));
        for (row, col) in [(-1, 0), (0, 2), (2, 0)] {
            assert!(matches!(
                session.handle_cell(CellInfo::new(row, col, 3.0), &settings),
                Err(HeatmapError::CellOutOfBounds { .. })
            ));
        }

        assert_eq!(session.progress(), (1, 4));
        let blue = color::convert(0.0, 0.0, 3.0).to_bytes();
        assert_eq!(session.preview().unwrap().get_pixel(0, 0).0, blue);
    }

    #[test]
    fn finalized_sessions_reject_cells_until_reset() {
        let mut session = Session::new();
        let settings = HeatmapSettings {
            columns_count: 1,
            rows_count: 1,
            ..settings_2x2()
        };

        assert!(session.handle_cell(CellInfo::new(3, 3, 1.0), &settings).unwrap().is_completed());
        assert!(matches!(
            session.handle_cell(CellInfo::new(3, 3, 1.0), &settings),
            Err(HeatmapError::AlreadyFinalized)
        ));

        session.reset();
        assert_eq!(session.phase(), SessionPhase::Empty);
        assert_eq!(session.progress(), (0, 0));
        assert!(session.handle_cell(CellInfo::new(9, 9, 2.0), &settings).unwrap().is_completed());
        assert_eq!(session.origin(), Some(GridOrigin { row: 9, col: 9 }));
    }

    #[test]
    fn invalid_first_cell_leaves_session_empty() {
        let mut session = Session::new();
        let settings = HeatmapSettings {
            min_value: 2.0,
            max_value: 2.0,
            ..settings_2x2()
        };
        assert!(matches!(
            session.handle_cell(CellInfo::new(0, 0, 2.0), &settings),
            Err(HeatmapError::InvalidRange { .. })
        ));

        let settings = HeatmapSettings {
            kernel_x: 4,
            ..settings_2x2()
        };
        assert!(matches!(
            session.handle_cell(CellInfo::new(0, 0, 2.0), &settings),
            Err(HeatmapError::InvalidKernel { .. })
        ));

        let settings = HeatmapSettings {
            columns_count: 0,
            ..settings_2x2()
        };
        assert!(matches!(
            session.handle_cell(CellInfo::new(0, 0, 2.0), &settings),
            Err(HeatmapError::InvalidSettings(_))
        ));
        assert_eq!(session.phase(), SessionPhase::Empty);
    }

    #[test]
    fn rejected_first_cell_does_not_fix_the_layout() {
        let mut session = Session::new();
        let pinned = HeatmapSettings {
            origin: Some(GridOrigin { row: 0, col: 0 }),
            ..settings_2x2()
        };
        assert!(matches!(
            session.handle_cell(CellInfo::new(5, 5, 1.0), &pinned),
            Err(HeatmapError::CellOutOfBounds { row: 5, col: 5, .. })
        ));
        assert_eq!(session.phase(), SessionPhase::Empty);
        assert_eq!(session.layout(), None);
        assert_eq!(session.origin(), None);

        // The next accepted cell starts the session with its own settings.
        let single = HeatmapSettings {
            width: 30,
            columns_count: 1,
            rows_count: 1,
            ..settings_2x2()
        };
        let report = session.handle_cell(CellInfo::new(5, 5, 1.0), &single).unwrap();
        assert!(report.is_completed());
        assert_eq!(session.layout().unwrap().width, 30);
        assert_eq!(session.origin(), Some(GridOrigin { row: 5, col: 5 }));
    }

    #[test]
    fn completion_shares_the_retained_heatmap() {
        let mut session = Session::new();
        let single = HeatmapSettings {
            columns_count: 1,
            rows_count: 1,
            ..settings_2x2()
        };
        let CellReport::Completed(completion) =
            session.handle_cell(CellInfo::new(0, 0, 1.0), &single).unwrap()
        else {
            panic!("a 1x1 grid completes on its first cell");
        };
        assert!(Arc::ptr_eq(&completion.heatmap, session.shared_heatmap().unwrap()));
    }

    #[test]
    fn layout_and_range_are_fixed_by_the_first_cell() {
        let mut session = Session::new();
        let first = settings_2x2();
        let drifted = HeatmapSettings {
            width: 40,
            max_value: 100.0,
            ..settings_2x2()
        };

        session.handle_cell(CellInfo::new(0, 0, 1.0), &first).unwrap();
        let report = session.handle_cell(CellInfo::new(0, 1, 3.0), &drifted).unwrap();

        assert_eq!(report.color(), color::convert_single(3.0, 0.0, 3.0));
        assert_eq!(session.preview().unwrap().width(), 100);
        assert_eq!(session.color_for(3.0, &drifted), color::convert_single(3.0, 0.0, 3.0));
    }

    #[test]
    fn output_file_is_written_on_completion() {
        let path = std::env::temp_dir().join(format!("jet_heatmap_{}_session.png", std::process::id()));
        let mut session = Session::new();
        let settings = HeatmapSettings {
            columns_count: 1,
            rows_count: 1,
            path: Some(path.clone()),
            ..settings_2x2()
        };

        let CellReport::Completed(completion) =
            session.handle_cell(CellInfo::new(0, 0, 1.5), &settings).unwrap()
        else {
            panic!("single-cell session should complete");
        };
        assert_eq!(completion.output, OutputStatus::Written(path.clone()));

        // A single cell is a uniform canvas, which the blur leaves unchanged.
        let saved = image::open(&path).unwrap().to_rgb8();
        let green = color::convert(1.5, 0.0, 3.0).to_bytes();
        assert!(saved.pixels().all(|p| p.0 == green));
        assert_eq!(&saved, session.heatmap().unwrap());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn unwritable_output_still_completes() {
        let path = std::env::temp_dir()
            .join(format!("jet_heatmap_{}_missing_dir", std::process::id()))
            .join("heatmap.png");
        let mut session = Session::new();
        let settings = HeatmapSettings {
            columns_count: 1,
            rows_count: 1,
            path: Some(path),
            ..settings_2x2()
        };

        let report = session.handle_cell(CellInfo::new(0, 0, 1.5), &settings).unwrap();
        let CellReport::Completed(completion) = report else {
            panic!("single-cell session should complete");
        };
        assert!(matches!(completion.output, OutputStatus::Failed(_)));
        assert_eq!(session.phase(), SessionPhase::Finalized);
    }

    #[test]
    fn settings_load_from_json_with_defaults() {
        let settings = HeatmapSettings::from_json_str(
            r#"{ "width": 200, "columns_count": 4, "min_value": -1.0, "path": "out.png",
                 "origin": { "row": 2, "col": 3 } }"#,
        )
        .unwrap();

        assert_eq!(settings.width, 200);
        assert_eq!(settings.height, 500);
        assert_eq!(settings.columns_count, 4);
        assert_eq!(settings.min_value, -1.0);
        assert_eq!(settings.path, Some(PathBuf::from("out.png")));
        assert_eq!(settings.origin, Some(GridOrigin { row: 2, col: 3 }));
        assert!(matches!(
            HeatmapSettings::from_json_str("{ \"width\": \"wide\" }"),
            Err(HeatmapError::Settings(_))
        ));
    }
}
