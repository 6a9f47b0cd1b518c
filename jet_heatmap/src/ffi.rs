// THEORY:
// The `ffi` module is the C ABI that spreadsheet hosts call into when the crate is
// built as a `cdylib`. It is a translation layer only: raw `#[repr(C)]` structs in,
// safe `Session` calls in the middle, a packed color out.
//
// Two families of entry points exist:
// 1.  **Legacy**: `InterpolateSingleValue` and `Interpolate` keep the historical
//     names and signatures. `Interpolate` drives one process-wide default session,
//     guarded by a mutex; `ResetInterpolation` starts it over.
// 2.  **Handle-based**: `HeatmapSessionCreate` issues an independent session from a
//     process-wide registry; the other `HeatmapSession*` calls address it by handle.
//
// Nothing fails across the boundary. Every interpolation call returns the cell's
// color, even when the cell is rejected; the rejection is logged with `tracing`.
// A null cell or settings pointer returns 0 (black). Oversized canvases are refused
// as invalid settings, and a panic while processing a cell resets that session.

use crate::core_modules::color::color::{PackedColor, convert_single};
use crate::core_modules::sinks::DisplaySink;
use crate::core_modules::utils::path_encoding::{wide_to_narrow_lossy, wide_to_path};
use crate::error::{HeatmapError, Result};
use crate::registry::{SessionHandle, SessionRegistry};
use crate::session::{CellInfo, HeatmapSettings, Session};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing::{error, warn};

/// Longest UTF-16 path read from the caller, in code units.
const MAX_WIDE_PATH: usize = 32_767;

static DEFAULT_SESSION: OnceLock<Mutex<Session>> = OnceLock::new();
static REGISTRY: OnceLock<SessionRegistry> = OnceLock::new();

#[cfg(feature = "opencv")]
fn host_display() -> impl DisplaySink + 'static {
    // The host owns the message loop; just let the window repaint.
    crate::core_modules::sinks::HighGuiDisplay::new(1)
}

#[cfg(not(feature = "opencv"))]
fn host_display() -> impl DisplaySink + 'static {
    crate::core_modules::sinks::TracingDisplay
}

fn default_session() -> &'static Mutex<Session> {
    DEFAULT_SESSION.get_or_init(|| Mutex::new(Session::with_display(host_display())))
}

fn registry() -> &'static SessionRegistry {
    REGISTRY.get_or_init(SessionRegistry::new)
}

/// C layout of one cell reading.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawCellInfo {
    pub row: i32,
    pub col: i32,
    pub value: f32,
}

/// C layout of the settings sent with every cell.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawSettings {
    pub width: i32,
    pub height: i32,
    pub columns_count: i32,
    pub rows_count: i32,
    pub min_value: f32,
    pub max_value: f32,
    pub kernel_x: i32,
    pub kernel_y: i32,
    pub sigma_x: f64,
    pub sigma_y: f64,
    /// Nul-terminated UTF-16 output path, or null for no file.
    pub path: *const u16,
    /// Non-zero selects the lossy single-byte path transliteration.
    pub legacy_path_encoding: i32,
}

impl RawSettings {
    /// Converts to owned settings, decoding the output path.
    ///
    /// # Safety
    /// `self.path` must be null or point to a nul-terminated UTF-16 string.
    pub unsafe fn to_settings(&self) -> Result<HeatmapSettings> {
        let non_negative = |name: &str, value: i32| -> Result<u32> {
            u32::try_from(value).map_err(|_| {
                HeatmapError::InvalidSettings(format!("{name} must not be negative, got {value}"))
            })
        };

        let units = unsafe { read_wide(self.path) };
        let path = if units.is_empty() {
            None
        } else if self.legacy_path_encoding != 0 {
            Some(PathBuf::from(wide_to_narrow_lossy(&units)))
        } else {
            Some(wide_to_path(&units))
        };

        Ok(HeatmapSettings {
            width: non_negative("width", self.width)?,
            height: non_negative("height", self.height)?,
            columns_count: non_negative("columns_count", self.columns_count)?,
            rows_count: non_negative("rows_count", self.rows_count)?,
            min_value: self.min_value,
            max_value: self.max_value,
            kernel_x: non_negative("kernel_x", self.kernel_x)?,
            kernel_y: non_negative("kernel_y", self.kernel_y)?,
            sigma_x: self.sigma_x,
            sigma_y: self.sigma_y,
            path,
            origin: None,
        })
    }
}

/// Reads a nul-terminated UTF-16 string, capped at `MAX_WIDE_PATH` units.
///
/// # Safety
/// `ptr` must be null or point to a nul-terminated UTF-16 string.
unsafe fn read_wide(ptr: *const u16) -> Vec<u16> {
    let mut units = Vec::new();
    if ptr.is_null() {
        return units;
    }
    while units.len() < MAX_WIDE_PATH {
        let unit = unsafe { *ptr.add(units.len()) };
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    units
}

/// Color of the cell on the call's own range, for calls that never reach a session.
///
/// # Safety
/// Pointers must be null or valid for reads.
unsafe fn fallback_color(cell: *const RawCellInfo, settings: *const RawSettings) -> PackedColor {
    match unsafe { (cell.as_ref(), settings.as_ref()) } {
        (Some(cell), Some(settings)) => {
            convert_single(cell.value, settings.min_value, settings.max_value)
        }
        _ => 0,
    }
}

/// Feeds one raw cell to `session`, absorbing every error into a log line.
///
/// # Safety
/// Pointers must be null or valid for reads; `settings.path` as in
/// [`RawSettings::to_settings`].
unsafe fn interpolate_with(
    session: &mut Session,
    cell: *const RawCellInfo,
    settings: *const RawSettings,
) -> PackedColor {
    let (Some(raw_cell), Some(raw_settings)) = (unsafe { cell.as_ref() }, unsafe { settings.as_ref() })
    else {
        warn!("interpolation called with a null cell or settings pointer");
        return 0;
    };

    let cell = CellInfo::new(raw_cell.row, raw_cell.col, raw_cell.value);
    let settings = match unsafe { raw_settings.to_settings() } {
        Ok(settings) => settings,
        Err(err) => {
            warn!(row = cell.row, col = cell.col, "invalid settings: {err}");
            return convert_single(cell.value, raw_settings.min_value, raw_settings.max_value);
        }
    };

    // An unwinding panic must not reach the host.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| session.handle_cell(cell, &settings)));
    match outcome {
        Ok(Ok(report)) => report.color(),
        Ok(Err(err)) => {
            warn!(row = cell.row, col = cell.col, "cell rejected: {err}");
            session.color_for(cell.value, &settings)
        }
        Err(_) => {
            error!(row = cell.row, col = cell.col, "cell processing panicked, session reset");
            session.reset();
            convert_single(cell.value, settings.min_value, settings.max_value)
        }
    }
}

/// Stateless jet lookup for a single value.
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub extern "system" fn InterpolateSingleValue(value: f32, min: f32, max: f32) -> u32 {
    convert_single(value, min, max)
}

/// Colors one cell and accumulates it into the process-wide default session.
///
/// # Safety
/// `cell` and `settings` must be null or point to valid structs, and
/// `settings.path` must be null or a nul-terminated UTF-16 string.
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub unsafe extern "system" fn Interpolate(
    cell: *const RawCellInfo,
    settings: *const RawSettings,
) -> u32 {
    let mut session = default_session()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    unsafe { interpolate_with(&mut session, cell, settings) }
}

/// Returns the default session to its empty state.
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub extern "system" fn ResetInterpolation() {
    default_session()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .reset();
}

/// Creates an independent session and returns its handle (never 0).
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub extern "system" fn HeatmapSessionCreate() -> u64 {
    registry().create_with_display(host_display()).raw()
}

/// Colors one cell and accumulates it into the session `handle`.
///
/// # Safety
/// Same requirements as [`Interpolate`].
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub unsafe extern "system" fn HeatmapSessionInterpolate(
    handle: u64,
    cell: *const RawCellInfo,
    settings: *const RawSettings,
) -> u32 {
    let result = registry().with_session(SessionHandle::from_raw(handle), |session| unsafe {
        interpolate_with(session, cell, settings)
    });

    match result {
        Ok(color) => color,
        Err(err) => {
            warn!(handle, "{err}");
            unsafe { fallback_color(cell, settings) }
        }
    }
}

/// Returns the session to its empty state. False for an unknown handle.
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub extern "system" fn HeatmapSessionReset(handle: u64) -> bool {
    registry().reset(SessionHandle::from_raw(handle)).is_ok()
}

/// Releases the session. False for an unknown handle.
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub extern "system" fn HeatmapSessionDestroy(handle: u64) -> bool {
    registry().remove(SessionHandle::from_raw(handle)).is_ok()
}
