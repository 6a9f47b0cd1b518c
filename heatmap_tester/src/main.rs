use anyhow::{Context, Result, bail};
use image::RgbImage;
use jet_heatmap::{
    CellInfo, CellReport, DisplaySink, HeatmapService, HeatmapSettings, OutputStatus, Session,
    SessionPhase,
};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{Layer as _, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Widest preview drawn in the terminal, in characters.
#[cfg_attr(feature = "opencv", allow(dead_code))]
const PREVIEW_COLUMNS: u32 = 48;

/// Draws each finished heatmap as truecolor blocks on stdout.
#[cfg_attr(feature = "opencv", allow(dead_code))]
struct TerminalPreview {
    columns: u32,
}

impl DisplaySink for TerminalPreview {
    fn show(&mut self, title: &str, image: &RgbImage) -> jet_heatmap::Result<()> {
        println!("--- {title} ({}x{}) ---", image.width(), image.height());
        for line in render_preview(image, self.columns) {
            println!("{line}");
        }
        Ok(())
    }
}

/// Downsamples `image` to at most `columns` characters per line. Terminal cells are
/// about twice as tall as they are wide, so every line covers two rows of samples.
#[cfg_attr(feature = "opencv", allow(dead_code))]
fn render_preview(image: &RgbImage, columns: u32) -> Vec<String> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || columns == 0 {
        return Vec::new();
    }

    let columns = columns.min(width);
    let scale = width as f64 / columns as f64;
    let lines = ((height as f64 / (scale * 2.0)).ceil() as u32).max(1);

    (0..lines)
        .map(|line| {
            let y = ((line as f64 * scale * 2.0) as u32).min(height - 1);
            let mut text = String::new();
            for column in 0..columns {
                let x = ((column as f64 * scale) as u32).min(width - 1);
                let [red, green, blue] = image.get_pixel(x, y).0;
                text.push_str(&format!("\x1b[38;2;{red};{green};{blue}m\u{2588}"));
            }
            text.push_str("\x1b[0m");
            text
        })
        .collect()
}

/// Parses `row,col,value` lines. Blank lines and lines starting with `#` are skipped.
fn parse_cells(text: &str) -> Result<Vec<CellInfo>> {
    let mut cells = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [row, col, value] = fields.as_slice() else {
            bail!("line {}: expected `row,col,value`, got `{line}`", index + 1);
        };

        cells.push(CellInfo::new(
            row.parse()
                .with_context(|| format!("line {}: invalid row `{row}`", index + 1))?,
            col.parse()
                .with_context(|| format!("line {}: invalid column `{col}`", index + 1))?,
            value
                .parse()
                .with_context(|| format!("line {}: invalid value `{value}`", index + 1))?,
        ));
    }

    Ok(cells)
}

fn setup_logging() -> Result<()> {
    let filters = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("info".parse()?)
        .from_env_lossy();
    let filter_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filters);
    tracing_subscriber::registry().with(filter_layer).init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("Usage: heatmap_tester <settings.json> <cells.csv> [output_path]");
        return Ok(());
    }

    let mut settings = HeatmapSettings::from_json_file(&args[1])
        .with_context(|| format!("reading settings from {}", args[1]))?;
    if let Some(output_path) = args.get(3) {
        settings.path = Some(PathBuf::from(output_path));
    }

    let text = std::fs::read_to_string(&args[2])
        .with_context(|| format!("reading cells from {}", args[2]))?;
    let cells = parse_cells(&text)?;
    tracing::info!(cells = cells.len(), "Initialising with settings: {settings:?}");

    // --- 2. Session Initialization ---
    // With OpenCV the heatmap opens in a window that stays up until a key is pressed.
    #[cfg(feature = "opencv")]
    let session = Session::with_display(jet_heatmap::HighGuiDisplay::new(0));
    #[cfg(not(feature = "opencv"))]
    let session = Session::with_display(TerminalPreview {
        columns: PREVIEW_COLUMNS,
    });
    let service = HeatmapService::spawn(session);

    // --- 3. Main Processing Loop ---
    for cell in cells {
        match service.handle_cell(cell, settings.clone()).await {
            Ok(report) => {
                println!(
                    "({:>4}, {:>4}) {:>12} -> 0x{:08X}",
                    cell.row,
                    cell.col,
                    cell.value,
                    report.color()
                );
                if let CellReport::Completed(completion) = report {
                    match completion.output {
                        OutputStatus::Written(path) => {
                            tracing::info!("heatmap written to {}", path.display())
                        }
                        OutputStatus::Failed(reason) => {
                            tracing::error!("heatmap could not be written: {reason}")
                        }
                        OutputStatus::NotRequested => {}
                    }
                }
            }
            Err(err) => tracing::warn!(row = cell.row, col = cell.col, "cell rejected: {err}"),
        }
    }

    // --- 4. Summary ---
    let status = service.status().await?;
    if status.phase != SessionPhase::Finalized {
        tracing::warn!(
            "heatmap incomplete: {} of {} cells received",
            status.received,
            status.expected
        );
    }
    service.shutdown().await;

    Ok(())
}
