//! Multi-page trajectory report: one cover page, then per trial a plot
//! page and a sampled coordinate table page, written as SVG documents
//! into a directory named after the (sanitized) requested name.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use aimex_core::{geometry, Point, TrialRecord};
use aimex_session::SessionConfig;
use log::info;
use plotters::prelude::*;
use thiserror::Error;

use crate::naming::sanitize_report_name;
use crate::sample::sample_by_interval;

/// Tick spacing of the per-trial coordinate table.
pub const SAMPLE_INTERVAL_MS: u64 = 50;

const PAGE_SIZE: (u32, u32) = (1100, 800);
const TABLE_ROWS_PER_COLUMN: usize = 30;

const ORANGE: RGBColor = RGBColor(255, 140, 0);
const GRAY: RGBColor = RGBColor(128, 128, 128);
const LIGHT_RED: RGBColor = RGBColor(240, 128, 128);

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("drawing failed: {0}")]
    Draw(String),
    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn draw_err<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Draw(e.to_string())
}

/// Outcome of a successful report run.
#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub directory: PathBuf,
    pub pages: usize,
}

/// Renders the full report for a snapshot of trial records.
///
/// Works purely on the snapshot: a failure here never touches the
/// session's in-memory store. Page count is `1 + 2 * records.len()`.
pub fn generate(
    records: &[TrialRecord],
    config: &SessionConfig,
    out_dir: &Path,
    requested_name: &str,
) -> Result<ReportSummary, ReportError> {
    let name = sanitize_report_name(requested_name);
    let directory = out_dir.join(&name);
    fs::create_dir_all(&directory)?;

    let mut pages = 0;
    draw_cover(&directory.join("page-01-cover.svg"), &name, config, records.len())?;
    pages += 1;

    for (index, record) in records.iter().enumerate() {
        let plot_page = directory.join(format!("page-{:02}-trial-{:02}-path.svg", pages + 1, index + 1));
        draw_trial_plot(&plot_page, record, config, index, records.len())?;
        pages += 1;

        let table_page = directory.join(format!("page-{:02}-trial-{:02}-table.svg", pages + 1, index + 1));
        draw_trial_table(&table_page, record, index, records.len())?;
        pages += 1;
    }

    // Raw records ride along for downstream analysis.
    let json = File::create(directory.join("records.json"))?;
    serde_json::to_writer_pretty(BufWriter::new(json), records)?;

    info!("report '{}': {} pages in {}", name, pages, directory.display());
    Ok(ReportSummary { directory, pages })
}

fn draw_cover(
    path: &Path,
    name: &str,
    config: &SessionConfig,
    trial_count: usize,
) -> Result<(), ReportError> {
    let root = SVGBackend::new(path, PAGE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    root.draw(&Text::new(
        "Trajectory report",
        (330, 140),
        ("sans-serif", 48).into_font().color(&BLACK),
    ))
    .map_err(draw_err)?;
    root.draw(&Text::new(
        format!("Dataset: {name}"),
        (330, 220),
        ("sans-serif", 26).into_font().color(&GRAY),
    ))
    .map_err(draw_err)?;
    root.draw(&Text::new(
        "Session parameters",
        (330, 320),
        ("sans-serif", 30).into_font().color(&BLACK),
    ))
    .map_err(draw_err)?;

    let lines = [
        format!("Trials recorded: {trial_count} (max {})", config.max_trials),
        format!("Deviation starts at trial: {}", config.deviation_start_trial),
        format!("Deviation angle: {}°", config.deviation_angle_deg),
        format!(
            "Result display duration: {} ms ({:.2} s)",
            config.result_display_ms,
            config.result_display_ms as f64 / 1000.0
        ),
        format!("Orbit radius: {} px", config.orbit_radius),
        format!("Target radius: {} px", config.target_radius),
        format!(
            "Screen: {}×{} px",
            config.screen_width, config.screen_height
        ),
    ];
    for (i, line) in lines.iter().enumerate() {
        root.draw(&Text::new(
            line.as_str(),
            (360, 380 + i as i32 * 40),
            ("sans-serif", 22).into_font().color(&BLACK),
        ))
        .map_err(draw_err)?;
    }

    root.present().map_err(draw_err)?;
    Ok(())
}

fn circle_points(center: Point, radius: f64) -> Vec<(f64, f64)> {
    (0..=128)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::TAU / 128.0;
            (
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect()
}

fn draw_trial_plot(
    path: &Path,
    record: &TrialRecord,
    config: &SessionConfig,
    index: usize,
    total: usize,
) -> Result<(), ReportError> {
    let root = SVGBackend::new(path, PAGE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let center = config.circle_center;
    let sub_radius = config.orbit_radius / 10.0;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Trial {} / {}", index + 1, total),
            ("sans-serif", 30),
        )
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        // Y runs downward to match screen coordinates.
        .build_cartesian_2d(
            0.0..f64::from(config.screen_width),
            f64::from(config.screen_height)..0.0,
        )
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .x_desc("X (px)")
        .y_desc("Y (px)")
        .draw()
        .map_err(draw_err)?;

    // Orbit circle and the sub-circle used for the angle annotation.
    chart
        .draw_series(LineSeries::new(circle_points(center, config.orbit_radius), &GRAY))
        .map_err(draw_err)?;
    chart
        .draw_series(LineSeries::new(circle_points(center, sub_radius), &ORANGE))
        .map_err(draw_err)?;

    // Target disc at its recorded position.
    chart
        .draw_series(std::iter::once(Polygon::new(
            circle_points(record.target, config.target_radius),
            LIGHT_RED.filled(),
        )))
        .map_err(draw_err)?
        .label("Target")
        .legend(|(x, y)| Circle::new((x + 10, y), 5, LIGHT_RED.filled()));
    chart
        .draw_series(LineSeries::new(
            circle_points(record.target, config.target_radius),
            &RED,
        ))
        .map_err(draw_err)?;

    // Cursor path with its start point.
    let path_points: Vec<(f64, f64)> = record.path.iter().map(|s| (s.pos.x, s.pos.y)).collect();
    chart
        .draw_series(LineSeries::new(path_points, &BLUE))
        .map_err(draw_err)?
        .label("Cursor path")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));
    chart
        .draw_series(std::iter::once(Circle::new(
            (center.x, center.y),
            5,
            GREEN.filled(),
        )))
        .map_err(draw_err)?;

    // Crossing point.
    chart
        .draw_series(std::iter::once(Cross::new(
            (record.crossing.x, record.crossing.y),
            8,
            RED.stroke_width(2),
        )))
        .map_err(draw_err)?
        .label("Crossing point")
        .legend(|(x, y)| Cross::new((x + 10, y), 5, RED.stroke_width(2)));

    // Movement direction against the target direction, measured where the
    // path leaves the sub-circle.
    let positions: Vec<Point> = record.path.iter().map(|s| s.pos).collect();
    if let Some(exit) = geometry::path_circle_intersection(&positions, center, sub_radius) {
        chart
            .draw_series(LineSeries::new(
                vec![(center.x, center.y), (exit.x, exit.y)],
                ORANGE.stroke_width(2),
            ))
            .map_err(draw_err)?;
        chart
            .draw_series(LineSeries::new(
                vec![(center.x, center.y), (record.target.x, record.target.y)],
                &BLACK,
            ))
            .map_err(draw_err)?;

        if let Some(angle) = geometry::angle_between_deg(center, exit, record.target) {
            chart
                .draw_series(std::iter::once(Text::new(
                    format!("Launch angle vs target: {angle:.1}°"),
                    (
                        f64::from(config.screen_width) * 0.02,
                        f64::from(config.screen_height) * 0.06,
                    ),
                    ("sans-serif", 20).into_font().color(&BLACK),
                )))
                .map_err(draw_err)?;
        }
    }

    chart
        .draw_series(std::iter::once(Text::new(
            format!(
                "Movement duration: {} ms ({:.2} s)",
                record.duration_ms(),
                record.duration_ms() as f64 / 1000.0
            ),
            (
                f64::from(config.screen_width) * 0.02,
                f64::from(config.screen_height) * 0.12,
            ),
            ("sans-serif", 20).into_font().color(&BLACK),
        )))
        .map_err(draw_err)?;

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

fn draw_trial_table(
    path: &Path,
    record: &TrialRecord,
    index: usize,
    total: usize,
) -> Result<(), ReportError> {
    let root = SVGBackend::new(path, PAGE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    root.draw(&Text::new(
        format!("Trial {} / {} — sampled coordinates", index + 1, total),
        (40, 40),
        ("sans-serif", 30).into_font().color(&BLACK),
    ))
    .map_err(draw_err)?;
    root.draw(&Text::new(
        format!("One row per {SAMPLE_INTERVAL_MS} ms, nearest recorded sample"),
        (40, 80),
        ("sans-serif", 18).into_font().color(&GRAY),
    ))
    .map_err(draw_err)?;

    let rows = sample_by_interval(&record.path, SAMPLE_INTERVAL_MS);
    for (i, row) in rows.iter().enumerate() {
        let column = i / TABLE_ROWS_PER_COLUMN;
        let line = i % TABLE_ROWS_PER_COLUMN;
        let x = 40 + column as i32 * 360;
        let y = 130 + line as i32 * 21;

        if line == 0 {
            root.draw(&Text::new(
                "t (ms)      x          y",
                (x, y),
                ("monospace", 16).into_font().color(&GRAY),
            ))
            .map_err(draw_err)?;
        }
        root.draw(&Text::new(
            format!("{:>6}  {:>8.1}  {:>8.1}", row.time_ms, row.pos.x, row.pos.y),
            (x, y + 21),
            ("monospace", 16).into_font().color(&BLACK),
        ))
        .map_err(draw_err)?;
    }

    root.present().map_err(draw_err)?;
    Ok(())
}
