//! ASCII plot of training deviance against alpha.
//!
//! Fixed-size character grid, deterministic output.
//!
//! Plot elements:
//! - `lambda.min` series: `m`
//! - `lambda.1se` series: `s`
//! - chosen alpha (on the `lambda.1se` series): `*`
//! - segments between neighbouring alphas: `-`

use crate::domain::{DataSplit, ResultRecord, ResultsFile, SelectionRule};

/// Render training deviance per alpha, one series per selection rule.
pub fn render_deviance_plot(records: &[ResultRecord], best_alpha: Option<f64>, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let series: Vec<(char, Vec<(f64, f64)>)> = SelectionRule::ALL
        .iter()
        .map(|&rule| (marker(rule), series_points(records, rule)))
        .collect();

    let (a_min, a_max) = alpha_range(records).unwrap_or((0.0, 1.0));
    let (d_min, d_max) = deviance_range(records).unwrap_or((0.0, 1.0));
    let (d_min, d_max) = pad_range(d_min, d_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Segments first so markers overlay them.
    for (_, points) in &series {
        let mut prev = None;
        for &(a, d) in points {
            let cell = (map_x(a, a_min, a_max, width), map_y(d, d_min, d_max, height));
            if let Some((x0, y0)) = prev {
                draw_line(&mut grid, x0, y0, cell.0, cell.1, '-');
            }
            prev = Some(cell);
        }
    }

    for (ch, points) in &series {
        for &(a, d) in points {
            let x = map_x(a, a_min, a_max, width);
            let y = map_y(d, d_min, d_max, height);
            grid[y][x] = *ch;
        }
    }

    if let Some(best) = best_alpha {
        let chosen = records.iter().find(|r| {
            r.alpha == best && r.rule == SelectionRule::MinErrorPlusOneStdErr && r.split == DataSplit::Train
        });
        if let Some(r) = chosen {
            let x = map_x(r.alpha, a_min, a_max, width);
            let y = map_y(r.deviance, d_min, d_max, height);
            grid[y][x] = '*';
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: alpha=[{a_min:.2}, {a_max:.2}] | deviance=[{d_min:.3}, {d_max:.3}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push_str("m = lambda.min  s = lambda.1se  * = chosen alpha\n");

    out
}

/// Render the chart stored in a saved results file.
pub fn render_deviance_plot_from_results(file: &ResultsFile, width: usize, height: usize) -> String {
    render_deviance_plot(&file.training, Some(file.best_alpha), width, height)
}

fn marker(rule: SelectionRule) -> char {
    match rule {
        SelectionRule::MinError => 'm',
        SelectionRule::MinErrorPlusOneStdErr => 's',
    }
}

/// `(alpha, deviance)` for the training records of `rule`, sorted by alpha.
fn series_points(records: &[ResultRecord], rule: SelectionRule) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = records
        .iter()
        .filter(|r| r.rule == rule && r.split == DataSplit::Train && r.deviance.is_finite())
        .map(|r| (r.alpha, r.deviance))
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points
}

fn alpha_range(records: &[ResultRecord]) -> Option<(f64, f64)> {
    finite_range(records.iter().filter(|r| r.split == DataSplit::Train).map(|r| r.alpha))
}

fn deviance_range(records: &[ResultRecord]) -> Option<(f64, f64)> {
    finite_range(records.iter().filter(|r| r.split == DataSplit::Train).map(|r| r.deviance))
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(a: f64, a_min: f64, a_max: f64, width: usize) -> usize {
    let u = ((a - a_min) / (a_max - a_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(d: f64, d_min: f64, d_max: f64, height: usize) -> usize {
    let u = ((d - d_min) / (d_max - d_min)).clamp(0.0, 1.0);
    // Largest deviance on row 0.
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham); only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y0 as usize).and_then(|row| row.get_mut(x0 as usize)) {
            if *cell == ' ' {
                *cell = ch;
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
