// 🍩 Charts - SVG renderings of the dashboard aggregates
//
// Three documents: expense donut, monthly income/expense bars with a balance
// line, and the cumulative balance area. Coordinates are plain f64 in a fixed
// viewBox; the browser scales them.

use crate::aggregate::{CategoryShare, MonthSummary};
use crate::config::Config;
use crate::dashboard::Dashboard;
use anyhow::{Context, Result};
use std::f64::consts::PI;
use std::path::{Path as FsPath, PathBuf};
use svg::node::element::path::Data;
use svg::node::element::{Circle, Group, Line, Path, Polyline, Rectangle, Text};
use svg::node::Text as TextNode;
use svg::Document;

pub const INCOME_COLOR: &str = "#00CC96";
pub const EXPENSE_COLOR: &str = "#EF553B";
pub const BALANCE_LINE_COLOR: &str = "#444444";
pub const CUMULATIVE_COLOR: &str = "#636EFA";
pub const CUMULATIVE_FILL: &str = "rgba(99, 110, 250, 0.2)";

/// Qualitative pastel palette for donut slices
pub const PASTEL: [&str; 11] = [
    "rgb(102, 197, 204)",
    "rgb(246, 207, 113)",
    "rgb(248, 156, 116)",
    "rgb(220, 176, 242)",
    "rgb(135, 197, 95)",
    "rgb(158, 185, 243)",
    "rgb(254, 136, 177)",
    "rgb(201, 219, 116)",
    "rgb(139, 224, 164)",
    "rgb(180, 151, 231)",
    "rgb(179, 179, 179)",
];

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 420.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 50.0;

const DONUT_SIZE: f64 = 420.0;
const DONUT_OUTER: f64 = 170.0;
/// Hole is half the radius
const DONUT_INNER: f64 = 85.0;

// ============================================================================
// HELPERS
// ============================================================================

fn label(x: f64, y: f64, content: &str) -> Text {
    Text::new()
        .set("x", x)
        .set("y", y)
        .set("text-anchor", "middle")
        .set("font-family", "sans-serif")
        .set("font-size", 12)
        .add(TextNode::new(content))
}

fn title(content: &str, width: f64) -> Text {
    label(width / 2.0, 24.0, content)
        .set("font-size", 16)
        .set("font-weight", "bold")
}

fn canvas(width: f64, height: f64) -> Document {
    Document::new()
        .set("viewBox", (0.0, 0.0, width, height))
        .set("width", width)
        .set("height", height)
}

/// Chart replaced by a centred message
fn notice(message: &str, width: f64, height: f64) -> Document {
    canvas(width, height).add(label(width / 2.0, height / 2.0, message).set("fill", "#888888"))
}

/// Short SI-style amount: 3.8k, 1.2M, 950
pub fn si_label(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}k", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    }
}

/// Maps amounts onto the plot's vertical range
#[derive(Debug, Clone, Copy)]
struct YScale {
    min: f64,
    max: f64,
}

impl YScale {
    /// Range always includes zero, with a little headroom for labels
    fn covering<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let (mut min, mut max) = (0.0_f64, 0.0_f64);
        for v in values {
            min = min.min(v);
            max = max.max(v);
        }
        let pad = (max - min).abs().max(1.0) * 0.1;
        YScale {
            min: if min < 0.0 { min - pad } else { 0.0 },
            max: max + pad,
        }
    }

    fn y(&self, value: f64) -> f64 {
        let top = MARGIN_TOP;
        let bottom = HEIGHT - MARGIN_BOTTOM;
        bottom - (value - self.min) / (self.max - self.min) * (bottom - top)
    }
}

fn slot_center(i: usize, n: usize) -> f64 {
    let plot = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    MARGIN_LEFT + plot / n as f64 * (i as f64 + 0.5)
}

fn axes(scale: &YScale, y_title: &str) -> Group {
    let zero = scale.y(0.0);
    let y_axis = Line::new()
        .set("x1", MARGIN_LEFT)
        .set("x2", MARGIN_LEFT)
        .set("y1", MARGIN_TOP)
        .set("y2", HEIGHT - MARGIN_BOTTOM)
        .set("stroke", "#999999");
    let x_axis = Line::new()
        .set("x1", MARGIN_LEFT)
        .set("x2", WIDTH - MARGIN_RIGHT)
        .set("y1", zero)
        .set("y2", zero)
        .set("stroke", "#999999");

    let mut group = Group::new().add(y_axis).add(x_axis);
    for v in [scale.min, (scale.min + scale.max) / 2.0, scale.max] {
        group = group.add(
            label(MARGIN_LEFT - 8.0, scale.y(v) + 4.0, &si_label(v)).set("text-anchor", "end"),
        );
    }
    group.add(
        label(16.0, HEIGHT / 2.0, y_title)
            .set("transform", format!("rotate(-90 16 {})", HEIGHT / 2.0)),
    )
}

// ============================================================================
// DONUT (expense composition)
// ============================================================================

/// Point on a circle centred in the donut canvas; angle 0 = 12 o'clock, clockwise
fn polar(radius: f64, angle: f64) -> (f64, f64) {
    let c = DONUT_SIZE / 2.0;
    (c + radius * angle.sin(), c - radius * angle.cos())
}

fn ring_segment(start: f64, end: f64) -> String {
    let large = if end - start > PI { 1 } else { 0 };
    let (ox1, oy1) = polar(DONUT_OUTER, start);
    let (ox2, oy2) = polar(DONUT_OUTER, end);
    let (ix2, iy2) = polar(DONUT_INNER, end);
    let (ix1, iy1) = polar(DONUT_INNER, start);

    format!(
        "M {:.2} {:.2} A {r} {r} 0 {l} 1 {:.2} {:.2} L {:.2} {:.2} A {ri} {ri} 0 {l} 0 {:.2} {:.2} Z",
        ox1,
        oy1,
        ox2,
        oy2,
        ix2,
        iy2,
        ix1,
        iy1,
        r = DONUT_OUTER,
        ri = DONUT_INNER,
        l = large,
    )
}

pub fn donut_chart(slices: &[CategoryShare], heading: &str) -> Document {
    if slices.is_empty() {
        return notice(heading, DONUT_SIZE, DONUT_SIZE);
    }

    let mut doc = canvas(DONUT_SIZE, DONUT_SIZE + 20.0).add(title(heading, DONUT_SIZE));
    let mut start = 0.0;

    for (i, slice) in slices.iter().enumerate() {
        let color = PASTEL[i % PASTEL.len()];
        let sweep = slice.share * 2.0 * PI;
        let end = start + sweep;

        if slice.share >= 0.9999 {
            // A full ring cannot be drawn as one arc
            let c = DONUT_SIZE / 2.0;
            doc = doc.add(
                Circle::new()
                    .set("cx", c)
                    .set("cy", c)
                    .set("r", (DONUT_OUTER + DONUT_INNER) / 2.0)
                    .set("fill", "none")
                    .set("stroke", color)
                    .set("stroke-width", DONUT_OUTER - DONUT_INNER),
            );
        } else if sweep > 0.0 {
            doc = doc.add(
                Path::new()
                    .set("d", ring_segment(start, end))
                    .set("fill", color)
                    .set("stroke", "white")
                    .set("stroke-width", 1),
            );
        }

        let (lx, ly) = polar((DONUT_OUTER + DONUT_INNER) / 2.0, start + sweep / 2.0);
        doc = doc
            .add(label(lx, ly - 2.0, &format!("{:.1}%", slice.share * 100.0)))
            .add(label(lx, ly + 12.0, slice.category.label()).set("font-size", 10));

        start = end;
    }

    doc
}

// ============================================================================
// MONTHLY BARS + BALANCE LINE
// ============================================================================

pub fn monthly_chart(months: &[MonthSummary], heading: &str, config: &Config) -> Document {
    if months.is_empty() {
        return notice(heading, WIDTH, HEIGHT);
    }

    let scale = YScale::covering(
        months
            .iter()
            .flat_map(|m| [m.income, m.expense, m.balance]),
    );
    let n = months.len();
    let slot = (WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / n as f64;
    let bar = (slot * 0.35).min(60.0);

    let mut doc = canvas(WIDTH, HEIGHT)
        .add(title(heading, WIDTH))
        .add(axes(&scale, &format!("Amount ({})", config.currency_symbol)));

    let zero = scale.y(0.0);
    let mut points = Vec::with_capacity(n);

    for (i, m) in months.iter().enumerate() {
        let cx = slot_center(i, n);

        for (value, color, x) in [
            (m.income, INCOME_COLOR, cx - bar),
            (m.expense, EXPENSE_COLOR, cx),
        ] {
            let top = scale.y(value);
            doc = doc
                .add(
                    Rectangle::new()
                        .set("x", x)
                        .set("y", top.min(zero))
                        .set("width", bar)
                        .set("height", (zero - top).abs())
                        .set("fill", color),
                )
                .add(label(x + bar / 2.0, top - 4.0, &si_label(value)).set("font-size", 10));
        }

        doc = doc.add(label(cx, HEIGHT - MARGIN_BOTTOM + 18.0, m.month_name));
        points.push((cx, scale.y(m.balance), m.balance));
    }

    let line: Vec<String> = points
        .iter()
        .map(|(x, y, _)| format!("{:.2},{:.2}", x, y))
        .collect();
    doc = doc.add(
        Polyline::new()
            .set("points", line.join(" "))
            .set("fill", "none")
            .set("stroke", BALANCE_LINE_COLOR)
            .set("stroke-width", 3)
            .set("stroke-dasharray", "2 6"),
    );
    for (x, y, balance) in points {
        doc = doc
            .add(Circle::new().set("cx", x).set("cy", y).set("r", 4).set("fill", BALANCE_LINE_COLOR))
            .add(label(x, y - 10.0, &format!("{:.0}", balance)));
    }

    doc.add(legend(&[
        ("Income", INCOME_COLOR),
        ("Expense", EXPENSE_COLOR),
        ("Month balance", BALANCE_LINE_COLOR),
    ]))
}

fn legend(entries: &[(&str, &str)]) -> Group {
    let mut group = Group::new();
    let mut x = WIDTH - MARGIN_RIGHT - 130.0 * entries.len() as f64;
    for (name, color) in entries {
        group = group
            .add(
                Rectangle::new()
                    .set("x", x)
                    .set("y", 34.0)
                    .set("width", 10)
                    .set("height", 10)
                    .set("fill", *color),
            )
            .add(label(x + 14.0, 43.0, name).set("text-anchor", "start"));
        x += 130.0;
    }
    group
}

// ============================================================================
// CUMULATIVE BALANCE AREA
// ============================================================================

pub fn cumulative_chart(months: &[MonthSummary], heading: &str, config: &Config) -> Document {
    if months.is_empty() {
        return notice(heading, WIDTH, HEIGHT);
    }

    let scale = YScale::covering(months.iter().map(|m| m.cumulative));
    let n = months.len();
    let zero = scale.y(0.0);

    let points: Vec<(f64, f64)> = months
        .iter()
        .enumerate()
        .map(|(i, m)| (slot_center(i, n), scale.y(m.cumulative)))
        .collect();

    // Area closes along the zero line
    let (first_x, _) = points[0];
    let (last_x, _) = points[n - 1];
    let area = points
        .iter()
        .fold(Data::new().move_to((first_x, zero)), |data, &(x, y)| {
            data.line_to((x, y))
        })
        .line_to((last_x, zero))
        .close();

    let mut doc = canvas(WIDTH, HEIGHT)
        .add(title(heading, WIDTH))
        .add(axes(&scale, &format!("Balance ({})", config.currency_symbol)))
        .add(
            Path::new()
                .set("d", area)
                .set("fill", CUMULATIVE_FILL)
                .set("stroke", "none"),
        )
        .add(
            Line::new()
                .set("x1", MARGIN_LEFT)
                .set("x2", WIDTH - MARGIN_RIGHT)
                .set("y1", zero)
                .set("y2", zero)
                .set("stroke", "gray")
                .set("stroke-dasharray", "6 4"),
        );

    let line: Vec<String> = points
        .iter()
        .map(|(x, y)| format!("{:.2},{:.2}", x, y))
        .collect();
    doc = doc.add(
        Polyline::new()
            .set("points", line.join(" "))
            .set("fill", "none")
            .set("stroke", CUMULATIVE_COLOR)
            .set("stroke-width", 2),
    );

    for (m, (x, y)) in months.iter().zip(points) {
        doc = doc
            .add(Circle::new().set("cx", x).set("cy", y).set("r", 4).set("fill", CUMULATIVE_COLOR))
            .add(label(x, y - 10.0, &config.money(m.cumulative)).set("font-size", 10))
            .add(label(x, HEIGHT - MARGIN_BOTTOM + 18.0, m.month_name));
    }

    doc
}

// ============================================================================
// DASHBOARD → DOCUMENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Donut,
    Monthly,
    Balance,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Donut, ChartKind::Monthly, ChartKind::Balance];

    pub fn file_name(&self) -> &'static str {
        match self {
            ChartKind::Donut => "donut.svg",
            ChartKind::Monthly => "monthly.svg",
            ChartKind::Balance => "balance.svg",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        ChartKind::ALL.into_iter().find(|k| k.file_name() == name)
    }
}

/// Render one chart of the dashboard (or its notice)
pub fn render(kind: ChartKind, dash: &Dashboard, config: &Config) -> Document {
    let month = dash.selection.month_name();
    match kind {
        ChartKind::Donut => match dash.donut_notice() {
            Some(message) => notice(&message, DONUT_SIZE, DONUT_SIZE),
            None => donut_chart(
                &dash.expense_slices,
                &format!("Spending breakdown ({})", month),
            ),
        },
        ChartKind::Monthly => match dash.annual_notice() {
            Some(message) => notice(message, WIDTH, HEIGHT),
            None => monthly_chart(
                &dash.monthly,
                &format!("Monthly overview {}: income vs expenses", dash.selection.year),
                config,
            ),
        },
        ChartKind::Balance => match dash.annual_notice() {
            Some(message) => notice(message, WIDTH, HEIGHT),
            None => cumulative_chart(
                &dash.monthly,
                &format!("Cumulative balance {}: what is left month by month?", dash.selection.year),
                config,
            ),
        },
    }
}

/// Write all three charts into `dir`; returns the written paths
pub fn export_all(dir: &FsPath, dash: &Dashboard, config: &Config) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create chart directory: {:?}", dir))?;

    let mut written = Vec::new();
    for kind in ChartKind::ALL {
        let path = dir.join(kind.file_name());
        svg::save(&path, &render(kind, dash, config))
            .with_context(|| format!("Failed to write chart: {:?}", path))?;
        written.push(path);
    }

    log::info!("Exported {} charts to {:?}", written.len(), dir);
    Ok(written)
}
