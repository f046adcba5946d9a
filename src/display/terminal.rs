use crate::model::{Trend, VolatilityLabel, WindowReport};
use crate::utils::{format_probability, format_signed_pct, format_usd};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use colored::{Color, Colorize};
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Colours for (P(UP), P(DOWN)): the larger one green.
pub fn color_probability(p_up: f64, p_down: f64) -> (Color, Color) {
    if p_up > p_down {
        (Color::Green, Color::Red)
    } else if p_down > p_up {
        (Color::Red, Color::Green)
    } else {
        (Color::White, Color::White)
    }
}

pub fn color_volatility(label: VolatilityLabel) -> Color {
    match label {
        VolatilityLabel::Low => Color::Green,
        VolatilityLabel::Medium => Color::Yellow,
        VolatilityLabel::High => Color::Red,
    }
}

pub fn color_trend(trend: Trend) -> Color {
    match trend {
        Trend::Up => Color::Green,
        Trend::Down => Color::Red,
        Trend::Neutral => Color::Yellow,
    }
}

/// Tech index moves within +-1% are yellow.
pub fn color_tech_change(change: Option<f64>) -> Color {
    match change {
        None => Color::White,
        Some(c) if c > 0.01 => Color::Green,
        Some(c) if c < -0.01 => Color::Red,
        Some(_) => Color::Yellow,
    }
}

/// Everything shown for one cycle.
pub struct Frame<'a> {
    pub current_price: f64,
    pub updated_at: DateTime<Utc>,
    pub reports: &'a BTreeMap<u32, WindowReport>,
    pub tech_changes: &'a HashMap<u32, Option<f64>>,
}

#[derive(Tabled)]
struct WindowRow {
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Period Change")]
    change: String,
    #[tabled(rename = "Tech Δ")]
    tech_change: String,
    #[tabled(rename = "Trend")]
    trend: String,
    #[tabled(rename = "P(UP)")]
    p_up: String,
    #[tabled(rename = "P(DOWN)")]
    p_down: String,
    #[tabled(rename = "Volatility")]
    volatility: String,
}

impl WindowRow {
    fn new(report: &WindowReport, tech_change: Option<f64>) -> Self {
        let change = report.statistics.change_pct;
        let change_color = if change >= 0.0 { Color::Green } else { Color::Red };
        let (up_color, down_color) =
            color_probability(report.probability.p_up, report.probability.p_down);
        let tech_text = tech_change.map(format_signed_pct).unwrap_or_else(|| "N/A".into());
        let trend = report.trend.trend;
        let label = report.volatility.label;

        Self {
            period: format!("{}d", report.days),
            change: format_signed_pct(change).color(change_color).to_string(),
            tech_change: tech_text.color(color_tech_change(tech_change)).to_string(),
            trend: trend.to_string().color(color_trend(trend)).to_string(),
            p_up: format_probability(report.probability.p_up).color(up_color).to_string(),
            p_down: format_probability(report.probability.p_down)
                .color(down_color)
                .to_string(),
            volatility: label.to_string().color(color_volatility(label)).to_string(),
        }
    }
}

pub struct TerminalDisplay {
    title: String,
    tech_symbol: String,
    utc_offset: FixedOffset,
    refresh_minutes: u64,
    cursor_hidden: bool,
}

impl TerminalDisplay {
    pub fn new(
        title: String,
        tech_symbol: String,
        utc_offset_hours: i32,
        refresh_seconds: u64,
    ) -> Self {
        let utc_offset = FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or(Utc.fix());
        Self {
            title,
            tech_symbol,
            utc_offset,
            refresh_minutes: refresh_seconds.div_ceil(60),
            cursor_hidden: false,
        }
    }

    pub fn clear(&self) {
        print!("\x1b[2J\x1b[H");
        let _ = io::stdout().flush();
    }

    pub fn hide_cursor(&mut self) {
        if !self.cursor_hidden {
            print!("\x1b[?25l");
            let _ = io::stdout().flush();
            self.cursor_hidden = true;
        }
    }

    pub fn show_cursor(&mut self) {
        if self.cursor_hidden {
            print!("\x1b[?25h");
            let _ = io::stdout().flush();
            self.cursor_hidden = false;
        }
    }

    pub fn render_loading(&self) {
        self.clear();
        println!("{}", "📡 Getting Bitcoin market info...".cyan());
    }

    pub fn render_error(&self, message: &str, retry_seconds: u64) {
        self.clear();
        println!(
            "{}",
            format!("⚠️ Temporary error occurred. Retrying in {} seconds...", retry_seconds)
                .yellow()
        );
        println!("{}", message);
    }

    pub fn render_goodbye(&self) {
        self.clear();
        println!("{}", "👋 BTC Market Analyzer stopped. Goodbye!".green());
    }

    pub fn render(&self, frame: &Frame<'_>) {
        self.clear();
        print!("{}", self.format_frame(frame));
        let _ = io::stdout().flush();
    }

    fn format_timestamp(&self, at: DateTime<Utc>) -> String {
        let local = at.with_timezone(&self.utc_offset);
        let hours = self.utc_offset.local_minus_utc() / 3600;
        format!("{} (UTC{:+})", local.format("%H:%M:%S"), hours)
    }

    fn format_header(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record([self.title.cyan().bold().to_string()]);
        let mut panel = builder.build();
        panel.with(Style::rounded());
        panel.to_string()
    }

    /// The full screen for one cycle, rows sorted by days descending.
    pub fn format_frame(&self, frame: &Frame<'_>) -> String {
        let rows: Vec<WindowRow> = frame
            .reports
            .values()
            .rev()
            .map(|report| {
                let tech_change = frame.tech_changes.get(&report.days).copied().flatten();
                WindowRow::new(report, tech_change)
            })
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::rounded());

        format!(
            "{}\n{} {}    {} {}\n{} {}\n\n{}\n\n{}\n",
            self.format_header(),
            "Current Price:".bold(),
            format_usd(frame.current_price),
            "Last Update:".bold(),
            self.format_timestamp(frame.updated_at),
            "Tech index:".bold(),
            self.tech_symbol.magenta(),
            table,
            format!("Next update in: {} minutes", self.refresh_minutes).white()
        )
    }
}
