use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write;
use std::time::Duration;
use tcboard_client::prelude::{DashboardState, Field, HistoryPoint, Overview, Phase};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const NO_OVERVIEW: &str = "No overview data.";
pub const NO_COMPANY: &str = "No company overview data.";
pub const NO_HISTORY: &str = "No price history.";
pub const NO_METRICS: &str = "No metrics yet.";
const MISSING: &str = "—";

const CHART_WIDTH: usize = 60;
const TICKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub const HELP: &str = "\
  <TICKER>       search a ticker
  ?<text>        suggest tickers (as you type)
  :range <code>  switch history range: 1m, 3m, 6m, 1y
  :refresh       fetch the current ticker again
  :help          show this help
  :quit          exit";

pub fn spinner(msg: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prints each settled snapshot, with a spinner while one is loading.
/// Ends once the dashboard is dropped.
pub fn present(mut snapshots: watch::Receiver<DashboardState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut loading: Option<ProgressBar> = None;
        while snapshots.changed().await.is_ok() {
            let state = snapshots.borrow_and_update().clone();
            match state.phase {
                Phase::Idle => {}
                Phase::Loading => {
                    loading.get_or_insert_with(|| {
                        spinner(format!("Loading {} ({})", state.selected_ticker, state.range))
                    });
                }
                Phase::Ready | Phase::PartialReady => {
                    if let Some(pb) = loading.take() {
                        pb.finish_and_clear();
                    }
                    println!("{}", render(&state));
                }
            }
        }
        if let Some(pb) = loading.take() {
            pb.finish_and_clear();
        }
    })
}

/// Prints every suggestion list as it arrives.
pub fn present_suggestions(mut suggestions: watch::Receiver<Vec<String>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while suggestions.changed().await.is_ok() {
            let found = suggestions.borrow_and_update().clone();
            println!("{}", render_suggestions(&found));
        }
    })
}

pub fn render_suggestions(found: &[String]) -> String {
    match found {
        [] => "no suggestions".dimmed().to_string(),
        found => format!("{} {}", "suggestions:".dimmed(), found.join(", ")),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Dashboard
//
////////////////////////////////////////////////////////////////////////////////////////////////////

pub fn render(state: &DashboardState) -> String {
    let ticker = &state.selected_ticker;
    let mut out = String::new();

    if let Some(notice) = &state.notice {
        let _ = writeln!(out, "{}\n", notice.message.red().bold());
    }

    heading(&mut out, &format!("Overview - {ticker}"));
    table(&mut out, state.overview.as_ref(), NO_OVERVIEW);

    heading(&mut out, "Company");
    table(&mut out, state.company.as_ref(), NO_COMPANY);

    heading(&mut out, &format!("Price history - {ticker} ({})", state.range.label()));
    chart(&mut out, &state.history);

    heading(&mut out, "Quick metrics");
    metrics(&mut out, state.overview.as_ref());

    out
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", format!("== {title} ==").cyan().bold());
}

fn table(out: &mut String, data: Option<&Overview>, placeholder: &str) {
    let rows = data.map(Overview::rows).unwrap_or_default();
    if rows.is_empty() {
        let _ = writeln!(out, "  {}\n", placeholder.dimmed());
        return;
    }
    let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, value) in rows {
        let _ = writeln!(out, "  {}  {value}", format!("{key:<width$}").bold());
    }
    out.push('\n');
}

fn chart(out: &mut String, history: &[HistoryPoint]) {
    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        let _ = writeln!(out, "  {}\n", NO_HISTORY.dimmed());
        return;
    };
    let (low, high) = bounds(history);
    let _ = writeln!(out, "  {}", sparkline(history, CHART_WIDTH).green());
    let _ = writeln!(
        out,
        "  {} .. {}  low {low}  high {high}  last {}\n",
        first.date, last.date, last.close
    );
}

fn metrics(out: &mut String, overview: Option<&Overview>) {
    let Some(overview) = overview else {
        let _ = writeln!(out, "  {}", NO_METRICS.dimmed());
        return;
    };
    let _ = writeln!(
        out,
        "  Last price {}   Change {}   Change % {}",
        metric(overview.last_price()).bold(),
        signed(overview.change()),
        signed(overview.change_percent()),
    );
}

fn metric(field: Option<&Field>) -> String {
    field.map(Field::to_string).unwrap_or_else(|| MISSING.to_string())
}

fn signed(field: Option<&Field>) -> String {
    let text = metric(field);
    match field {
        Some(Field::Number(n)) if n.as_f64().is_some_and(|v| v > 0.0) => text.green().to_string(),
        Some(Field::Number(n)) if n.as_f64().is_some_and(|v| v < 0.0) => text.red().to_string(),
        _ => text,
    }
}

fn bounds(history: &[HistoryPoint]) -> (f64, f64) {
    history
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), point| {
            (low.min(point.close), high.max(point.close))
        })
}

/// One tick per bucket of closes, scaled between the lowest and highest close.
pub fn sparkline(history: &[HistoryPoint], width: usize) -> String {
    if history.is_empty() || width == 0 {
        return String::new();
    }
    let step = history.len().div_ceil(width);
    let closes: Vec<f64> = history
        .chunks(step)
        .filter_map(|bucket| bucket.last().map(|point| point.close))
        .collect();
    let (low, high) = bounds(history);
    let span = high - low;
    closes
        .iter()
        .map(|close| match span > 0.0 {
            true => TICKS[((((close - low) / span) * 7.0).round() as usize).min(7)],
            false => TICKS[3],
        })
        .collect()
}
