use std::fmt::Display;
use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use geodex::cli::import::ImportSummary;
use geodex::cli::runner::RunSummary;
use geodex::db::GisStats;
use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum Theme {
    Auto,
    Dark,
    Plain,
}

/// Human-readable reporting on stdout; diagnostics go through `tracing`.
pub struct Ui {
    palette: Palette,
    paint: bool,
    quiet: bool,
}

impl Ui {
    pub fn new(theme: Theme, quiet: bool) -> Self {
        let paint = theme != Theme::Plain && !quiet && std::io::stdout().is_terminal();

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        let palette = if paint {
            Palette::dark()
        } else {
            Palette::plain()
        };
        Self {
            palette,
            paint,
            quiet,
        }
    }

    pub fn run_summary(&self, summary: &RunSummary, log: &Path, elapsed: Duration) {
        let ended = if summary.quit { "quit" } else { "end of script" };
        self.section(
            "Script",
            [
                ("commands", summary.commands.to_string()),
                ("failed", summary.failed.to_string()),
                ("stopped at", ended.to_string()),
                ("log", log.display().to_string()),
                ("elapsed", format_duration(elapsed)),
            ],
        );
        if summary.failed > 0 {
            self.warn(&format!(
                "{} command(s) failed; see the command log for details",
                summary.failed
            ));
        } else {
            self.success("script completed");
        }
    }

    pub fn import_summary(&self, file: &Path, summary: &ImportSummary, elapsed: Duration) {
        self.section(
            "Import",
            [
                ("file", file.display().to_string()),
                ("records", summary.records.to_string()),
                ("new names", summary.new_names.to_string()),
                ("new points", summary.new_points.to_string()),
                ("merged points", summary.merged_points.to_string()),
                ("outside world", summary.out_of_world.to_string()),
                ("no coordinate", summary.missing_coordinates.to_string()),
                ("malformed", summary.malformed.to_string()),
                ("elapsed", format_duration(elapsed)),
            ],
        );
        if summary.malformed > 0 {
            self.warn(&format!("skipped {} malformed line(s)", summary.malformed));
        }
    }

    pub fn index_stats(&self, stats: &GisStats) {
        self.section(
            "Name index",
            [
                ("keys", stats.names.elements.to_string()),
                ("slots", stats.names.slots.to_string()),
                ("longest chain", stats.names.max_chain_len.to_string()),
                ("load limit", stats.names.load_limit.to_string()),
                ("rehashes", stats.names.rehashes.to_string()),
            ],
        );
        if let Some(tree) = &stats.spatial {
            self.section(
                "Quadtree",
                [
                    ("points", tree.points.to_string()),
                    ("locators", tree.locators.to_string()),
                    ("leaves", tree.leaves.to_string()),
                    ("internal nodes", tree.internal_nodes.to_string()),
                    ("height", tree.height.to_string()),
                    ("bucket capacity", tree.bucket_capacity.to_string()),
                ],
            );
        }
        self.section(
            "Store",
            [
                ("bytes", stats.store_bytes.to_string()),
                (
                    "pool",
                    format!("{}/{}", stats.pool_len, stats.pool_capacity),
                ),
            ],
        );
    }

    /// Starts a spinner that reports an interruption if dropped unfinished.
    pub fn task(&self, label: impl Into<String>) -> TaskGuard<'_> {
        let label = label.into();
        let pb = self.paint.then(|| {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                pb.set_style(style);
            }
            pb.set_message(label.clone());
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });
        TaskGuard {
            ui: self,
            label,
            start: Instant::now(),
            finished: false,
            pb,
        }
    }

    fn section<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        let rows: Vec<(&str, String)> = rows
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        if self.paint {
            println!("{}", self.palette.heading.paint(format!("▸ {title}")));
        } else {
            println!("{title}");
        }
        let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in rows {
            println!(
                "  {} {}",
                self.palette.key.paint(format!("{key:>width$}:")),
                self.palette.value.paint(value)
            );
        }
    }

    fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        println!("{} {message}", self.palette.success.paint("✔"));
    }

    fn warn(&self, message: &str) {
        eprintln!("{} {message}", self.palette.warn.paint("⚠"));
    }
}

pub struct TaskGuard<'a> {
    ui: &'a Ui,
    label: String,
    start: Instant,
    finished: bool,
    pb: Option<ProgressBar>,
}

impl TaskGuard<'_> {
    pub fn finish(mut self) -> Duration {
        self.finished = true;
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
        self.start.elapsed()
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let message = format!(
            "{} interrupted after {}",
            self.label,
            format_duration(self.start.elapsed())
        );
        match self.pb.take() {
            Some(pb) => pb.abandon_with_message(message),
            None => self.ui.warn(&message),
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs_f64() >= 1.0 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{:.0}ms", duration.as_secs_f64() * 1_000.0)
    }
}

struct Palette {
    heading: Style,
    key: Style,
    value: Style,
    success: Style,
    warn: Style,
}

impl Palette {
    fn dark() -> Self {
        Self {
            heading: Style::new().fg(Color::Purple).bold(),
            key: Style::new().fg(Color::LightBlue).bold(),
            value: Style::new().fg(Color::White),
            success: Style::new().fg(Color::LightGreen).bold(),
            warn: Style::new().fg(Color::Yellow).bold(),
        }
    }

    fn plain() -> Self {
        Self {
            heading: Style::new(),
            key: Style::new(),
            value: Style::new(),
            success: Style::new(),
            warn: Style::new(),
        }
    }
}
