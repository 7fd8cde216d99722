use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use pastis::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// What the single terminal line is currently showing.
struct Display {
    bar: ProgressBar,
    phase: Option<&'static str>,
    /// `(round, total)` while an NMDS round is in flight, 0-based.
    round: Option<(usize, usize)>,
}

impl Display {
    fn round_label(&self) -> Option<String> {
        self.round
            .map(|(round, total)| format!("NMDS round {}/{}", round + 1, total))
    }

    fn spin(&self, message: String) {
        self.bar.reset();
        self.bar.set_length(0);
        if let Some(style) = spinner_style() {
            self.bar.set_style(style);
        }
        self.bar
            .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
        self.bar.set_message(message);
    }

    fn stop(&self, message: String) {
        self.bar.disable_steady_tick();
        self.bar.finish_with_message(message);
    }

    fn apply(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => {
                self.phase = Some(name);
                self.spin(name.to_string());
            }
            Progress::PhaseFinish => {
                let name = self.phase.take().unwrap_or("Done");
                self.stop(format!("✓ {}", name));
            }
            Progress::TaskStart { total_steps } => {
                self.bar.disable_steady_tick();
                self.bar.reset();
                self.bar.set_length(total_steps);
                self.bar.set_position(0);
                if let Some(style) = descent_style() {
                    self.bar.set_style(style);
                }
                self.bar.set_message("descent");
            }
            Progress::TaskIncrement => self.bar.inc(1),
            Progress::TaskFinish => {
                // Converged solves stop short of the iteration limit.
                let iterations = self.bar.position();
                self.bar
                    .abandon_with_message(format!("{} iterations", iterations));
            }
            Progress::RoundStart { round, total } => {
                self.round = Some((round, total));
                self.spin(format!("NMDS round {}/{}", round + 1, total));
            }
            Progress::RoundFinish { round, exit_code } => {
                let label = self
                    .round_label()
                    .unwrap_or_else(|| format!("NMDS round {}", round + 1));
                self.round = None;
                match exit_code {
                    Some(0) => self.stop(format!("✓ {}", label)),
                    Some(code) => self.stop(format!("⚠ {}: solver exited with {}", label, code)),
                    None => self.stop(format!("⚠ {}: solver killed by a signal", label)),
                }
            }
            Progress::Message(msg) => match self.round_label() {
                Some(label) if !self.bar.is_finished() => {
                    self.bar.set_message(format!("{}: {}", label, msg));
                }
                _ if !self.bar.is_finished() => self.bar.println(format!("  {}", msg)),
                _ => self.bar.set_message(msg),
            },
        }
    }
}

fn spinner_style() -> Option<ProgressStyle> {
    ProgressStyle::with_template("{spinner:.green} {msg}").ok()
}

fn descent_style() -> Option<ProgressStyle> {
    ProgressStyle::with_template("{msg:<12} [{bar:40.cyan/blue}] {pos}/{len} iterations ({elapsed})")
        .ok()
        .map(|style| style.progress_chars("##-"))
}

/// Renders library progress events on stderr.
#[derive(Clone)]
pub struct CliProgressHandler {
    display: Arc<Mutex<Display>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        bar.finish_and_clear();

        Self {
            display: Arc::new(Mutex::new(Display {
                bar,
                phase: None,
                round: None,
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let display = self.display.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut display) = display.lock() else {
                warn!("Progress display mutex was poisoned. Cannot update progress.");
                return;
            };
            display.apply(progress);
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
