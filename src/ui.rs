use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(120);

/// Terminal feedback for the binaries: startup stages and the live verdict line.
///
/// `--ui plain` prints `==>` lines; `--ui pretty` draws spinners on stderr;
/// `auto` draws spinners only when both stderr and stdout are terminals.
#[derive(Clone, Copy, Debug)]
pub struct Ui {
    spinners: bool,
}

impl Ui {
    pub fn from_args(ui_flag: Option<&str>, is_tty: bool, disable_pretty: bool) -> Self {
        let spinners = is_tty
            && match ui_flag {
                Some("plain") => false,
                Some("pretty") => true,
                _ => !disable_pretty,
            };
        Self { spinners }
    }

    fn spinner(&self, template: &str) -> Option<ProgressBar> {
        if !self.spinners {
            return None;
        }
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::with_template(template)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(TICK);
        Some(bar)
    }

    /// A named startup step; reports its duration when dropped.
    pub fn stage(&self, name: &str) -> StageGuard {
        let bar = self.spinner("{spinner} {msg}");
        match &bar {
            Some(bar) => bar.set_message(format!("{name}…")),
            None => eprintln!("==> {name}"),
        }
        StageGuard {
            name: name.to_string(),
            started: Instant::now(),
            bar,
        }
    }

    /// One line tracking the cycle count and the latest verdict summary.
    ///
    /// Without spinners a line is printed only when the summary changes.
    pub fn live(&self) -> LiveLine {
        LiveLine {
            bar: self.spinner("{spinner} [{elapsed}] {pos} cycles  {msg}"),
            last: None,
        }
    }
}

pub struct StageGuard {
    name: String,
    started: Instant,
    bar: Option<ProgressBar>,
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let done = format!("✔ {} ({})", self.name, human(self.started.elapsed()));
        finish(self.bar.as_ref(), done);
    }
}

pub struct LiveLine {
    bar: Option<ProgressBar>,
    last: Option<String>,
}

impl LiveLine {
    pub fn cycle(&mut self, summary: &str) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
        if self.last.as_deref() == Some(summary) {
            return;
        }
        match &self.bar {
            Some(bar) => bar.set_message(summary.to_string()),
            None => eprintln!("--> {summary}"),
        }
        self.last = Some(summary.to_string());
    }

    pub fn finish(self, message: &str) {
        finish(self.bar.as_ref(), message.to_string());
    }
}

fn finish(bar: Option<&ProgressBar>, message: String) {
    match bar {
        Some(bar) => bar.finish_with_message(message),
        None => eprintln!("{message}"),
    }
}

fn human(elapsed: Duration) -> String {
    match elapsed.as_millis() {
        ms if ms < 1000 => format!("{ms}ms"),
        _ => format!("{:.2}s", elapsed.as_secs_f64()),
    }
}
