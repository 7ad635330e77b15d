//! The page-load state machine.
//!
//! [`PageLifecycle`] only decides. Each transition returns the ordered
//! [`LifecycleStep`]s the surface must carry out; the surface owns the
//! render engine and performs them in that order.

use std::time::Instant;

use tracing::debug;

/// Where the current navigation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Started,
    Finished,
    Failed,
}

/// State for one navigation attempt. Replaced, never merged, by the next.
#[derive(Debug, Clone)]
pub struct LoadCycle {
    pub url: String,
    pub started_at: Instant,
    pub failed: bool,
    pub progress: u8,
}

impl LoadCycle {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            started_at: Instant::now(),
            failed: false,
            progress: 0,
        }
    }
}

/// One action the surface performs in response to a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleStep {
    /// Emit `loadingStart` for `url` with `loading = true`.
    EmitStart { url: String },
    /// Emit a start-shaped event for a history update.
    EmitHistory { url: String },
    /// Run the on-finish injected script wrapped as an IIFE.
    RunInjectedScript,
    RestoreScrollbars,
    PromoteHardwareRendering,
    /// Emit `loadingFinish` for `url`.
    EmitFinish { url: String },
    /// Emit `loadingError` for the failing URL.
    EmitError {
        url: String,
        code: i32,
        description: String,
    },
    EmitProgress(u8),
    /// (Re)link the bridge. Idempotent.
    LinkBridge,
}

#[derive(Debug, Default)]
pub struct PageLifecycle {
    phase: LoadPhase,
    cycle: Option<LoadCycle>,
}

impl PageLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn cycle(&self) -> Option<&LoadCycle> {
        self.cycle.as_ref()
    }

    /// Whether the current cycle has failed. False when idle.
    pub fn failed(&self) -> bool {
        self.cycle.as_ref().is_some_and(|c| c.failed)
    }

    /// The `loading` flag for every event except `loadingStart`.
    pub fn loading(&self, progress: u8) -> bool {
        !self.failed() && progress != 100
    }

    /// A new top-level navigation. Any unfinished cycle is discarded.
    pub fn on_started(&mut self, url: &str) -> Vec<LifecycleStep> {
        if let Some(stale) = &self.cycle {
            if self.phase == LoadPhase::Started {
                debug!(url = %stale.url, "discarding superseded load cycle");
            }
        }
        self.cycle = Some(LoadCycle::new(url));
        self.phase = LoadPhase::Started;
        debug!(url = %url, "page load started");
        vec![LifecycleStep::EmitStart {
            url: url.to_string(),
        }]
    }

    /// The engine reports the page finished. Suppressed for failed cycles.
    pub fn on_finished(&mut self, url: &str) -> Vec<LifecycleStep> {
        if self.failed() {
            debug!(url = %url, "finish suppressed for failed load");
            return Vec::new();
        }
        match &mut self.cycle {
            Some(cycle) => cycle.progress = 100,
            None => self.cycle = Some(LoadCycle::new(url)),
        }
        if let Some(cycle) = &self.cycle {
            debug!(
                url = %url,
                elapsed_ms = cycle.started_at.elapsed().as_millis() as u64,
                "page load finished"
            );
        }
        self.phase = LoadPhase::Finished;
        vec![
            LifecycleStep::RunInjectedScript,
            LifecycleStep::RestoreScrollbars,
            LifecycleStep::PromoteHardwareRendering,
            LifecycleStep::EmitFinish {
                url: url.to_string(),
            },
            LifecycleStep::LinkBridge,
        ]
    }

    /// A load error. The finish event goes out first so host loading
    /// indicators clear, then the error for the failing URL.
    pub fn on_error(&mut self, code: i32, description: &str, failing_url: &str) -> Vec<LifecycleStep> {
        match &mut self.cycle {
            Some(cycle) => cycle.failed = true,
            None => {
                let mut cycle = LoadCycle::new(failing_url);
                cycle.failed = true;
                self.cycle = Some(cycle);
            }
        }
        self.phase = LoadPhase::Failed;
        debug!(url = %failing_url, code, description = %description, "page load failed");
        vec![
            LifecycleStep::EmitFinish {
                url: failing_url.to_string(),
            },
            LifecycleStep::EmitError {
                url: failing_url.to_string(),
                code,
                description: description.to_string(),
            },
        ]
    }

    /// In-page URL change. The failed flag is left as it is.
    pub fn on_history_update(&mut self, url: &str) -> Vec<LifecycleStep> {
        if let Some(cycle) = &mut self.cycle {
            cycle.url = url.to_string();
        }
        debug!(url = %url, "history updated");
        vec![LifecycleStep::EmitHistory {
            url: url.to_string(),
        }]
    }

    /// Progress report. Relinks the bridge early once `threshold` is reached.
    pub fn on_progress(&mut self, progress: u8, threshold: u8) -> Vec<LifecycleStep> {
        let progress = progress.min(100);
        if let Some(cycle) = &mut self.cycle {
            cycle.progress = progress;
        }
        let mut steps = vec![LifecycleStep::EmitProgress(progress)];
        if progress >= threshold {
            steps.push(LifecycleStep::LinkBridge);
        }
        steps
    }
}
