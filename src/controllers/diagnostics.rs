use std::cell::Cell;
use std::rc::Rc;

use gloo_events::EventListener;
use gloo_timers::callback::Interval;

use crate::config::is_dev_host;
use crate::context::PageContext;
use crate::controller::Controller;
use crate::error::EnhanceError;

#[derive(Debug, Default)]
pub struct ScrollMetrics {
    events: Cell<u64>,
    last_scroll_ms: Cell<f64>,
}

impl ScrollMetrics {
    pub fn record(&self, now_ms: f64) {
        self.events.set(self.events.get() + 1);
        self.last_scroll_ms.set(now_ms);
    }

    pub fn events(&self) -> u64 {
        self.events.get()
    }

    pub fn summary(&self) -> String {
        format!(
            "scroll events: {}, last scroll at {:.0}ms",
            self.events.get(),
            self.last_scroll_ms.get()
        )
    }
}

/// Counts scroll events and, on a development host, reports them periodically.
pub struct DiagnosticsController {
    ctx: Rc<PageContext>,
    metrics: Rc<ScrollMetrics>,
    listener: Option<EventListener>,
    report: Option<Interval>,
}

impl DiagnosticsController {
    pub fn new(ctx: Rc<PageContext>) -> Self {
        Self {
            ctx,
            metrics: Rc::new(ScrollMetrics::default()),
            listener: None,
            report: None,
        }
    }

    pub fn metrics(&self) -> &ScrollMetrics {
        &self.metrics
    }
}

impl Controller for DiagnosticsController {
    fn name(&self) -> &'static str {
        "diagnostics"
    }

    fn start(&mut self) -> Result<(), EnhanceError> {
        if self.listener.is_some() {
            return Ok(());
        }
        let metrics = self.metrics.clone();
        let performance = self.ctx.window.performance();
        self.listener = Some(EventListener::new(&self.ctx.window, "scroll", move |_| {
            let now = performance.as_ref().map(|p| p.now()).unwrap_or(0.0);
            metrics.record(now);
        }));

        let hostname = self.ctx.window.location().hostname()?;
        if is_dev_host(&hostname) {
            let metrics = self.metrics.clone();
            self.report = Some(Interval::new(self.ctx.config.diagnostics_interval_ms, move || {
                log::info!("Performance metrics: {}", metrics.summary());
            }));
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.listener = None;
        self.report = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_scroll_events() {
        let metrics = ScrollMetrics::default();
        metrics.record(16.0);
        metrics.record(1234.4);
        assert_eq!(metrics.events(), 2);
        assert_eq!(metrics.summary(), "scroll events: 2, last scroll at 1234ms");
    }
}
