use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use web_sys::Element;

// CSS timing functions shared by every transition the controllers write.
pub const EASE_OUT_CUBIC: &str = "cubic-bezier(0.33, 1, 0.68, 1)";
pub const EASE_IN_OUT_QUART: &str = "cubic-bezier(0.76, 0, 0.24, 1)";
pub const EASE_OUT_EXPO: &str = "cubic-bezier(0.16, 1, 0.3, 1)";
pub const SPRING: &str = "cubic-bezier(0.68, -0.55, 0.265, 1.55)";

pub fn lerp(start: f64, end: f64, factor: f64) -> f64 {
    start * (1.0 - factor) + end * factor
}

pub fn map_range(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    ((value - in_min) * (out_max - out_min)) / (in_max - in_min) + out_min
}

pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Cubic ease-out over a progress value in `[0, 1]`.
pub fn ease_out_cubic(progress: f64) -> f64 {
    1.0 - (1.0 - progress).powi(3)
}

/// Share of an element's height currently inside a viewport of `viewport_height`.
pub fn visible_fraction(top: f64, bottom: f64, viewport_height: f64) -> f64 {
    let height = bottom - top;
    if height <= 0.0 {
        return 0.0;
    }
    let visible = bottom.min(viewport_height) - top.max(0.0);
    visible / height
}

pub fn is_in_viewport(element: &Element, viewport_height: f64, threshold: f64) -> bool {
    let rect = element.get_bounding_client_rect();
    visible_fraction(rect.top(), rect.bottom(), viewport_height) >= threshold
}

/// Plain copy of an element's client rect.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn of(element: &Element) -> Self {
        let rect = element.get_bounding_client_rect();
        Self {
            left: rect.left(),
            top: rect.top(),
            width: rect.width(),
            height: rect.height(),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Pointer position relative to the center, as a fraction of the size (-0.5..=0.5 inside).
    pub fn normalized_offset(&self, x: f64, y: f64) -> (f64, f64) {
        (
            map_range(x, self.left, self.left + self.width, -0.5, 0.5),
            map_range(y, self.top, self.top + self.height, -0.5, 0.5),
        )
    }
}

/// Trailing-edge debounce. Each call replaces (and so cancels) the pending one.
#[derive(Clone)]
pub struct Debounce {
    wait_ms: u32,
    pending: Rc<RefCell<Option<Timeout>>>,
}

impl Debounce {
    pub fn new(wait_ms: u32) -> Self {
        Self {
            wait_ms,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    pub fn call<F: FnOnce() + 'static>(&self, f: F) {
        let timeout = Timeout::new(self.wait_ms, f);
        *self.pending.borrow_mut() = Some(timeout);
    }

    pub fn cancel(&self) {
        // Dropping the handle clears the timer.
        self.pending.borrow_mut().take();
    }
}

/// Leading-edge throttle: at most one accepted call per `limit_ms`.
///
/// The cooldown timer lives in the throttle, so dropping the last clone cancels it.
#[derive(Clone)]
pub struct Throttle {
    limit_ms: u32,
    cooldown: Rc<RefCell<Option<Timeout>>>,
}

impl Throttle {
    pub fn new(limit_ms: u32) -> Self {
        Self {
            limit_ms,
            cooldown: Rc::new(RefCell::new(None)),
        }
    }

    pub fn ready(&self) -> bool {
        if self.is_cooling() {
            return false;
        }
        let cooldown = Rc::downgrade(&self.cooldown);
        let timeout = Timeout::new(self.limit_ms, move || {
            if let Some(cooldown) = cooldown.upgrade() {
                cooldown.borrow_mut().take();
            }
        });
        *self.cooldown.borrow_mut() = Some(timeout);
        true
    }

    pub fn is_cooling(&self) -> bool {
        self.cooldown.borrow().is_some()
    }
}
