use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_events::EventListener;
use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, MouseEvent};

use crate::context::PageContext;
use crate::controller::Controller;
use crate::dom::{set_style, set_styles};
use crate::error::EnhanceError;
use crate::motion::{Bounds, EASE_OUT_CUBIC};

pub const SECONDARY_CLASS: &str = "btn-secondary";
pub const RIPPLE_STYLE_ID: &str = "ripple-keyframes";
/// Rendered once by the root component.
pub const RIPPLE_KEYFRAMES: &str = "@keyframes ripple { to { transform: scale(2); opacity: 0; } }";
const ENHANCED_KEY: &str = "enhanced";

/// Translation pulling a hovered button toward the cursor.
pub fn magnetic_offset(bounds: &Bounds, x: f64, y: f64, factor: f64) -> (f64, f64) {
    let (center_x, center_y) = bounds.center();
    ((x - center_x) * factor, (y - center_y) * factor)
}

/// Size and top-left corner of a ripple centered on the click, relative to the button.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RippleGeometry {
    pub size: f64,
    pub left: f64,
    pub top: f64,
}

impl RippleGeometry {
    pub fn at(bounds: &Bounds, x: f64, y: f64) -> Self {
        let size = bounds.width.max(bounds.height);
        Self {
            size,
            left: x - bounds.left - size / 2.0,
            top: y - bounds.top - size / 2.0,
        }
    }

    fn css(&self, duration_ms: u32) -> String {
        format!(
            "position: absolute; width: {size}px; height: {size}px; left: {left}px; top: {top}px; \
             background: rgba(255, 255, 255, 0.3); border-radius: 50%; transform: scale(0); \
             animation: ripple {duration}s ease-out forwards; pointer-events: none;",
            size = self.size,
            left = self.left,
            top = self.top,
            duration = duration_ms as f64 / 1000.0,
        )
    }
}

struct Ripple {
    id: u64,
    node: Element,
    _cleanup: Timeout,
}

#[derive(Default)]
struct Ripples {
    next_id: Cell<u64>,
    live: RefCell<Vec<Ripple>>,
}

impl Ripples {
    fn spawn(self: &Rc<Self>, document: &Document, button: &HtmlElement, event: &MouseEvent, duration_ms: u32) {
        let Ok(node) = document.create_element("span") else { return };
        let geometry = RippleGeometry::at(&Bounds::of(button), event.client_x() as f64, event.client_y() as f64);
        let _ = node.set_attribute("style", &geometry.css(duration_ms));

        set_styles(button, &[("position", "relative"), ("overflow", "hidden")]);
        if button.append_child(&node).is_err() {
            return;
        }

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let ripples = Rc::downgrade(self);
        let cleanup = Timeout::new(duration_ms, move || {
            if let Some(ripples) = ripples.upgrade() {
                ripples.remove(id);
            }
        });
        self.live.borrow_mut().push(Ripple {
            id,
            node,
            _cleanup: cleanup,
        });
    }

    fn remove(&self, id: u64) {
        let mut live = self.live.borrow_mut();
        if let Some(position) = live.iter().position(|ripple| ripple.id == id) {
            let ripple = live.remove(position);
            ripple.node.remove();
        }
    }

    fn clear(&self) {
        for ripple in self.live.borrow_mut().drain(..) {
            ripple.node.remove();
        }
    }
}

pub struct ButtonEffectsController {
    ctx: Rc<PageContext>,
    listeners: Vec<EventListener>,
    ripples: Rc<Ripples>,
    enhanced: Vec<HtmlElement>,
}

impl ButtonEffectsController {
    pub fn new(ctx: Rc<PageContext>) -> Self {
        Self {
            ctx,
            listeners: Vec::new(),
            ripples: Rc::new(Ripples::default()),
            enhanced: Vec::new(),
        }
    }

    /// Number of ripples currently in the tree.
    pub fn live_ripples(&self) -> usize {
        self.ripples.live.borrow().len()
    }

    fn enhance(&mut self, button: &HtmlElement) {
        let dataset = button.dataset();
        if dataset.get(ENHANCED_KEY).is_some() {
            return;
        }
        let _ = dataset.set(ENHANCED_KEY, "true");
        self.enhanced.push(button.clone());

        let ripples = self.ripples.clone();
        let document = self.ctx.document.clone();
        let target = button.clone();
        let duration_ms = self.ctx.config.ripple_ms;
        self.listeners.push(EventListener::new(button, "click", move |event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                ripples.spawn(&document, &target, event, duration_ms);
            }
        }));

        if !button.class_list().contains(SECONDARY_CLASS) {
            self.add_magnetic(button);
        }
    }

    fn add_magnetic(&mut self, button: &HtmlElement) {
        let hovering = Rc::new(Cell::new(false));
        let factor = self.ctx.config.magnetic_factor;

        let (on_enter, entered) = (button.clone(), hovering.clone());
        self.listeners.push(EventListener::new(button, "mouseenter", move |_| {
            entered.set(true);
            set_style(&on_enter, "transition", &format!("transform 0.3s {}", EASE_OUT_CUBIC));
        }));

        let (on_leave, left) = (button.clone(), hovering.clone());
        self.listeners.push(EventListener::new(button, "mouseleave", move |_| {
            left.set(false);
            set_style(&on_leave, "transform", "translate(0, 0) scale(1)");
        }));

        let on_move = button.clone();
        self.listeners.push(EventListener::new(button, "mousemove", move |event| {
            if !hovering.get() {
                return;
            }
            let Some(event) = event.dyn_ref::<MouseEvent>() else { return };
            let (dx, dy) = magnetic_offset(
                &Bounds::of(&on_move),
                event.client_x() as f64,
                event.client_y() as f64,
                factor,
            );
            set_style(&on_move, "transform", &format!("translate({}px, {}px) scale(1.02)", dx, dy));
        }));
    }
}

impl Controller for ButtonEffectsController {
    fn name(&self) -> &'static str {
        "buttons"
    }

    fn start(&mut self) -> Result<(), EnhanceError> {
        let buttons = self.ctx.elements.buttons.clone();
        if buttons.is_empty() {
            return Ok(());
        }
        for button in &buttons {
            self.enhance(button);
        }
        log::debug!("Enhanced {} buttons", self.enhanced.len());
        Ok(())
    }

    fn stop(&mut self) {
        self.listeners.clear();
        self.ripples.clear();
        for button in self.enhanced.drain(..) {
            button.dataset().delete(ENHANCED_KEY);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        Bounds { left: 100.0, top: 200.0, width: 160.0, height: 48.0 }
    }

    #[test]
    fn magnetic_pull_is_a_tenth_of_the_offset() {
        assert_eq!(magnetic_offset(&bounds(), 180.0, 224.0, 0.1), (0.0, 0.0));
        let (dx, dy) = magnetic_offset(&bounds(), 260.0, 200.0, 0.1);
        assert!((dx - 8.0).abs() < 1e-9);
        assert!((dy + 2.4).abs() < 1e-9);
    }

    #[test]
    fn ripple_uses_the_larger_side_and_centers_on_click() {
        let ripple = RippleGeometry::at(&bounds(), 120.0, 210.0);
        assert_eq!(ripple.size, 160.0);
        assert_eq!(ripple.left, 20.0 - 80.0);
        assert_eq!(ripple.top, 10.0 - 80.0);
    }

    #[test]
    fn ripple_css_encodes_geometry_and_duration() {
        let css = RippleGeometry { size: 40.0, left: -5.0, top: 2.5 }.css(600);
        assert!(css.contains("width: 40px; height: 40px;"));
        assert!(css.contains("left: -5px; top: 2.5px;"));
        assert!(css.contains("animation: ripple 0.6s ease-out forwards"));
    }
}
