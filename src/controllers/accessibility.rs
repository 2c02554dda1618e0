use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_events::EventListener;
use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, KeyboardEvent, MediaQueryListEvent};

use crate::context::PageContext;
use crate::controller::Controller;
use crate::dom::{clear_style, query, set_styles};
use crate::error::EnhanceError;

pub const KEYBOARD_CLASS: &str = "keyboard-navigation";
pub const LIVE_REGION_ID: &str = "live-region";
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";
pub const TRANSITION_PROPERTIES: [&str; 3] = ["--transition-all", "--transition-fast", "--transition-slow"];
const OPEN_QUESTION: &str = ".faq-item.open .faq-question";
const FADE_VISIBLE_CLASS: &str = "visible";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    ShowFocusRings,
    CloseAccordion,
}

pub fn key_action(key: &str) -> Option<KeyAction> {
    match key {
        "Tab" => Some(KeyAction::ShowFocusRings),
        "Escape" => Some(KeyAction::CloseAccordion),
        _ => None,
    }
}

/// Polite, atomic region for screen reader announcements. Only the latest message is guaranteed.
pub struct LiveRegion {
    element: HtmlElement,
    clear_ms: u32,
    clear_timer: RefCell<Option<Timeout>>,
}

impl LiveRegion {
    pub fn attach(document: &Document, clear_ms: u32) -> Option<Self> {
        let element = match document.get_element_by_id(LIVE_REGION_ID) {
            Some(existing) => existing.dyn_into::<HtmlElement>().ok()?,
            None => {
                let element = document.create_element("div").ok()?.dyn_into::<HtmlElement>().ok()?;
                element.set_id(LIVE_REGION_ID);
                let _ = element.set_attribute("aria-live", "polite");
                let _ = element.set_attribute("aria-atomic", "true");
                element.set_class_name("sr-only");
                document.body()?.append_child(&element).ok()?;
                element
            }
        };
        Some(Self {
            element,
            clear_ms,
            clear_timer: RefCell::new(None),
        })
    }

    pub fn announce(&self, message: &str) {
        self.element.set_text_content(Some(message));
        let element = self.element.clone();
        let timeout = Timeout::new(self.clear_ms, move || {
            element.set_text_content(Some(""));
        });
        // Replacing the handle cancels the previous clear.
        *self.clear_timer.borrow_mut() = Some(timeout);
    }

    fn cancel(&self) {
        self.clear_timer.borrow_mut().take();
    }
}

struct MotionPreference {
    document: Document,
    fade_elements: Vec<HtmlElement>,
    reduced: Cell<bool>,
}

impl MotionPreference {
    fn root(&self) -> Option<HtmlElement> {
        self.document
            .document_element()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }

    fn apply(&self, reduce: bool) {
        self.reduced.set(reduce);
        let Some(root) = self.root() else { return };
        if reduce {
            let style = root.style();
            for property in TRANSITION_PROPERTIES {
                let _ = style.set_property(property, "none");
            }
            // Deferred fade-ins would otherwise stay hidden until scrolled to.
            for element in &self.fade_elements {
                let _ = element.class_list().add_1(FADE_VISIBLE_CLASS);
            }
            log::info!("Reduced motion active");
        } else {
            for property in TRANSITION_PROPERTIES {
                clear_style(&root, property);
            }
            log::info!("Reduced motion released");
        }
    }
}

pub struct AccessibilityController {
    ctx: Rc<PageContext>,
    listeners: Vec<EventListener>,
    live_region: Option<LiveRegion>,
    motion: Option<Rc<MotionPreference>>,
}

impl AccessibilityController {
    pub fn new(ctx: Rc<PageContext>) -> Self {
        Self {
            ctx,
            listeners: Vec::new(),
            live_region: None,
            motion: None,
        }
    }

    pub fn announce(&self, message: &str) {
        match &self.live_region {
            Some(region) => region.announce(message),
            None => log::debug!("No live region for announcement: {}", message),
        }
    }

    /// Applies or releases reduced motion as if the media preference had changed.
    pub fn apply_reduced_motion(&self, reduce: bool) {
        if let Some(motion) = &self.motion {
            motion.apply(reduce);
        }
    }

    pub fn reduced_motion(&self) -> bool {
        self.motion.as_ref().map(|m| m.reduced.get()).unwrap_or(false)
    }

    fn setup_keyboard(&mut self) {
        let document = self.ctx.document.clone();
        self.listeners.push(EventListener::new(&self.ctx.document, "keydown", move |event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else { return };
            match key_action(&event.key()) {
                Some(KeyAction::ShowFocusRings) => {
                    if let Some(body) = document.body() {
                        let _ = body.class_list().add_1(KEYBOARD_CLASS);
                    }
                }
                // Clicking the question runs the accordion's own toggle path.
                Some(KeyAction::CloseAccordion) => {
                    if let Some(question) = query::<HtmlElement>(&document, OPEN_QUESTION) {
                        question.click();
                    }
                }
                None => {}
            }
        }));

        let document = self.ctx.document.clone();
        self.listeners.push(EventListener::new(&self.ctx.document, "mousedown", move |_| {
            if let Some(body) = document.body() {
                let _ = body.class_list().remove_1(KEYBOARD_CLASS);
            }
        }));

        for element in &self.ctx.elements.focusable {
            let focused = element.clone();
            self.listeners.push(EventListener::new(element, "focus", move |_| {
                set_styles(
                    &focused,
                    &[("outline", "2px solid var(--accent-crimson)"), ("outline-offset", "2px")],
                );
            }));
            let blurred = element.clone();
            self.listeners.push(EventListener::new(element, "blur", move |_| {
                clear_style(&blurred, "outline");
                clear_style(&blurred, "outline-offset");
            }));
        }
    }

    fn setup_reduced_motion(&mut self) -> Result<(), EnhanceError> {
        let Some(query) = self.ctx.window.match_media(REDUCED_MOTION_QUERY)? else {
            return Ok(());
        };
        let motion = Rc::new(MotionPreference {
            document: self.ctx.document.clone(),
            fade_elements: self.ctx.elements.fade_elements.clone(),
            reduced: Cell::new(false),
        });
        if query.matches() {
            motion.apply(true);
        }

        let on_change = motion.clone();
        self.listeners.push(EventListener::new(&query, "change", move |event| {
            if let Some(event) = event.dyn_ref::<MediaQueryListEvent>() {
                on_change.apply(event.matches());
            }
        }));
        self.motion = Some(motion);
        Ok(())
    }
}

impl Controller for AccessibilityController {
    fn name(&self) -> &'static str {
        "accessibility"
    }

    fn start(&mut self) -> Result<(), EnhanceError> {
        if !self.listeners.is_empty() {
            return Ok(());
        }
        self.setup_keyboard();
        self.live_region = LiveRegion::attach(&self.ctx.document, self.ctx.config.announce_clear_ms);
        if self.live_region.is_none() {
            log::warn!("Could not attach the live region");
        }
        self.setup_reduced_motion()
    }

    fn stop(&mut self) {
        self.listeners.clear();
        if let Some(region) = self.live_region.take() {
            region.cancel();
        }
        if let Some(motion) = self.motion.take() {
            if motion.reduced.get() {
                motion.apply(false);
            }
        }
        if let Some(body) = self.ctx.document.body() {
            let _ = body.class_list().remove_1(KEYBOARD_CLASS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(key_action("Tab"), Some(KeyAction::ShowFocusRings));
        assert_eq!(key_action("Escape"), Some(KeyAction::CloseAccordion));
        assert_eq!(key_action("Enter"), None);
        assert_eq!(key_action("a"), None);
    }
}
