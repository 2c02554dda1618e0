use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions};
use web_sys::{Element, HtmlElement, ScrollBehavior, ScrollToOptions};

use crate::context::PageContext;
use crate::controller::Controller;
use crate::dom::{query, set_styles};
use crate::error::EnhanceError;
use crate::motion::{Throttle, EASE_OUT_CUBIC};

pub const VISIBLE_CLASS: &str = "visible";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTransition {
    Show,
    Hide,
}

/// Shows the bar while scrolling down past the threshold, hides it otherwise.
#[derive(Debug, Clone)]
pub struct NavState {
    visible: bool,
    last_scroll_y: f64,
    threshold: f64,
}

impl NavState {
    pub fn new(threshold: f64) -> Self {
        Self {
            visible: false,
            last_scroll_y: 0.0,
            threshold,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn on_scroll(&mut self, scroll_y: f64) -> Option<NavTransition> {
        let scrolling_down = scroll_y > self.last_scroll_y;
        let beyond_threshold = scroll_y > self.threshold;
        self.last_scroll_y = scroll_y;

        if beyond_threshold && scrolling_down && !self.visible {
            self.visible = true;
            Some(NavTransition::Show)
        } else if (!beyond_threshold || !scrolling_down) && self.visible {
            self.visible = false;
            Some(NavTransition::Hide)
        } else {
            None
        }
    }
}

/// Page offset an in-page anchor should scroll to so the fixed bar doesn't cover the target.
pub fn anchor_scroll_top(target_top: f64, page_y: f64, nav_height: f64, gutter: f64) -> f64 {
    (target_top + page_y - nav_height - gutter).max(0.0)
}

fn apply(nav: &HtmlElement, transition: NavTransition) {
    let (transform, opacity) = match transition {
        NavTransition::Show => ("translateY(0)", "1"),
        NavTransition::Hide => ("translateY(-100%)", "0"),
    };
    set_styles(
        nav,
        &[
            (
                "transition",
                &format!("transform 0.3s {}, opacity 0.3s ease", EASE_OUT_CUBIC),
            ),
            ("transform", transform),
            ("opacity", opacity),
        ],
    );
    let classes = nav.class_list();
    let _ = match transition {
        NavTransition::Show => classes.add_1(VISIBLE_CLASS),
        NavTransition::Hide => classes.remove_1(VISIBLE_CLASS),
    };
}

pub struct NavigationController {
    ctx: Rc<PageContext>,
    state: Rc<RefCell<NavState>>,
    listeners: Vec<EventListener>,
}

impl NavigationController {
    pub fn new(ctx: Rc<PageContext>) -> Self {
        let threshold = ctx.config.nav_threshold;
        Self {
            ctx,
            state: Rc::new(RefCell::new(NavState::new(threshold))),
            listeners: Vec::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.state.borrow().is_visible()
    }

    fn watch_scroll(&mut self, nav: HtmlElement) {
        let state = self.state.clone();
        let window = self.ctx.window.clone();
        let throttle = Throttle::new(self.ctx.config.scroll_throttle_ms);
        self.listeners.push(EventListener::new(&self.ctx.window, "scroll", move |_| {
            if !throttle.ready() {
                return;
            }
            let scroll_y = window.scroll_y().unwrap_or(0.0);
            let transition = state.borrow_mut().on_scroll(scroll_y);
            if let Some(transition) = transition {
                log::debug!("Navigation {:?} at {}px", transition, scroll_y);
                apply(&nav, transition);
            }
        }));
    }

    fn intercept_anchors(&mut self) {
        for anchor in &self.ctx.elements.anchors {
            let Some(href) = anchor.get_attribute("href") else { continue };
            if href == "#" {
                continue;
            }

            let ctx = self.ctx.clone();
            self.listeners.push(EventListener::new_with_options(
                anchor,
                "click",
                EventListenerOptions::enable_prevent_default(),
                move |event| {
                    let Some(target) = query::<Element>(&ctx.document, &href) else { return };
                    event.prevent_default();

                    let nav_height = ctx
                        .elements
                        .nav
                        .as_ref()
                        .map(|nav| nav.offset_height() as f64)
                        .unwrap_or(0.0);
                    let top = anchor_scroll_top(
                        target.get_bounding_client_rect().top(),
                        ctx.scroll_y(),
                        nav_height,
                        ctx.config.anchor_gutter,
                    );

                    let options = ScrollToOptions::new();
                    options.set_top(top);
                    options.set_behavior(ScrollBehavior::Smooth);
                    ctx.window.scroll_to_with_scroll_to_options(&options);
                },
            ));
        }
    }
}

impl Controller for NavigationController {
    fn name(&self) -> &'static str {
        "navigation"
    }

    fn start(&mut self) -> Result<(), EnhanceError> {
        if !self.listeners.is_empty() {
            return Ok(());
        }
        let Some(nav) = self.ctx.elements.nav.clone() else {
            log::debug!("No navigation bar on this page");
            return Ok(());
        };
        self.watch_scroll(nav);
        self.intercept_anchors();
        Ok(())
    }

    fn stop(&mut self) {
        self.listeners.clear();
    }
}
