use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions};
use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use web_sys::{FocusOptions, HtmlElement, KeyboardEvent};

use crate::context::PageContext;
use crate::controller::Controller;
use crate::dom::{query_in, set_style, set_styles};
use crate::error::EnhanceError;
use crate::motion::{EASE_IN_OUT_QUART, EASE_OUT_CUBIC};

pub const OPEN_CLASS: &str = "open";
pub const QUESTION: &str = ".faq-question";
pub const ANSWER: &str = ".faq-answer";
pub const ICON: &str = ".faq-icon";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelChange {
    Open(usize),
    Close(usize),
}

/// Single-open accordion bookkeeping over `len` panels.
#[derive(Debug, Clone, Default)]
pub struct AccordionState {
    len: usize,
    active: Option<usize>,
}

impl AccordionState {
    pub fn new(len: usize) -> Self {
        Self { len, active: None }
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.active == Some(index)
    }

    /// Closes every panel but `target`, then flips `target`.
    ///
    /// The returned changes are applied in order; closing an already closed
    /// panel is harmless so every other panel is always listed.
    pub fn toggle(&mut self, target: usize) -> Vec<PanelChange> {
        if target >= self.len {
            return Vec::new();
        }
        let was_active = self.active == Some(target);
        let mut changes: Vec<PanelChange> = (0..self.len)
            .filter(|&i| i != target || was_active)
            .map(PanelChange::Close)
            .collect();

        if was_active {
            self.active = None;
        } else {
            changes.push(PanelChange::Open(target));
            self.active = Some(target);
        }
        changes
    }
}

struct Panel {
    item: HtmlElement,
    question: HtmlElement,
    answer: HtmlElement,
    icon: HtmlElement,
}

struct Accordion {
    panels: Vec<Panel>,
    state: RefCell<AccordionState>,
    focus_timer: RefCell<Option<Timeout>>,
    focus_delay_ms: u32,
}

impl Accordion {
    fn toggle(&self, index: usize) {
        let changes = self.state.borrow_mut().toggle(index);
        // A pending focus move belongs to the previous open panel.
        self.focus_timer.borrow_mut().take();
        for change in changes {
            match change {
                PanelChange::Open(i) => self.open(i),
                PanelChange::Close(i) => self.close(i),
            }
        }
    }

    fn open(&self, index: usize) {
        let Some(panel) = self.panels.get(index) else { return };
        let _ = panel.question.set_attribute("aria-expanded", "true");

        let height = panel.answer.scroll_height();
        set_styles(
            &panel.answer,
            &[("max-height", &format!("{}px", height)), ("opacity", "1")],
        );
        set_styles(
            &panel.icon,
            &[
                ("transition", &format!("transform 0.3s {}", EASE_IN_OUT_QUART)),
                ("transform", "rotate(45deg)"),
            ],
        );
        let _ = panel.item.class_list().add_1(OPEN_CLASS);

        let answer = panel.answer.clone();
        let timeout = Timeout::new(self.focus_delay_ms, move || {
            let _ = answer.set_attribute("tabindex", "-1");
            let options = FocusOptions::new();
            options.set_prevent_scroll(true);
            let _ = answer.focus_with_options(&options);
        });
        *self.focus_timer.borrow_mut() = Some(timeout);
        log::debug!("Opened accordion panel {}", index + 1);
    }

    fn close(&self, index: usize) {
        let Some(panel) = self.panels.get(index) else { return };
        let _ = panel.question.set_attribute("aria-expanded", "false");
        set_styles(&panel.answer, &[("max-height", "0"), ("opacity", "0")]);
        set_style(&panel.icon, "transform", "rotate(0deg)");
        let _ = panel.item.class_list().remove_1(OPEN_CLASS);
        let _ = panel.answer.remove_attribute("tabindex");
    }

    fn hover(&self, index: usize, entering: bool) {
        let Some(panel) = self.panels.get(index) else { return };
        if self.state.borrow().is_open(index) {
            return;
        }
        if entering {
            set_styles(
                &panel.item,
                &[
                    (
                        "transition",
                        &format!("transform 0.2s {}, box-shadow 0.2s ease", EASE_OUT_CUBIC),
                    ),
                    ("transform", "translateY(-2px)"),
                    ("box-shadow", "var(--shadow-lg)"),
                ],
            );
        } else {
            set_styles(
                &panel.item,
                &[("transform", "translateY(0)"), ("box-shadow", "var(--shadow-sm)")],
            );
        }
    }
}

pub struct AccordionController {
    ctx: Rc<PageContext>,
    accordion: Option<Rc<Accordion>>,
    listeners: Vec<EventListener>,
}

impl AccordionController {
    pub fn new(ctx: Rc<PageContext>) -> Self {
        Self {
            ctx,
            accordion: None,
            listeners: Vec::new(),
        }
    }

    /// Index of the open panel, if any.
    pub fn active(&self) -> Option<usize> {
        self.accordion
            .as_ref()
            .and_then(|accordion| accordion.state.borrow().active())
    }

    pub fn toggle(&self, index: usize) {
        if let Some(accordion) = &self.accordion {
            accordion.toggle(index);
        }
    }

    fn prepare_panels(&self) -> Vec<Panel> {
        let mut panels = Vec::new();
        for (index, item) in self.ctx.elements.faq_items.iter().enumerate() {
            let question: Option<HtmlElement> = query_in(item, QUESTION);
            let answer: Option<HtmlElement> = query_in(item, ANSWER);
            let icon: Option<HtmlElement> = question.as_ref().and_then(|q| query_in(q, ICON));
            let (Some(question), Some(answer), Some(icon)) = (question, answer, icon) else {
                log::warn!("Accordion item {} is missing its question, answer or icon", index + 1);
                continue;
            };

            let answer_id = format!("faq-answer-{}", index + 1);
            answer.set_id(&answer_id);
            let _ = answer.set_attribute("role", "region");
            let _ = question.set_attribute("aria-controls", &answer_id);
            let _ = question.set_attribute("aria-expanded", "false");
            set_styles(
                &answer,
                &[
                    ("max-height", "0"),
                    ("overflow", "hidden"),
                    (
                        "transition",
                        &format!("max-height 0.4s {}, opacity 0.3s ease", EASE_IN_OUT_QUART),
                    ),
                ],
            );

            panels.push(Panel {
                item: item.clone(),
                question,
                answer,
                icon,
            });
        }
        panels
    }
}

impl Controller for AccordionController {
    fn name(&self) -> &'static str {
        "accordion"
    }

    fn start(&mut self) -> Result<(), EnhanceError> {
        if self.accordion.is_some() {
            return Ok(());
        }
        let panels = self.prepare_panels();
        if panels.is_empty() {
            log::debug!("No accordion panels on this page");
            return Ok(());
        }

        let accordion = Rc::new(Accordion {
            state: RefCell::new(AccordionState::new(panels.len())),
            panels,
            focus_timer: RefCell::new(None),
            focus_delay_ms: self.ctx.config.accordion_focus_ms,
        });

        for (index, panel) in accordion.panels.iter().enumerate() {
            let on_click = accordion.clone();
            self.listeners.push(EventListener::new(&panel.question, "click", move |_| {
                on_click.toggle(index);
            }));

            let on_key = accordion.clone();
            self.listeners.push(EventListener::new_with_options(
                &panel.question,
                "keydown",
                EventListenerOptions::enable_prevent_default(),
                move |event| {
                    let Some(event) = event.dyn_ref::<KeyboardEvent>() else { return };
                    if event.key() == "Enter" || event.key() == " " {
                        event.prevent_default();
                        on_key.toggle(index);
                    }
                },
            ));

            let on_enter = accordion.clone();
            self.listeners.push(EventListener::new(&panel.item, "mouseenter", move |_| {
                on_enter.hover(index, true);
            }));
            let on_leave = accordion.clone();
            self.listeners.push(EventListener::new(&panel.item, "mouseleave", move |_| {
                on_leave.hover(index, false);
            }));
        }

        log::info!("Accordion ready with {} panels", accordion.panels.len());
        self.accordion = Some(accordion);
        Ok(())
    }

    fn stop(&mut self) {
        self.listeners.clear();
        if let Some(accordion) = self.accordion.take() {
            accordion.focus_timer.borrow_mut().take();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_panels(state: &AccordionState, len: usize) -> Vec<usize> {
        (0..len).filter(|&i| state.is_open(i)).collect()
    }

    #[test]
    fn toggling_twice_returns_to_closed() {
        for target in 0..4 {
            let mut state = AccordionState::new(4);
            state.toggle(target);
            assert_eq!(open_panels(&state, 4), vec![target]);
            state.toggle(target);
            assert!(open_panels(&state, 4).is_empty());
            assert_eq!(state.active(), None);
        }
    }

    #[test]
    fn opening_another_panel_closes_the_current_one() {
        let mut state = AccordionState::new(3);
        state.toggle(0);
        let changes = state.toggle(2);
        assert_eq!(
            changes,
            vec![PanelChange::Close(0), PanelChange::Close(1), PanelChange::Open(2)]
        );
        assert_eq!(open_panels(&state, 3), vec![2]);
    }

    #[test]
    fn closing_the_open_panel_closes_everything() {
        let mut state = AccordionState::new(3);
        state.toggle(1);
        let changes = state.toggle(1);
        assert_eq!(
            changes,
            vec![PanelChange::Close(0), PanelChange::Close(1), PanelChange::Close(2)]
        );
    }

    #[test]
    fn at_most_one_panel_open_across_any_sequence() {
        let mut state = AccordionState::new(5);
        for target in [3, 1, 1, 4, 0, 0, 2, 2, 3] {
            state.toggle(target);
            assert!(open_panels(&state, 5).len() <= 1);
        }
    }

    #[test]
    fn out_of_range_target_is_ignored() {
        let mut state = AccordionState::new(2);
        state.toggle(0);
        assert!(state.toggle(7).is_empty());
        assert_eq!(state.active(), Some(0));
    }
}
