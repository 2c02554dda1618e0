use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_events::EventListener;
use gloo_render::{request_animation_frame, AnimationFrame};
use gloo_timers::callback::Timeout;
use once_cell::sync::Lazy;
use regex::Regex;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

use crate::context::PageContext;
use crate::controller::Controller;
use crate::dom::{query_all_in, query_in, set_style, set_styles, supports_intersection_observer, Observer};
use crate::error::EnhanceError;
use crate::motion::{clamp, ease_out_cubic, EASE_OUT_CUBIC, EASE_OUT_EXPO, SPRING};

pub const VISIBLE_CLASS: &str = "visible";
const FADE_THRESHOLD: f64 = 0.1;
const FADE_ROOT_MARGIN: &str = "0px 0px -100px 0px";
const COUNTER_THRESHOLD: f64 = 0.5;
const COUNTER_NUMBER: &str = ".urgency-number";
const CARD_ICON: &str = ".icon-problem, .icon-benefit";

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit pattern"));

/// Text of a counter split around its first run of digits, e.g. `"500+ patients"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterText {
    prefix: String,
    target: u64,
    suffix: String,
}

impl CounterText {
    pub fn parse(text: &str) -> Option<Self> {
        let digits = DIGITS.find(text)?;
        let target = digits.as_str().parse().ok()?;
        Some(Self {
            prefix: text[..digits.start()].to_string(),
            target,
            suffix: text[digits.end()..].to_string(),
        })
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    /// Value shown at `progress` (0..=1) of the animation, eased out.
    pub fn value_at(&self, progress: f64) -> u64 {
        let eased = ease_out_cubic(clamp(progress, 0.0, 1.0));
        (self.target as f64 * eased).floor() as u64
    }

    pub fn render(&self, value: u64) -> String {
        format!("{}{}{}", self.prefix, value, self.suffix)
    }
}

struct CounterAnimation {
    element: HtmlElement,
    text: CounterText,
    duration_ms: f64,
    started_at: Cell<Option<f64>>,
    frame: RefCell<Option<AnimationFrame>>,
}

impl CounterAnimation {
    fn schedule(self: &Rc<Self>) {
        let animation = self.clone();
        let handle = request_animation_frame(move |timestamp| animation.step(timestamp));
        *self.frame.borrow_mut() = Some(handle);
    }

    fn step(self: &Rc<Self>, timestamp: f64) {
        let started_at = match self.started_at.get() {
            Some(start) => start,
            None => {
                self.started_at.set(Some(timestamp));
                timestamp
            }
        };
        let progress = clamp((timestamp - started_at) / self.duration_ms, 0.0, 1.0);
        let value = self.text.value_at(progress);
        self.element.set_text_content(Some(self.text.render(value).as_str()));

        if progress < 1.0 {
            self.schedule();
        } else {
            self.frame.borrow_mut().take();
        }
    }

    fn cancel(&self) {
        self.frame.borrow_mut().take();
    }
}

#[derive(Default)]
struct Counters {
    animated: RefCell<Vec<Element>>,
    stagger: RefCell<Vec<Timeout>>,
    running: RefCell<Vec<Rc<CounterAnimation>>>,
}

impl Counters {
    fn trigger(self: &Rc<Self>, container: Element, duration_ms: f64, stagger_ms: u32) {
        if self.animated.borrow().contains(&container) {
            return;
        }
        let numbers: Vec<HtmlElement> = query_all_in(&container, COUNTER_NUMBER);
        self.animated.borrow_mut().push(container);
        log::debug!("Animating {} counters", numbers.len());

        for (index, number) in numbers.into_iter().enumerate() {
            let Some(text) = number.text_content().and_then(|t| CounterText::parse(&t)) else {
                continue;
            };
            let counters = Rc::downgrade(self);
            let timeout = Timeout::new(index as u32 * stagger_ms, move || {
                let Some(counters) = counters.upgrade() else { return };
                let animation = Rc::new(CounterAnimation {
                    element: number,
                    text,
                    duration_ms,
                    started_at: Cell::new(None),
                    frame: RefCell::new(None),
                });
                animation.schedule();
                counters.running.borrow_mut().push(animation);
            });
            self.stagger.borrow_mut().push(timeout);
        }
    }

    fn cancel(&self) {
        self.stagger.borrow_mut().clear();
        for animation in self.running.borrow_mut().drain(..) {
            animation.cancel();
        }
    }
}

pub fn reveal(element: &HtmlElement) {
    set_styles(
        element,
        &[
            (
                "transition",
                &format!("opacity 0.8s {0}, transform 0.8s {0}", EASE_OUT_EXPO),
            ),
            ("opacity", "1"),
            ("transform", "translateY(0)"),
        ],
    );
    let _ = element.class_list().add_1(VISIBLE_CLASS);
}

pub struct RevealController {
    ctx: Rc<PageContext>,
    observers: Vec<Observer>,
    listeners: Vec<EventListener>,
    counters: Rc<Counters>,
    started: bool,
}

impl RevealController {
    pub fn new(ctx: Rc<PageContext>) -> Self {
        Self {
            ctx,
            observers: Vec::new(),
            listeners: Vec::new(),
            counters: Rc::new(Counters::default()),
            started: false,
        }
    }

    fn setup_fade_ins(&mut self) -> Result<(), EnhanceError> {
        let elements = &self.ctx.elements.fade_elements;
        if elements.is_empty() {
            return Ok(());
        }
        if !supports_intersection_observer(&self.ctx.window) {
            log::warn!("IntersectionObserver unavailable, revealing all fade-in elements");
            elements.iter().for_each(reveal);
            return Ok(());
        }

        let observer = Observer::new(FADE_THRESHOLD, FADE_ROOT_MARGIN, |entry, observer| {
            if !entry.is_intersecting() {
                return;
            }
            let target = entry.target();
            if let Some(element) = target.dyn_ref::<HtmlElement>() {
                reveal(element);
            }
            // Revealed elements stay revealed.
            observer.unobserve(&target);
        })?;
        for element in elements {
            observer.observe(element);
        }
        self.observers.push(observer);
        Ok(())
    }

    fn setup_card_hover(&mut self) {
        for card in &self.ctx.elements.cards {
            let icon: Option<HtmlElement> = query_in(card, CARD_ICON);

            let (lift, lifted_icon) = (card.clone(), icon.clone());
            self.listeners.push(EventListener::new(card, "mouseenter", move |_| {
                set_styles(
                    &lift,
                    &[
                        ("transition", &format!("transform 0.3s {}, box-shadow 0.3s ease", EASE_OUT_CUBIC)),
                        ("transform", "translateY(-8px)"),
                    ],
                );
                if let Some(icon) = &lifted_icon {
                    set_styles(
                        icon,
                        &[
                            ("transition", &format!("transform 0.3s {}", SPRING)),
                            ("transform", "scale(1.1) rotate(2deg)"),
                        ],
                    );
                }
            }));

            let (settle, settled_icon) = (card.clone(), icon);
            self.listeners.push(EventListener::new(card, "mouseleave", move |_| {
                set_style(&settle, "transform", "translateY(0)");
                if let Some(icon) = &settled_icon {
                    set_style(icon, "transform", "scale(1) rotate(0deg)");
                }
            }));
        }
    }

    fn setup_counters(&mut self) -> Result<(), EnhanceError> {
        let Some(container) = self.ctx.elements.stats_container.clone() else {
            return Ok(());
        };
        let counters = self.counters.clone();
        let duration_ms = self.ctx.config.counter_duration_ms;
        let stagger_ms = self.ctx.config.counter_stagger_ms;

        if !supports_intersection_observer(&self.ctx.window) {
            counters.trigger(container.into(), duration_ms, stagger_ms);
            return Ok(());
        }

        let observer = Observer::new(COUNTER_THRESHOLD, "0px", move |entry, _| {
            if entry.is_intersecting() {
                counters.trigger(entry.target(), duration_ms, stagger_ms);
            }
        })?;
        observer.observe(&container);
        self.observers.push(observer);
        Ok(())
    }
}

impl Controller for RevealController {
    fn name(&self) -> &'static str {
        "reveal"
    }

    fn start(&mut self) -> Result<(), EnhanceError> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        self.setup_fade_ins()?;
        self.setup_card_hover();
        self.setup_counters()
    }

    fn stop(&mut self) {
        self.observers.clear();
        self.listeners.clear();
        self.counters.cancel();
        self.started = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_number_with_suffix() {
        let text = CounterText::parse("500+ patients").unwrap();
        assert_eq!(text.target(), 500);
        assert_eq!(text.render(42), "42+ patients");
    }

    #[test]
    fn keeps_prefix_and_only_replaces_first_number() {
        let text = CounterText::parse("$25k in 12 months").unwrap();
        assert_eq!(text.target(), 25);
        assert_eq!(text.render(7), "$7k in 12 months");
    }

    #[test]
    fn text_without_digits_is_not_a_counter() {
        assert!(CounterText::parse("many patients").is_none());
    }

    #[test]
    fn frames_are_monotonic_and_end_on_target() {
        let text = CounterText::parse("500+ patients").unwrap();
        let frames: Vec<u64> = (0..=90).map(|i| text.value_at(i as f64 / 90.0)).collect();

        assert_eq!(frames[0], 0);
        assert!(frames.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(*frames.last().unwrap(), 500);
        assert_eq!(text.render(*frames.last().unwrap()), "500+ patients");
    }

    #[test]
    fn progress_past_the_end_is_clamped() {
        let text = CounterText::parse("98%").unwrap();
        assert_eq!(text.value_at(1.7), 98);
        assert_eq!(text.value_at(-0.2), 0);
    }
}
