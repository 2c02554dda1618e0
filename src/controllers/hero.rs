use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_events::EventListener;
use gloo_render::{request_animation_frame, AnimationFrame};
use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, MouseEvent};

use crate::context::PageContext;
use crate::controller::Controller;
use crate::dom::{set_style, set_styles};
use crate::error::EnhanceError;
use crate::motion::{is_in_viewport, lerp, Bounds, Throttle, EASE_OUT_EXPO};

/// Growth of the hero photo per scrolled pixel.
const PARALLAX_ZOOM: f64 = 0.0002;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parallax {
    pub translate_y: f64,
    pub scale: f64,
}

impl Default for Parallax {
    fn default() -> Self {
        Self { translate_y: 0.0, scale: 1.0 }
    }
}

impl Parallax {
    /// Offset for the current scroll position, or `None` once the hero has scrolled out.
    pub fn at(scrolled: f64, viewport_height: f64, speed: f64) -> Option<Self> {
        if scrolled >= viewport_height {
            return None;
        }
        Some(Self {
            translate_y: scrolled * speed,
            scale: 1.0 + scrolled * PARALLAX_ZOOM,
        })
    }
}

/// Inertial pointer follow: the current offset eases toward the last pointer target every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerFollow {
    target: (f64, f64),
    current: (f64, f64),
    smoothing: f64,
    magnitude: f64,
}

impl PointerFollow {
    pub fn new(smoothing: f64, magnitude: f64) -> Self {
        Self {
            target: (0.0, 0.0),
            current: (0.0, 0.0),
            smoothing,
            magnitude,
        }
    }

    /// Sets the raw target from a pointer offset normalized to the section size.
    pub fn aim(&mut self, normalized_x: f64, normalized_y: f64) {
        self.target = (normalized_x * self.magnitude, normalized_y * self.magnitude);
    }

    pub fn tick(&mut self) -> (f64, f64) {
        self.current = (
            lerp(self.current.0, self.target.0, self.smoothing),
            lerp(self.current.1, self.target.1, self.smoothing),
        );
        self.current
    }

    pub fn current(&self) -> (f64, f64) {
        self.current
    }
}

pub fn photo_transform(parallax: Parallax, follow: (f64, f64)) -> String {
    format!(
        "translateY({}px) scale({}) translate({}px, {}px)",
        parallax.translate_y, parallax.scale, follow.0, follow.1
    )
}

pub fn headline_transform(follow: (f64, f64)) -> String {
    format!("translate({}px, {}px)", follow.0 * 0.5, follow.1 * 0.5)
}

struct HeroMotion {
    ctx: Rc<PageContext>,
    section: Option<HtmlElement>,
    photo: HtmlElement,
    headline: HtmlElement,
    parallax: Cell<Parallax>,
    follow: RefCell<PointerFollow>,
    // Pointer follow only writes transforms once the pointer has moved over the section,
    // so it doesn't cut the entrance animation short.
    engaged: Cell<bool>,
    scroll_frame: RefCell<Option<AnimationFrame>>,
    follow_frame: RefCell<Option<AnimationFrame>>,
}

impl HeroMotion {
    fn on_scroll(self: &Rc<Self>) {
        if self.scroll_frame.borrow().is_some() {
            return;
        }
        let hero = self.clone();
        let handle = request_animation_frame(move |_| {
            hero.scroll_frame.borrow_mut().take();
            hero.apply_parallax();
        });
        *self.scroll_frame.borrow_mut() = Some(handle);
    }

    fn apply_parallax(&self) {
        let scrolled = self.ctx.scroll_y();
        let viewport_height = self.ctx.viewport().height;
        if let Some(parallax) = Parallax::at(scrolled, viewport_height, self.ctx.config.parallax_speed) {
            self.parallax.set(parallax);
            set_style(
                &self.photo,
                "transform",
                &photo_transform(parallax, self.follow.borrow().current()),
            );
        }
    }

    fn on_pointer(&self, event: &MouseEvent) {
        let Some(section) = &self.section else { return };
        let (x, y) = Bounds::of(section).normalized_offset(event.client_x() as f64, event.client_y() as f64);
        self.follow.borrow_mut().aim(x, y);
        self.engaged.set(true);
    }

    fn animate(self: &Rc<Self>) {
        let hero = self.clone();
        let handle = request_animation_frame(move |_| {
            hero.follow_tick();
            hero.animate();
        });
        *self.follow_frame.borrow_mut() = Some(handle);
    }

    fn follow_tick(&self) {
        let follow = self.follow.borrow_mut().tick();
        if !self.engaged.get() {
            return;
        }
        let on_screen = self
            .section
            .as_ref()
            .map(|section| is_in_viewport(section, self.ctx.viewport().height, 0.01))
            .unwrap_or(true);
        if !on_screen {
            return;
        }
        set_style(&self.photo, "transform", &photo_transform(self.parallax.get(), follow));
        set_style(&self.headline, "transform", &headline_transform(follow));
    }

    fn cancel_frames(&self) {
        self.scroll_frame.borrow_mut().take();
        self.follow_frame.borrow_mut().take();
    }
}

pub struct HeroMotionController {
    ctx: Rc<PageContext>,
    motion: Option<Rc<HeroMotion>>,
    listeners: Vec<EventListener>,
    entrance: Vec<Timeout>,
}

impl HeroMotionController {
    pub fn new(ctx: Rc<PageContext>) -> Self {
        Self {
            ctx,
            motion: None,
            listeners: Vec::new(),
            entrance: Vec::new(),
        }
    }

    fn animate_entrance(&mut self) {
        let elements = &self.ctx.elements;
        let timeline = [
            elements.hero_headline.clone(),
            elements.hero_subheadline.clone(),
            elements.hero_actions.clone(),
            elements.hero_photo.clone(),
        ];

        for (element, delay) in timeline.into_iter().zip(self.ctx.config.entrance_delays_ms.iter().copied()) {
            let Some(element) = element else { continue };
            set_styles(&element, &[("opacity", "0"), ("transform", "translateY(40px)")]);
            self.entrance.push(Timeout::new(delay, move || {
                set_styles(
                    &element,
                    &[
                        ("transition", &format!("opacity 0.8s {0}, transform 0.8s {0}", EASE_OUT_EXPO)),
                        ("opacity", "1"),
                        ("transform", "translateY(0)"),
                    ],
                );
            }));
        }
    }
}

impl Controller for HeroMotionController {
    fn name(&self) -> &'static str {
        "hero"
    }

    fn start(&mut self) -> Result<(), EnhanceError> {
        if self.motion.is_some() {
            return Ok(());
        }
        let elements = &self.ctx.elements;
        let (Some(photo), Some(headline)) = (elements.hero_photo.clone(), elements.hero_headline.clone()) else {
            log::debug!("Hero photo or headline missing, skipping hero motion");
            return Ok(());
        };

        let motion = Rc::new(HeroMotion {
            ctx: self.ctx.clone(),
            section: elements.hero_section.clone(),
            photo,
            headline,
            parallax: Cell::new(Parallax::default()),
            follow: RefCell::new(PointerFollow::new(
                self.ctx.config.follow_smoothing,
                self.ctx.config.follow_magnitude,
            )),
            engaged: Cell::new(false),
            scroll_frame: RefCell::new(None),
            follow_frame: RefCell::new(None),
        });

        let on_scroll = motion.clone();
        self.listeners.push(EventListener::new(&self.ctx.window, "scroll", move |_| {
            on_scroll.on_scroll();
        }));

        if let Some(section) = &motion.section {
            let on_pointer = motion.clone();
            let throttle = Throttle::new(self.ctx.config.pointer_throttle_ms);
            self.listeners.push(EventListener::new(section, "mousemove", move |event| {
                if !throttle.ready() {
                    return;
                }
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    on_pointer.on_pointer(event);
                }
            }));
            motion.animate();
        }

        self.animate_entrance();
        self.motion = Some(motion);
        Ok(())
    }

    fn stop(&mut self) {
        self.listeners.clear();
        self.entrance.clear();
        if let Some(motion) = self.motion.take() {
            motion.cancel_frames();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallax_within_first_viewport() {
        let parallax = Parallax::at(400.0, 900.0, 0.5).unwrap();
        assert_eq!(parallax.translate_y, 200.0);
        assert!((parallax.scale - 1.08).abs() < 1e-9);
        assert_eq!(Parallax::at(0.0, 900.0, 0.5), Some(Parallax::default()));
    }

    #[test]
    fn parallax_stops_after_one_viewport() {
        assert_eq!(Parallax::at(900.0, 900.0, 0.5), None);
        assert_eq!(Parallax::at(1500.0, 900.0, 0.5), None);
    }

    #[test]
    fn follow_eases_toward_target() {
        let mut follow = PointerFollow::new(0.1, 10.0);
        follow.aim(0.5, -0.5);
        let first = follow.tick();
        assert!((first.0 - 0.5).abs() < 1e-9);
        assert!((first.1 + 0.5).abs() < 1e-9);

        let mut last = first;
        for _ in 0..200 {
            let next = follow.tick();
            assert!(next.0 >= last.0 - 1e-12 && next.0 <= 5.0 + 1e-12);
            last = next;
        }
        assert!((last.0 - 5.0).abs() < 1e-6);
        assert!((last.1 + 5.0).abs() < 1e-6);
    }

    #[test]
    fn follow_keeps_its_offset_without_new_input() {
        let mut follow = PointerFollow::new(0.1, 10.0);
        follow.aim(0.2, 0.0);
        for _ in 0..10 {
            follow.tick();
        }
        let before = follow.current();
        follow.aim(0.2, 0.0);
        assert_eq!(follow.current(), before);
    }

    #[test]
    fn headline_moves_half_as_far_as_the_photo() {
        assert_eq!(headline_transform((4.0, -2.0)), "translate(2px, -1px)");
        assert_eq!(
            photo_transform(Parallax { translate_y: 10.0, scale: 1.5 }, (4.0, -2.0)),
            "translateY(10px) scale(1.5) translate(4px, -2px)"
        );
    }
}
