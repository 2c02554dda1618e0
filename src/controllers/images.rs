use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::EventListener;
use wasm_bindgen::JsCast;
use web_sys::HtmlImageElement;

use crate::context::PageContext;
use crate::controller::Controller;
use crate::dom::{set_style, set_styles, supports_intersection_observer, Observer};
use crate::error::EnhanceError;
use crate::motion::EASE_OUT_CUBIC;

const LOADED_CLASS: &str = "loaded";
const LAZY_ROOT_MARGIN: &str = "50px 0px";

/// Where a deferred image's real sources live until it is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeferredSource {
    pub src: Option<String>,
    pub srcset: Option<String>,
}

impl DeferredSource {
    pub fn read(img: &HtmlImageElement) -> Self {
        let dataset = img.dataset();
        Self {
            src: dataset.get("src").filter(|s| !s.is_empty()),
            srcset: dataset.get("srcset").filter(|s| !s.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_none() && self.srcset.is_none()
    }
}

/// Load listeners for images whose `src` has been swapped in, kept until they settle.
type PendingLoads = Rc<RefCell<Vec<EventListener>>>;

fn load_image(img: &HtmlImageElement, pending: &PendingLoads) {
    let source = DeferredSource::read(img);
    if source.is_empty() {
        return;
    }
    set_styles(
        img,
        &[("opacity", "0"), ("transition", &format!("opacity 0.5s {}", EASE_OUT_CUBIC))],
    );

    if let Some(src) = source.src {
        let loaded = img.clone();
        let on_load = EventListener::once(img, "load", move |_| {
            set_style(&loaded, "opacity", "1");
            let _ = loaded.class_list().add_1(LOADED_CLASS);
        });
        let failed = img.clone();
        let failed_src = src.clone();
        let on_error = EventListener::once(img, "error", move |_| {
            set_style(&failed, "opacity", "0.5");
            log::warn!("Image failed to load: {}", failed_src);
        });
        pending.borrow_mut().extend([on_load, on_error]);

        img.set_src(&src);
        img.dataset().delete("src");
    }

    if let Some(srcset) = source.srcset {
        img.set_srcset(&srcset);
        img.dataset().delete("srcset");
    }
}

pub struct ImageController {
    ctx: Rc<PageContext>,
    observer: Option<Observer>,
    listeners: Vec<EventListener>,
    pending: PendingLoads,
}

impl ImageController {
    pub fn new(ctx: Rc<PageContext>) -> Self {
        Self {
            ctx,
            observer: None,
            listeners: Vec::new(),
            pending: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn setup_lazy_loading(&mut self) -> Result<(), EnhanceError> {
        let images: Vec<HtmlImageElement> = self
            .ctx
            .elements
            .lazy_images
            .iter()
            .filter_map(|el| el.dyn_ref::<HtmlImageElement>().cloned())
            .collect();
        if images.is_empty() {
            return Ok(());
        }

        if !supports_intersection_observer(&self.ctx.window) {
            images.iter().for_each(|img| load_image(img, &self.pending));
            return Ok(());
        }

        let pending = self.pending.clone();
        let observer = Observer::new(0.0, LAZY_ROOT_MARGIN, move |entry, observer| {
            if !entry.is_intersecting() {
                return;
            }
            let target = entry.target();
            if let Some(img) = target.dyn_ref::<HtmlImageElement>() {
                load_image(img, &pending);
            }
            observer.unobserve(&target);
        })?;
        for img in &images {
            observer.observe(img);
        }
        log::debug!("Deferring {} images", images.len());
        self.observer = Some(observer);
        Ok(())
    }

    fn setup_hover_zoom(&mut self) {
        let Some(photo) = self.ctx.elements.hero_photo.clone() else { return };

        // The individual `scale` property composes with the parallax transform.
        let zoom_in = photo.clone();
        self.listeners.push(EventListener::new(&photo, "mouseenter", move |_| {
            set_styles(
                &zoom_in,
                &[("transition", &format!("transform 0.5s {0}, scale 0.5s {0}", EASE_OUT_CUBIC)), ("scale", "1.05")],
            );
        }));
        let zoom_out = photo.clone();
        self.listeners.push(EventListener::new(&photo, "mouseleave", move |_| {
            set_style(&zoom_out, "scale", "1");
        }));
    }
}

impl Controller for ImageController {
    fn name(&self) -> &'static str {
        "images"
    }

    fn start(&mut self) -> Result<(), EnhanceError> {
        if self.observer.is_some() || !self.listeners.is_empty() {
            return Ok(());
        }
        self.setup_hover_zoom();
        self.setup_lazy_loading()
    }

    fn stop(&mut self) {
        self.observer = None;
        self.listeners.clear();
        self.pending.borrow_mut().clear();
    }
}
