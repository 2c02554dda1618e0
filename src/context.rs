use std::cell::Cell;
use std::rc::Rc;

use gloo_events::EventListener;
use web_sys::{Document, Window};

use crate::config::LandingConfig;
use crate::dom::ElementCache;
use crate::error::EnhanceError;
use crate::motion::Debounce;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn measure(window: &Window) -> Self {
        let read = |value: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
            value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
        };
        Self {
            width: read(window.inner_width()),
            height: read(window.inner_height()),
        }
    }
}

/// Shared, read-mostly state handed to every controller at construction.
pub struct PageContext {
    pub window: Window,
    pub document: Document,
    pub elements: ElementCache,
    pub config: LandingConfig,
    viewport: Rc<Cell<Viewport>>,
}

impl PageContext {
    pub fn new(window: Window, document: Document, config: LandingConfig) -> Self {
        let elements = ElementCache::resolve(&document);
        let viewport = Rc::new(Cell::new(Viewport::measure(&window)));
        Self {
            window,
            document,
            elements,
            config,
            viewport,
        }
    }

    pub fn from_window() -> Result<Self, EnhanceError> {
        let window = web_sys::window().ok_or(EnhanceError::NoWindow)?;
        let document = window.document().ok_or(EnhanceError::NoDocument)?;
        document.body().ok_or(EnhanceError::MissingElement("body"))?;
        let config = LandingConfig::from_document(&document);
        Ok(Self::new(window, document, config))
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    pub fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    /// Keeps the cached viewport in step with window resizes until the listener is dropped.
    pub fn track_viewport(&self) -> EventListener {
        let viewport = self.viewport.clone();
        let window = self.window.clone();
        let debounce = Debounce::new(self.config.resize_debounce_ms);
        EventListener::new(&self.window, "resize", move |_| {
            let viewport = viewport.clone();
            let window = window.clone();
            debounce.call(move || {
                let measured = Viewport::measure(&window);
                log::debug!("Viewport resized to {}x{}", measured.width, measured.height);
                viewport.set(measured);
            });
        })
    }
}
