use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::js_sys::Array;
use web_sys::{
    Document, Element, HtmlElement, HtmlFormElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, NodeList,
};

use crate::error::EnhanceError;

pub const NAV: &str = ".nav";
pub const HERO_SECTION: &str = ".hero";
pub const HERO_HEADLINE: &str = ".hero-headline";
pub const HERO_SUBHEADLINE: &str = ".hero-subheadline";
pub const HERO_ACTIONS: &str = ".hero-actions";
pub const HERO_PHOTO: &str = ".hero-photo";
pub const FAQ_ITEM: &str = ".faq-item";
pub const FADE_IN: &str = ".fade-in";
pub const FORM_ID: &str = "auditForm";
pub const BUTTON: &str = ".btn";
pub const CARD_GROUPS: [&str; 3] = [".problem-card", ".benefit-card", ".step-card"];
pub const STATS_CONTAINER: &str = ".urgency-stats";
pub const IN_PAGE_ANCHOR: &str = "a[href^=\"#\"]";
pub const LAZY_IMAGE: &str = "img[data-src], img[data-srcset]";
pub const FOCUSABLE: &str =
    "button, [href], input, select, textarea, [tabindex]:not([tabindex=\"-1\"])";

/// Collects a `NodeList` into typed handles, skipping nodes of another type.
pub fn collect<T: JsCast>(list: NodeList) -> Vec<T> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<T>().ok())
        .collect()
}

pub fn query<T: JsCast>(document: &Document, selector: &str) -> Option<T> {
    document
        .query_selector(selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<T>().ok())
}

pub fn query_all<T: JsCast>(document: &Document, selector: &str) -> Vec<T> {
    document
        .query_selector_all(selector)
        .map(collect)
        .unwrap_or_default()
}

pub fn query_in<T: JsCast>(root: &Element, selector: &str) -> Option<T> {
    root.query_selector(selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<T>().ok())
}

pub fn query_all_in<T: JsCast>(root: &Element, selector: &str) -> Vec<T> {
    root.query_selector_all(selector)
        .map(collect)
        .unwrap_or_default()
}

pub fn set_style(el: &HtmlElement, property: &str, value: &str) {
    let _ = el.style().set_property(property, value);
}

pub fn set_styles(el: &HtmlElement, properties: &[(&str, &str)]) {
    let style = el.style();
    for (property, value) in properties {
        let _ = style.set_property(property, value);
    }
}

pub fn clear_style(el: &HtmlElement, property: &str) {
    let _ = el.style().remove_property(property);
}

/// Page nodes resolved once at start-up. Stale if the markup changes afterwards.
#[derive(Clone, Default)]
pub struct ElementCache {
    pub nav: Option<HtmlElement>,
    pub hero_section: Option<HtmlElement>,
    pub hero_headline: Option<HtmlElement>,
    pub hero_subheadline: Option<HtmlElement>,
    pub hero_actions: Option<HtmlElement>,
    pub hero_photo: Option<HtmlElement>,
    pub faq_items: Vec<HtmlElement>,
    pub fade_elements: Vec<HtmlElement>,
    pub form: Option<HtmlFormElement>,
    pub buttons: Vec<HtmlElement>,
    pub cards: Vec<HtmlElement>,
    pub stats_container: Option<HtmlElement>,
    pub anchors: Vec<HtmlElement>,
    pub lazy_images: Vec<HtmlElement>,
    pub focusable: Vec<HtmlElement>,
}

impl ElementCache {
    pub fn resolve(document: &Document) -> Self {
        let cache = Self {
            nav: query(document, NAV),
            hero_section: query(document, HERO_SECTION),
            hero_headline: query(document, HERO_HEADLINE),
            hero_subheadline: query(document, HERO_SUBHEADLINE),
            hero_actions: query(document, HERO_ACTIONS),
            hero_photo: query(document, HERO_PHOTO),
            faq_items: query_all(document, FAQ_ITEM),
            fade_elements: query_all(document, FADE_IN),
            form: document
                .get_element_by_id(FORM_ID)
                .and_then(|el| el.dyn_into::<HtmlFormElement>().ok()),
            buttons: query_all(document, BUTTON),
            cards: CARD_GROUPS
                .iter()
                .flat_map(|selector| query_all::<HtmlElement>(document, selector))
                .collect(),
            stats_container: query(document, STATS_CONTAINER),
            anchors: query_all(document, IN_PAGE_ANCHOR),
            lazy_images: query_all(document, LAZY_IMAGE),
            focusable: query_all(document, FOCUSABLE),
        };
        log::debug!(
            "Cached {} faq items, {} fade elements, {} buttons, {} cards",
            cache.faq_items.len(),
            cache.fade_elements.len(),
            cache.buttons.len(),
            cache.cards.len()
        );
        cache
    }
}

pub fn supports_intersection_observer(window: &web_sys::Window) -> bool {
    web_sys::js_sys::Reflect::has(window, &JsValue::from_str("IntersectionObserver")).unwrap_or(false)
}

/// An `IntersectionObserver` together with the closure it calls. Dropping it disconnects.
pub struct Observer {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(Array, IntersectionObserver)>,
}

impl Observer {
    pub fn new<F>(threshold: f64, root_margin: &str, mut on_entry: F) -> Result<Self, EnhanceError>
    where
        F: FnMut(IntersectionObserverEntry, &IntersectionObserver) + 'static,
    {
        let callback = Closure::wrap(Box::new(move |entries: Array, observer: IntersectionObserver| {
            for entry in entries.iter() {
                if let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() {
                    on_entry(entry, &observer);
                }
            }
        }) as Box<dyn FnMut(Array, IntersectionObserver)>);

        let options = IntersectionObserverInit::new();
        options.set_threshold(&JsValue::from_f64(threshold));
        options.set_root_margin(root_margin);
        let observer = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)?;

        Ok(Self {
            observer,
            _callback: callback,
        })
    }

    pub fn observe(&self, target: &Element) {
        self.observer.observe(target);
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
