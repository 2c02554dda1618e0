use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::EventListener;
use wasm_bindgen::prelude::*;
use web_sys::js_sys::Array;

use crate::context::PageContext;
use crate::controller::Controller;
use crate::controllers::{
    accessibility::AccessibilityController, accordion::AccordionController, buttons::ButtonEffectsController,
    diagnostics::DiagnosticsController, form::FormController, hero::HeroMotionController,
    images::ImageController, navigation::NavigationController, reveal::RevealController,
};
use crate::error::EnhanceError;

thread_local! {
    static APP: RefCell<Option<AppController>> = RefCell::new(None);
}

/// Owns every controller for the lifetime of the page.
pub struct AppController {
    ctx: Rc<PageContext>,
    hero: HeroMotionController,
    navigation: NavigationController,
    accordion: AccordionController,
    form: FormController,
    reveal: RevealController,
    buttons: ButtonEffectsController,
    images: ImageController,
    accessibility: AccessibilityController,
    diagnostics: DiagnosticsController,
    started: Vec<&'static str>,
    viewport: Option<EventListener>,
}

impl AppController {
    pub fn new(ctx: PageContext) -> Self {
        let ctx = Rc::new(ctx);
        Self {
            hero: HeroMotionController::new(ctx.clone()),
            navigation: NavigationController::new(ctx.clone()),
            accordion: AccordionController::new(ctx.clone()),
            form: FormController::new(ctx.clone()),
            reveal: RevealController::new(ctx.clone()),
            buttons: ButtonEffectsController::new(ctx.clone()),
            images: ImageController::new(ctx.clone()),
            accessibility: AccessibilityController::new(ctx.clone()),
            diagnostics: DiagnosticsController::new(ctx.clone()),
            ctx,
            started: Vec::new(),
            viewport: None,
        }
    }

    fn controllers_mut(&mut self) -> [&mut dyn Controller; 9] {
        [
            &mut self.hero,
            &mut self.navigation,
            &mut self.accordion,
            &mut self.form,
            &mut self.reveal,
            &mut self.buttons,
            &mut self.images,
            &mut self.accessibility,
            &mut self.diagnostics,
        ]
    }

    fn controllers(&self) -> [&dyn Controller; 9] {
        [
            &self.hero,
            &self.navigation,
            &self.accordion,
            &self.form,
            &self.reveal,
            &self.buttons,
            &self.images,
            &self.accessibility,
            &self.diagnostics,
        ]
    }

    /// Starts every controller. A failing controller is logged and skipped.
    pub fn start(&mut self) {
        if self.viewport.is_none() {
            self.viewport = Some(self.ctx.track_viewport());
        }
        let mut started = Vec::new();
        for controller in self.controllers_mut() {
            match controller.start() {
                Ok(()) => started.push(controller.name()),
                Err(e) => log::error!("Failed to start {} controller: {}", controller.name(), e),
            }
        }
        log::info!("Landing enhancements started: {}", started.join(", "));
        self.started = started;
    }

    pub fn destroy(&mut self) {
        for controller in self.controllers_mut() {
            controller.stop();
        }
        self.viewport = None;
        if !self.started.is_empty() {
            log::info!("Landing enhancements stopped");
        }
        self.started.clear();
    }

    pub fn started(&self) -> &[&'static str] {
        &self.started
    }

    pub fn controller(&self, name: &str) -> Option<&dyn Controller> {
        if !self.started.iter().any(|started| *started == name) {
            return None;
        }
        self.controllers().into_iter().find(|c| c.name() == name)
    }

    pub fn context(&self) -> &PageContext {
        &self.ctx
    }

    pub fn accordion(&self) -> &AccordionController {
        &self.accordion
    }

    pub fn form(&self) -> &FormController {
        &self.form
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    pub fn buttons(&self) -> &ButtonEffectsController {
        &self.buttons
    }

    pub fn accessibility(&self) -> &AccessibilityController {
        &self.accessibility
    }

    pub fn diagnostics(&self) -> &DiagnosticsController {
        &self.diagnostics
    }
}

fn launch() {
    let result = PageContext::from_window().map(|ctx| {
        let mut app = AppController::new(ctx);
        app.start();
        app
    });
    match result {
        Ok(app) => {
            APP.with(|slot| {
                if let Some(mut previous) = slot.borrow_mut().replace(app) {
                    previous.destroy();
                }
            });
        }
        Err(e) => log::error!("Error initializing landing enhancements: {}", e),
    }
}

/// Starts the app now, or once the document has finished parsing.
pub fn boot() -> Result<(), EnhanceError> {
    let window = web_sys::window().ok_or(EnhanceError::NoWindow)?;
    let document = window.document().ok_or(EnhanceError::NoDocument)?;
    if document.ready_state() == "loading" {
        EventListener::once(&document, "DOMContentLoaded", |_| launch()).forget();
    } else {
        launch();
    }
    Ok(())
}

/// Runs `f` against the running app, if any.
pub fn with_app<R>(f: impl FnOnce(&mut AppController) -> R) -> Option<R> {
    APP.with(|slot| slot.borrow_mut().as_mut().map(f))
}

#[wasm_bindgen(js_name = landingControllers)]
pub fn controller_names() -> Array {
    with_app(|app| app.started().iter().map(|name| JsValue::from_str(name)).collect())
        .unwrap_or_else(Array::new)
}

#[wasm_bindgen(js_name = landingHasController)]
pub fn has_controller(name: &str) -> bool {
    with_app(|app| app.controller(name).is_some()).unwrap_or(false)
}

#[wasm_bindgen(js_name = landingAnnounce)]
pub fn announce(message: &str) {
    with_app(|app| app.accessibility().announce(message));
}

/// Stops every controller and drops the app. Safe to call more than once.
#[wasm_bindgen(js_name = landingDestroy)]
pub fn destroy() {
    let app = APP.with(|slot| slot.borrow_mut().take());
    if let Some(mut app) = app {
        app.destroy();
    }
}
