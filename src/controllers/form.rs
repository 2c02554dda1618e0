use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use gloo_events::{EventListener, EventListenerOptions};
use gloo_timers::callback::Timeout;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlButtonElement, HtmlElement, HtmlFormElement, HtmlInputElement};

use crate::config::LandingConfig;
use crate::context::PageContext;
use crate::controller::Controller;
use crate::dom::{clear_style, query_in, set_style, set_styles};
use crate::error::EnhanceError;
use crate::motion::{Debounce, EASE_OUT_CUBIC};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));
static HTTP_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://.+").expect("valid url pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Email,
    HttpUrl,
}

impl Pattern {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Pattern::Email => EMAIL.is_match(value),
            Pattern::HttpUrl => HTTP_URL.is_match(value),
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Pattern::Email => "Please enter a valid email address",
            Pattern::HttpUrl => "Please enter a valid URL (https://...)",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("This field is required")]
    Required,
    #[error("Minimum {0} characters required")]
    TooShort(usize),
    #[error("{}", .0.message())]
    Pattern(Pattern),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub required: bool,
    pub min_length: Option<usize>,
    pub pattern: Option<Pattern>,
}

pub static FIELD_RULES: [FieldRule; 4] = [
    FieldRule { name: "name", required: true, min_length: Some(2), pattern: None },
    FieldRule { name: "practice", required: true, min_length: Some(2), pattern: None },
    FieldRule { name: "email", required: true, min_length: None, pattern: Some(Pattern::Email) },
    FieldRule { name: "website", required: false, min_length: None, pattern: Some(Pattern::HttpUrl) },
];

pub fn rule_for(name: &str) -> Option<&'static FieldRule> {
    FIELD_RULES.iter().find(|rule| rule.name == name)
}

impl FieldRule {
    /// Checks a raw field value. Rules apply in order (required, length, pattern) and the first failure wins.
    /// Length is measured in UTF-16 code units, as the browser reports it.
    pub fn check(&self, raw: &str) -> Result<(), FieldError> {
        let value = raw.trim();
        if value.is_empty() {
            return if self.required { Err(FieldError::Required) } else { Ok(()) };
        }
        if let Some(min) = self.min_length {
            if value.encode_utf16().count() < min {
                return Err(FieldError::TooShort(min));
            }
        }
        if let Some(pattern) = self.pattern {
            if !pattern.matches(value) {
                return Err(FieldError::Pattern(pattern));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPhase {
    #[default]
    Idle,
    Loading,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitDecision {
    /// A submission is already in flight or being acknowledged.
    Ignored,
    /// Validation failed; the form stays idle.
    Rejected,
    Accepted,
}

/// Simulated submission lifecycle: idle -> loading -> success -> idle.
#[derive(Debug, Clone, Default)]
pub struct SubmitMachine {
    phase: SubmitPhase,
}

impl SubmitMachine {
    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    pub fn submit(&mut self, form_valid: bool) -> SubmitDecision {
        if self.phase != SubmitPhase::Idle {
            return SubmitDecision::Ignored;
        }
        if !form_valid {
            return SubmitDecision::Rejected;
        }
        self.phase = SubmitPhase::Loading;
        SubmitDecision::Accepted
    }

    pub fn finish_loading(&mut self) -> bool {
        if self.phase != SubmitPhase::Loading {
            return false;
        }
        self.phase = SubmitPhase::Success;
        true
    }

    pub fn finish_success(&mut self) -> bool {
        if self.phase != SubmitPhase::Success {
            return false;
        }
        self.phase = SubmitPhase::Idle;
        true
    }

    pub fn reset(&mut self) {
        self.phase = SubmitPhase::Idle;
    }
}

struct Field {
    rule: &'static FieldRule,
    input: HtmlInputElement,
    error: HtmlElement,
    label: Option<HtmlElement>,
    valid: Cell<bool>,
}

impl Field {
    fn validate(&self) -> bool {
        let result = self.rule.check(&self.input.value());
        let valid = result.is_ok();
        self.valid.set(valid);

        match result {
            Ok(()) => {
                set_style(&self.input, "border-color", "var(--accent-emerald)");
                self.error.set_text_content(Some(""));
                set_style(&self.error, "opacity", "0");
            }
            Err(e) => {
                set_style(&self.input, "border-color", "var(--accent-crimson)");
                self.error.set_text_content(Some(e.to_string().as_str()));
                set_styles(&self.error, &[("opacity", "1"), ("transition", "opacity 0.2s ease")]);
            }
        }
        valid
    }

    fn float_label(&self, document: &Document) {
        let Some(label) = &self.label else { return };
        let input: &web_sys::Node = self.input.as_ref();
        let focused = document
            .active_element()
            .map(|active| active.is_same_node(Some(input)))
            .unwrap_or(false);
        if !self.input.value().is_empty() || focused {
            set_styles(
                label,
                &[("transform", "translateY(-20px) scale(0.85)"), ("color", "var(--text-primary)")],
            );
        } else {
            reset_label(label);
        }
    }
}

fn reset_label(label: &HtmlElement) {
    set_styles(
        label,
        &[("transform", "translateY(0) scale(1)"), ("color", "var(--text-tertiary)")],
    );
}

struct Form {
    form: HtmlFormElement,
    document: Document,
    fields: Vec<Field>,
    submit: Option<HtmlButtonElement>,
    machine: RefCell<SubmitMachine>,
    timer: RefCell<Option<Timeout>>,
    original_label: RefCell<String>,
    config: LandingConfig,
}

impl Form {
    fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.rule.name == name)
    }

    fn handle_submit(self: &Rc<Self>) {
        let Some(button) = &self.submit else { return };
        if button.disabled() || self.machine.borrow().phase() != SubmitPhase::Idle {
            return;
        }

        // Every field is revalidated so each one shows its own message.
        let form_valid = self
            .fields
            .iter()
            .fold(true, |all_valid, field| field.validate() && all_valid);

        let decision = self.machine.borrow_mut().submit(form_valid);
        match decision {
            SubmitDecision::Ignored => {}
            SubmitDecision::Rejected => {
                log::debug!("Form submission rejected by validation");
                self.show_form_error(&self.config.form_error_message);
            }
            SubmitDecision::Accepted => {
                self.clear_form_error();
                self.enter_loading(button);
            }
        }
    }

    fn enter_loading(self: &Rc<Self>, button: &HtmlButtonElement) {
        *self.original_label.borrow_mut() = button.text_content().unwrap_or_default();
        button.set_text_content(Some(self.config.loading_label.as_str()));
        button.set_disabled(true);
        set_style(button, "opacity", "0.7");

        let form = Rc::downgrade(self);
        self.schedule(self.config.loading_delay_ms, move || {
            if let Some(form) = form.upgrade() {
                form.enter_success();
            }
        });
    }

    fn enter_success(self: &Rc<Self>) {
        if !self.machine.borrow_mut().finish_loading() {
            return;
        }
        if let Some(button) = &self.submit {
            button.set_text_content(Some(self.config.success_label.as_str()));
            set_styles(button, &[("background-color", "var(--accent-emerald)"), ("opacity", "1")]);
        }

        self.form.reset();
        for field in &self.fields {
            field.valid.set(false);
            if let Some(label) = &field.label {
                reset_label(label);
            }
        }
        log::info!("Simulated form submission completed");

        let form: Weak<Form> = Rc::downgrade(self);
        self.schedule(self.config.success_hold_ms, move || {
            if let Some(form) = form.upgrade() {
                form.return_to_idle();
            }
        });
    }

    fn return_to_idle(&self) {
        if !self.machine.borrow_mut().finish_success() {
            return;
        }
        self.restore_button();
    }

    fn restore_button(&self) {
        if let Some(button) = &self.submit {
            button.set_text_content(Some(self.original_label.borrow().as_str()));
            clear_style(button, "background-color");
            clear_style(button, "opacity");
            button.set_disabled(false);
        }
    }

    /// Replaces the single pending phase timer.
    fn schedule<F: FnOnce() + 'static>(&self, millis: u32, callback: F) {
        let timeout = Timeout::new(millis, callback);
        *self.timer.borrow_mut() = Some(timeout);
    }

    fn show_form_error(&self, message: &str) {
        let existing: Option<HtmlElement> = query_in(&self.form, ".form-error");
        let error = match existing {
            Some(el) => el,
            None => {
                let Some(el) = self
                    .document
                    .create_element("div")
                    .ok()
                    .and_then(|el| el.dyn_into::<HtmlElement>().ok())
                else {
                    return;
                };
                el.set_class_name("form-error");
                set_styles(
                    &el,
                    &[
                        ("color", "var(--accent-crimson)"),
                        ("text-align", "center"),
                        ("margin-top", "var(--space-12)"),
                    ],
                );
                let _ = self.form.append_child(&el);
                el
            }
        };
        error.set_text_content(Some(message));
        set_style(&error, "opacity", "1");
    }

    fn clear_form_error(&self) {
        if let Some(error) = query_in::<HtmlElement>(&self.form, ".form-error") {
            error.set_text_content(Some(""));
            set_style(&error, "opacity", "0");
        }
    }
}

pub struct FormController {
    ctx: Rc<PageContext>,
    form: Option<Rc<Form>>,
    listeners: Vec<EventListener>,
    debouncers: Vec<Debounce>,
}

impl FormController {
    pub fn new(ctx: Rc<PageContext>) -> Self {
        Self {
            ctx,
            form: None,
            listeners: Vec::new(),
            debouncers: Vec::new(),
        }
    }

    /// Validates one field by name, updating its visual state. Unknown fields are never valid.
    pub fn validate_field(&self, name: &str) -> bool {
        self.form
            .as_ref()
            .and_then(|form| form.field(name))
            .map(|field| field.validate())
            .unwrap_or(false)
    }

    /// Result of the last validation pass over `name`.
    pub fn field_is_valid(&self, name: &str) -> bool {
        self.form
            .as_ref()
            .and_then(|form| form.field(name))
            .map(|field| field.valid.get())
            .unwrap_or(false)
    }

    pub fn submit(&self) {
        if let Some(form) = &self.form {
            form.handle_submit();
        }
    }

    pub fn phase(&self) -> SubmitPhase {
        self.form
            .as_ref()
            .map(|form| form.machine.borrow().phase())
            .unwrap_or_default()
    }

    fn error_element(&self, input: &HtmlInputElement, name: &str) -> Option<HtmlElement> {
        let id = format!("{}-error", name);
        if let Some(existing) = self.ctx.document.get_element_by_id(&id) {
            return existing.dyn_into::<HtmlElement>().ok();
        }
        let span = self
            .ctx
            .document
            .create_element("span")
            .ok()?
            .dyn_into::<HtmlElement>()
            .ok()?;
        span.set_class_name("error-message");
        let _ = span.set_attribute("role", "alert");
        span.set_id(&id);
        input.parent_node()?.append_child(&span).ok()?;
        Some(span)
    }

    fn collect_fields(&self, form: &HtmlFormElement) -> Vec<Field> {
        FIELD_RULES
            .iter()
            .filter_map(|rule| {
                let input: HtmlInputElement = query_in(form, &format!("[name=\"{}\"]", rule.name))?;
                let error = self.error_element(&input, rule.name)?;
                let label = if input.id().is_empty() {
                    None
                } else {
                    query_in(form, &format!("label[for=\"{}\"]", input.id()))
                };
                Some(Field {
                    rule,
                    input,
                    error,
                    label,
                    valid: Cell::new(false),
                })
            })
            .collect()
    }

    fn wire_field(&mut self, form: &Rc<Form>, index: usize) {
        let field = &form.fields[index];
        let debounce = Debounce::new(self.ctx.config.input_debounce_ms);
        self.debouncers.push(debounce.clone());

        if let Some(label) = &field.label {
            set_styles(
                label,
                &[
                    ("transition", &format!("transform 0.2s {}, color 0.2s ease", EASE_OUT_CUBIC)),
                    ("transform-origin", "left top"),
                ],
            );
            field.float_label(&form.document);
        }

        let on_focus = form.clone();
        self.listeners.push(EventListener::new(&field.input, "focus", move |_| {
            let field = &on_focus.fields[index];
            set_styles(
                &field.input,
                &[
                    ("transition", &format!("border-color 0.2s {}, box-shadow 0.2s ease", EASE_OUT_CUBIC)),
                    ("border-color", "var(--primary-charcoal)"),
                    ("box-shadow", "0 0 0 3px rgba(10, 10, 10, 0.1)"),
                ],
            );
            field.float_label(&on_focus.document);
        }));

        let on_blur = form.clone();
        self.listeners.push(EventListener::new(&field.input, "blur", move |_| {
            let field = &on_blur.fields[index];
            clear_style(&field.input, "border-color");
            clear_style(&field.input, "box-shadow");
            field.validate();
            field.float_label(&on_blur.document);
        }));

        let on_input = form.clone();
        self.listeners.push(EventListener::new(&field.input, "input", move |_| {
            on_input.fields[index].float_label(&on_input.document);
            let pending = Rc::downgrade(&on_input);
            debounce.call(move || {
                if let Some(form) = pending.upgrade() {
                    form.fields[index].validate();
                }
            });
        }));
    }
}

impl Controller for FormController {
    fn name(&self) -> &'static str {
        "form"
    }

    fn start(&mut self) -> Result<(), EnhanceError> {
        if self.form.is_some() {
            return Ok(());
        }
        let Some(form_el) = self.ctx.elements.form.clone() else {
            log::debug!("No audit form on this page");
            return Ok(());
        };

        let fields = self.collect_fields(&form_el);
        let submit = query_in(&form_el, "button[type=\"submit\"]");
        if submit.is_none() {
            log::warn!("Audit form has no submit button; submissions are ignored");
        }
        let form = Rc::new(Form {
            form: form_el.clone(),
            document: self.ctx.document.clone(),
            fields,
            submit,
            machine: RefCell::new(SubmitMachine::default()),
            timer: RefCell::new(None),
            original_label: RefCell::new(String::new()),
            config: self.ctx.config.clone(),
        });

        for index in 0..form.fields.len() {
            self.wire_field(&form, index);
        }

        let on_submit = form.clone();
        self.listeners.push(EventListener::new_with_options(
            &form_el,
            "submit",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                event.prevent_default();
                on_submit.handle_submit();
            },
        ));

        log::info!("Form ready with {} validated fields", form.fields.len());
        self.form = Some(form);
        Ok(())
    }

    fn stop(&mut self) {
        self.listeners.clear();
        for debounce in self.debouncers.drain(..) {
            debounce.cancel();
        }
        if let Some(form) = self.form.take() {
            form.timer.borrow_mut().take();
            if form.machine.borrow().phase() != SubmitPhase::Idle {
                form.restore_button();
            }
            form.machine.borrow_mut().reset();
        }
    }
}
