use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{
    Document, HtmlButtonElement, HtmlElement, HtmlImageElement, HtmlInputElement, KeyboardEvent, KeyboardEventInit,
    MouseEvent, MouseEventInit, Window,
};

use landing_fx::app::{self, AppController};
use landing_fx::components::enhancer::Enhancer;
use landing_fx::config::LandingConfig;
use landing_fx::context::PageContext;
use landing_fx::controllers::accessibility::{KEYBOARD_CLASS, LIVE_REGION_ID};
use landing_fx::controllers::buttons::RIPPLE_STYLE_ID;
use landing_fx::controllers::form::SubmitPhase;
use landing_fx::motion::Throttle;

wasm_bindgen_test_configure!(run_in_browser);

const FIXTURE_ID: &str = "landing-fixture";

const PIXEL: &str = "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

const PAGE: &str = r##"
<nav class="nav" style="height: 60px"><a href="#faq" id="faq-link">FAQ</a></nav>
<div class="urgency-stats">
  <span class="urgency-number">500+ patients</span>
  <span class="urgency-number">no digits</span>
</div>
<img id="lazy-shot" width="10" height="10" data-src="data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7">
<section class="hero" style="min-height: 400px">
  <h1 class="hero-headline">Grow your practice</h1>
  <p class="hero-subheadline">Patients are searching for you.</p>
  <div class="hero-actions"><button type="button" class="btn" id="cta">Book</button></div>
  <img class="hero-photo" alt="">
</section>
<section id="faq">
  <div class="faq-item">
    <button class="faq-question">Is it free?<span class="faq-icon">+</span></button>
    <div class="faq-answer"><p>Yes.</p></div>
  </div>
  <div class="faq-item">
    <button class="faq-question">How long?<span class="faq-icon">+</span></button>
    <div class="faq-answer"><p>Two days.</p></div>
  </div>
</section>
<div class="fade-in">Later content</div>
<form id="auditForm">
  <label for="name">Name</label><div><input id="name" name="name"></div>
  <label for="practice">Practice</label><div><input id="practice" name="practice"></div>
  <label for="email">Email</label><div><input id="email" name="email"></div>
  <label for="website">Website</label><div><input id="website" name="website"></div>
  <button type="submit" class="btn">Get my audit</button>
</form>
<div style="height: 3000px"></div>
"##;

fn window() -> Window {
    web_sys::window().unwrap()
}

fn document() -> Document {
    window().document().unwrap()
}

fn mount_fixture() {
    let document = document();
    if let Some(previous) = document.get_element_by_id(FIXTURE_ID) {
        previous.remove();
    }
    let root = document.create_element("div").unwrap();
    root.set_id(FIXTURE_ID);
    root.set_inner_html(PAGE);
    // Ahead of the runner's output so the fixture starts inside the viewport.
    let body = document.body().unwrap();
    body.insert_before(&root, body.first_child().as_ref()).unwrap();
    window().scroll_to_with_x_and_y(0.0, 0.0);
}

fn fast_config() -> LandingConfig {
    LandingConfig {
        loading_delay_ms: 50,
        success_hold_ms: 50,
        announce_clear_ms: 50,
        ripple_ms: 50,
        counter_duration_ms: 50.0,
        counter_stagger_ms: 10,
        accordion_focus_ms: 10,
        input_debounce_ms: 10,
        entrance_delays_ms: vec![0, 0, 0, 0],
        ..LandingConfig::default()
    }
}

fn start_app_with(config: LandingConfig) -> AppController {
    mount_fixture();
    let mut app = AppController::new(PageContext::new(window(), document(), config));
    app.start();
    app
}

fn start_app() -> AppController {
    start_app_with(fast_config())
}

fn submit_button() -> HtmlButtonElement {
    element("#auditForm button[type=\"submit\"]")
        .dyn_into::<HtmlButtonElement>()
        .unwrap()
}

fn counter_value(text: &str) -> u64 {
    text.trim_end_matches("+ patients").parse().unwrap()
}

fn element(selector: &str) -> HtmlElement {
    document()
        .query_selector(selector)
        .unwrap()
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap()
}

fn set_input(name: &str, value: &str) {
    element(&format!("#{}", name))
        .dyn_into::<HtmlInputElement>()
        .unwrap()
        .set_value(value);
}

fn aria_expanded(index: usize) -> Option<String> {
    let questions = document().query_selector_all(".faq-question").unwrap();
    questions
        .get(index as u32)
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap()
        .get_attribute("aria-expanded")
}

fn fill_valid_form() {
    set_input("name", "Dr. Jane Smith");
    set_input("practice", "Smith Dental");
    set_input("email", "jane@clinic.com");
    set_input("website", "");
}

#[wasm_bindgen_test]
fn starts_every_controller_in_order() {
    let mut app = start_app();
    assert_eq!(
        app.started(),
        &["hero", "navigation", "accordion", "form", "reveal", "buttons", "images", "accessibility", "diagnostics"]
    );
    assert!(app.controller("form").is_some());
    assert!(app.controller("carousel").is_none());
    app.destroy();
}

#[wasm_bindgen_test]
fn accordion_keeps_one_panel_open() {
    let mut app = start_app();
    assert_eq!(aria_expanded(0).as_deref(), Some("false"));
    assert_eq!(
        element(".faq-question").get_attribute("aria-controls").as_deref(),
        Some("faq-answer-1")
    );

    app.accordion().toggle(0);
    assert_eq!(app.accordion().active(), Some(0));
    assert_eq!(aria_expanded(0).as_deref(), Some("true"));

    app.accordion().toggle(1);
    assert_eq!(app.accordion().active(), Some(1));
    assert_eq!(aria_expanded(0).as_deref(), Some("false"));
    assert_eq!(aria_expanded(1).as_deref(), Some("true"));

    app.accordion().toggle(1);
    assert_eq!(app.accordion().active(), None);
    assert_eq!(aria_expanded(1).as_deref(), Some("false"));
    app.destroy();
}

#[wasm_bindgen_test]
fn question_click_opens_its_panel() {
    let mut app = start_app();
    element(".faq-question").click();
    assert_eq!(app.accordion().active(), Some(0));
    assert!(element(".faq-item").class_list().contains("open"));
    app.destroy();
}

#[wasm_bindgen_test]
fn escape_closes_the_open_panel() {
    let mut app = start_app();
    app.accordion().toggle(0);

    let init = KeyboardEventInit::new();
    init.set_key("Escape");
    init.set_bubbles(true);
    let event = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
    document().dispatch_event(&event).unwrap();

    assert_eq!(app.accordion().active(), None);
    assert_eq!(aria_expanded(0).as_deref(), Some("false"));
    app.destroy();
}

#[wasm_bindgen_test]
fn email_and_website_validation() {
    let mut app = start_app();
    let form = app.form();

    set_input("email", "jane@clinic.com");
    assert!(form.validate_field("email"));
    set_input("email", "jane@clinic");
    assert!(!form.validate_field("email"));
    assert_eq!(
        element("#email-error").text_content().as_deref(),
        Some("Please enter a valid email address")
    );

    set_input("website", "");
    assert!(form.validate_field("website"));
    set_input("website", "www.clinic.com");
    assert!(!form.validate_field("website"));
    set_input("website", "https://clinic.com");
    assert!(form.validate_field("website"));
    assert!(form.field_is_valid("website"));

    assert!(!form.validate_field("phone"));
    app.destroy();
}

#[wasm_bindgen_test]
fn invalid_submission_stays_idle() {
    let mut app = start_app();
    set_input("name", "J");
    app.form().submit();

    assert_eq!(app.form().phase(), SubmitPhase::Idle);
    assert_eq!(
        element("#auditForm .form-error").text_content().as_deref(),
        Some("Please correct the errors above")
    );
    assert_eq!(
        element("#name-error").text_content().as_deref(),
        Some("Minimum 2 characters required")
    );
    app.destroy();
}

#[wasm_bindgen_test]
async fn valid_submission_runs_the_full_cycle() {
    let mut app = start_app();
    fill_valid_form();
    let button = submit_button();
    assert!(!button.disabled());

    app.form().submit();
    assert_eq!(app.form().phase(), SubmitPhase::Loading);
    assert_eq!(button.text_content().as_deref(), Some("Sending Analysis..."));
    assert!(button.disabled());

    // Repeated submits while loading are ignored.
    app.form().submit();
    assert_eq!(app.form().phase(), SubmitPhase::Loading);

    TimeoutFuture::new(80).await;
    assert_eq!(app.form().phase(), SubmitPhase::Success);
    assert_eq!(button.text_content().as_deref(), Some("Analysis Sent! ✓"));
    assert!(button.disabled());
    assert_eq!(
        element("#email").dyn_into::<HtmlInputElement>().unwrap().value(),
        ""
    );

    TimeoutFuture::new(80).await;
    assert_eq!(app.form().phase(), SubmitPhase::Idle);
    assert_eq!(button.text_content().as_deref(), Some("Get my audit"));
    assert!(!button.disabled());
    app.destroy();
}

#[wasm_bindgen_test]
async fn form_error_clears_on_a_later_valid_submit() {
    let mut app = start_app();
    app.form().submit();
    let error = element("#auditForm .form-error");
    assert!(!error.text_content().unwrap_or_default().is_empty());

    fill_valid_form();
    app.form().submit();
    assert_eq!(error.text_content().as_deref(), Some(""));

    // Stopping mid-flight cancels the pending phase timer.
    app.destroy();
    TimeoutFuture::new(80).await;
    assert_eq!(app.form().phase(), SubmitPhase::Idle);
}

#[wasm_bindgen_test]
async fn announcements_clear_themselves() {
    let mut app = start_app();
    let region = document().get_element_by_id(LIVE_REGION_ID).unwrap();
    assert_eq!(region.get_attribute("aria-live").as_deref(), Some("polite"));

    app.accessibility().announce("first");
    app.accessibility().announce("Form submitted");
    assert_eq!(region.text_content().as_deref(), Some("Form submitted"));

    TimeoutFuture::new(80).await;
    assert_eq!(region.text_content().as_deref(), Some(""));
    app.destroy();
}

#[wasm_bindgen_test]
fn reduced_motion_reveals_fade_elements() {
    let mut app = start_app();
    app.accessibility().apply_reduced_motion(true);
    assert!(app.accessibility().reduced_motion());
    assert!(element(".fade-in").class_list().contains("visible"));

    app.accessibility().apply_reduced_motion(false);
    assert!(!app.accessibility().reduced_motion());
    app.destroy();
}

#[wasm_bindgen_test]
async fn ripples_remove_themselves() {
    let mut app = start_app();
    let button = element("#cta");

    let init = MouseEventInit::new();
    init.set_client_x(10);
    init.set_client_y(10);
    init.set_bubbles(true);
    let click = MouseEvent::new_with_mouse_event_init_dict("click", &init).unwrap();
    button.dispatch_event(&click).unwrap();

    assert_eq!(app.buttons().live_ripples(), 1);
    assert_eq!(button.query_selector_all("span").unwrap().length(), 1);

    TimeoutFuture::new(100).await;
    assert_eq!(app.buttons().live_ripples(), 0);
    assert_eq!(button.query_selector_all("span").unwrap().length(), 0);
    app.destroy();
}

#[wasm_bindgen_test]
async fn counters_count_up_to_their_target() {
    let mut app = start_app_with(LandingConfig {
        counter_duration_ms: 200.0,
        ..fast_config()
    });
    let number = element(".urgency-number");

    let mut frames = Vec::new();
    for _ in 0..40 {
        TimeoutFuture::new(10).await;
        let text = number.text_content().unwrap_or_default();
        assert!(text.ends_with("+ patients"), "suffix lost in {:?}", text);
        frames.push(counter_value(&text));
    }
    TimeoutFuture::new(200).await;
    frames.push(counter_value(&number.text_content().unwrap_or_default()));

    let first_counted = frames.iter().position(|value| *value < 500).expect("counter never ran");
    let counted = &frames[first_counted..];
    assert!(counted.windows(2).all(|pair| pair[0] <= pair[1]), "{:?}", counted);
    assert_eq!(*counted.last().unwrap(), 500);
    assert_eq!(
        document().query_selector_all(".urgency-number").unwrap().get(1).unwrap().text_content().as_deref(),
        Some("no digits")
    );
    app.destroy();
}

#[wasm_bindgen_test]
async fn nav_shows_on_downward_scroll_and_hides_on_upward() {
    let mut app = start_app();
    let nav = element(".nav");
    assert!(!app.navigation().is_visible());

    window().scroll_to_with_x_and_y(0.0, 300.0);
    TimeoutFuture::new(100).await;
    assert!(app.navigation().is_visible());
    assert!(nav.class_list().contains("visible"));
    assert!(app.diagnostics().metrics().events() >= 1);

    window().scroll_to_with_x_and_y(0.0, 250.0);
    TimeoutFuture::new(100).await;
    assert!(!app.navigation().is_visible());
    assert!(!nav.class_list().contains("visible"));

    app.destroy();
    window().scroll_to_with_x_and_y(0.0, 0.0);
}

#[wasm_bindgen_test]
async fn anchor_scroll_leaves_room_for_the_nav() {
    let mut app = start_app();
    let nav_height = element(".nav").offset_height() as f64;
    let target_top = element("#faq").get_bounding_client_rect().top() + window().scroll_y().unwrap();
    let expected = (target_top - nav_height - 20.0).max(0.0);
    assert!(expected > 0.0);

    element("#faq-link").click();
    TimeoutFuture::new(1500).await;
    let scrolled = window().scroll_y().unwrap();
    assert!((scrolled - expected).abs() <= 1.0, "scrolled to {} instead of {}", scrolled, expected);

    app.destroy();
    window().scroll_to_with_x_and_y(0.0, 0.0);
}

#[wasm_bindgen_test]
async fn hero_photo_follows_scroll_with_parallax() {
    let mut app = start_app();
    assert!(app.context().viewport().height > 200.0);
    TimeoutFuture::new(50).await;

    window().scroll_to_with_x_and_y(0.0, 200.0);
    TimeoutFuture::new(100).await;
    let transform = element(".hero-photo").style().get_property_value("transform").unwrap();
    assert!(transform.contains("translateY(100px)"), "{}", transform);
    assert!(transform.contains("scale(1.04"), "{}", transform);

    app.destroy();
    window().scroll_to_with_x_and_y(0.0, 0.0);
}

#[wasm_bindgen_test]
async fn lazy_images_load_their_deferred_source() {
    let mut app = start_app();
    TimeoutFuture::new(300).await;

    let img = element("#lazy-shot").dyn_into::<HtmlImageElement>().unwrap();
    assert_eq!(img.src(), PIXEL);
    assert!(img.dataset().get("src").is_none());
    assert!(img.class_list().contains("loaded"));
    app.destroy();
}

#[wasm_bindgen_test]
async fn throttle_releases_its_cooldown_timer() {
    let throttle = Throttle::new(20);
    assert!(throttle.ready());
    assert!(!throttle.ready());
    assert!(throttle.is_cooling());

    TimeoutFuture::new(50).await;
    assert!(!throttle.is_cooling());
    assert!(throttle.ready());
}

#[wasm_bindgen_test]
fn stop_reverts_accessibility_side_effects() {
    let mut app = start_app();
    let init = KeyboardEventInit::new();
    init.set_key("Tab");
    let tab = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
    document().dispatch_event(&tab).unwrap();
    app.accessibility().apply_reduced_motion(true);

    let body = document().body().unwrap();
    let root = document().document_element().unwrap().dyn_into::<HtmlElement>().unwrap();
    assert!(body.class_list().contains(KEYBOARD_CLASS));
    assert_eq!(root.style().get_property_value("--transition-all").unwrap(), "none");

    app.destroy();
    assert!(!body.class_list().contains(KEYBOARD_CLASS));
    assert_eq!(root.style().get_property_value("--transition-all").unwrap(), "");
}

#[wasm_bindgen_test]
async fn root_component_boots_once_and_tears_down() {
    mount_fixture();
    let mount = document().create_element("div").unwrap();
    document().body().unwrap().append_child(&mount).unwrap();

    let handle = yew::Renderer::<Enhancer>::with_root(mount.clone()).render();
    TimeoutFuture::new(50).await;
    let keyframes = document()
        .query_selector_all(&format!("style#{}", RIPPLE_STYLE_ID))
        .unwrap();
    assert_eq!(keyframes.length(), 1);
    assert!(app::has_controller("buttons"));

    handle.destroy();
    TimeoutFuture::new(20).await;
    assert!(!app::has_controller("buttons"));
    mount.remove();
}

#[wasm_bindgen_test]
fn destroy_is_idempotent() {
    let mut app = start_app();
    app.destroy();
    app.destroy();
    assert!(app.started().is_empty());
    assert!(element("#cta").dataset().get("enhanced").is_none());
}
