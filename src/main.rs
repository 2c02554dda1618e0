use landing_fx::components::enhancer::Enhancer;
use landing_fx::config;
use log::info;
use web_sys::Element;

const MOUNT_ID: &str = "landing-fx-root";

/// Dedicated node for the Yew root so the page's own markup is left untouched.
fn mount_point() -> Option<Element> {
    let document = web_sys::window()?.document()?;
    if let Some(existing) = document.get_element_by_id(MOUNT_ID) {
        return Some(existing);
    }
    let mount = document.create_element("div").ok()?;
    mount.set_id(MOUNT_ID);
    let _ = mount.set_attribute("hidden", "");
    document.body()?.append_child(&mount).ok()?;
    Some(mount)
}

fn main() {
    // Initialize console error panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    console_log::init_with_level(config::log_level()).expect("error initializing log");

    info!("Starting landing enhancements");
    match mount_point() {
        Some(root) => {
            yew::Renderer::<Enhancer>::with_root(root).render();
        }
        None => {
            log::error!("No document body to mount into");
        }
    }
}
