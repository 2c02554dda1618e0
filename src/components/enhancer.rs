use yew::prelude::*;

use crate::app;
use crate::controllers::buttons::{RIPPLE_KEYFRAMES, RIPPLE_STYLE_ID};

/// Root component: starts the page enhancements on mount and tears them down on unmount.
#[function_component(Enhancer)]
pub fn enhancer() -> Html {
    use_effect_with_deps(
        move |_| {
            if let Err(e) = app::boot() {
                log::error!("Landing enhancements unavailable: {}", e);
            }
            move || app::destroy()
        },
        (),
    );

    html! {
        <style id={RIPPLE_STYLE_ID}>{RIPPLE_KEYFRAMES}</style>
    }
}
