pub mod app;
pub mod config;
pub mod context;
pub mod controller;
pub mod dom;
pub mod error;
pub mod motion;

pub mod components {
    pub mod enhancer;
}

pub mod controllers {
    pub mod accessibility;
    pub mod accordion;
    pub mod buttons;
    pub mod diagnostics;
    pub mod form;
    pub mod hero;
    pub mod images;
    pub mod navigation;
    pub mod reveal;
}
