pub mod app;
pub mod components;
pub mod format;
pub mod ui;
pub mod view_model;
