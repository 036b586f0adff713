pub mod app;
pub mod controller;
pub mod editor;
pub mod view;

pub use app::run;
