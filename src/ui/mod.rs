//! Terminal interface: screens, widgets and colors.

mod app;
mod theme;
mod widgets;

pub use app::App;
pub use theme::Theme;
