//! Terminal host
//!
//! The interactive event loop and the bars drawn under the art.

mod app;
mod widgets;

pub use app::App;
pub use widgets::{HelpBar, StatusBar};
