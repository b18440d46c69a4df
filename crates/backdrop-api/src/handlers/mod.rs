pub mod change_bg;
pub mod remove_bg;
