mod ansi;
mod theme;
mod view;

pub use view::draw;
