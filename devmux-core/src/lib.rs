pub mod config;
pub mod event;
pub mod model;
pub mod reducer;
pub mod relay;
pub mod state;
pub mod viewport;
