pub mod app_switcher;
pub mod snapshot_sink;
