pub mod command_app_switcher;
pub mod jpeg_snapshot_writer;
