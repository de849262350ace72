/// Application name, also the platform config directory name.
pub const APP_NAME: &str = "peekwatch";

/// Extensions accepted by the image-directory frame source.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];
