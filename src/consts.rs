//! Global constants for the upload service.

pub const HTTP_PORT: u16 = 16001; // Default port when the config file does not set one.
pub const DEFAULT_HOST: &str = "0.0.0.0"; // Default bind address.
pub const CONFIG_PATH: &str = "config.yaml"; // Config file read when no path is given.
pub const UPLOAD_FIELD: &str = "upload_file"; // Multipart field carrying the file.
pub const STATIC_ROUTE: &str = "/images"; // Mount point for stored files.
pub const BYTES_PER_MB: u64 = 1024 * 1024; // MaxFileSize is configured in megabytes.
pub const ALLOWED_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".gif"]; // Default allow-list.
pub const ENV_PREFIX: &str = "IMGDROP_"; // Prefix of environment overrides.
