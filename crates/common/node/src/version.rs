pub const APP_NAME: &str = "depot";

/// Crate version of the build.
pub const DEPOT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The operating system of the build, linux, macos, windows etc.
pub const BUILD_OPERATING_SYSTEM: &str = std::env::consts::OS;

/// The architecture of the build, x86_64, aarch64, etc.
pub const BUILD_ARCHITECTURE: &str = std::env::consts::ARCH;

/// Information about the client.
/// example: depot/v0.1.0/linux-x86_64
pub fn depot_node_version() -> String {
    format!("{APP_NAME}/v{DEPOT_VERSION}/{BUILD_OPERATING_SYSTEM}-{BUILD_ARCHITECTURE}")
}
