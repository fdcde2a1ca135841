// Build Metadata and Versioning
//
// Defines compile-time build information for the firmware, including name,
// version, and human-readable banners. This data is embedded directly into
// the binary and used for boot-time reporting on the log channel.
//
// Key responsibilities:
// - Centralize firmware identity (name and version)
// - Provide preformatted strings for logs and the boot banner
//
// Implementation details:
// - `define_build_meta!` expands into multiple `pub const` string slices
// - Uses `concat!` to build derived strings at compile time
// - Build date is manually specified, making builds reproducible and explicit

macro_rules! define_build_meta {
    ($name:literal, $version:literal, $build_date:literal) => {
        #[allow(dead_code)]
        pub const FIRMWARE_NAME: &str = $name;
        #[allow(dead_code)]
        pub const VERSION: &str = $version;
        #[allow(dead_code)]
        pub const BUILD_DATE: &str = $build_date;

        #[allow(dead_code)]
        pub const VERSION_TAG: &str = concat!($name, " v", $version);
        pub const BOOT_BANNER: &str = concat!($name, " v", $version, " (", $build_date, ")");
    };
}

define_build_meta!("HIDLink", "0.1.0", "2026-08-01");
