//! Compile-time embedded Android/GameActivity project template.
//!
//! Each entry loads a file from `templates/android/` via [`include_str!`]. The
//! paths are relative to this source file
//! (`crates/sierra-forge-core/src/templates/embedded.rs`).
//!
//! ## Adding a file
//!
//! 1. Place it under `templates/android/` (token-bearing names are fine)
//! 2. Add an [`EmbeddedFile`] to [`ANDROID_PROJECT`] with its relative path
//! 3. Build; a wrong `include_str!` path fails compilation
//!
//! Keep `path` identical to the on-disk location below `templates/android/` so
//! that generating from the embedded copy and from `--template templates/android`
//! produce the same tree.

/// One file of the built-in template.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedFile {
    /// Path relative to the template root, `/`-separated.
    pub path: &'static str,
    pub contents: &'static str,
}

pub const ANDROID_PROJECT: &[EmbeddedFile] = &[
    EmbeddedFile {
        path: "build.gradle",
        contents: include_str!("../../../../templates/android/build.gradle"),
    },
    EmbeddedFile {
        path: "gradle.properties",
        contents: include_str!("../../../../templates/android/gradle.properties"),
    },
    EmbeddedFile {
        path: "settings.gradle",
        contents: include_str!("../../../../templates/android/settings.gradle"),
    },
    EmbeddedFile {
        path: "app/build.gradle",
        contents: include_str!("../../../../templates/android/app/build.gradle"),
    },
    EmbeddedFile {
        path: "app/src/main/AndroidManifest.xml",
        contents: include_str!("../../../../templates/android/app/src/main/AndroidManifest.xml"),
    },
    EmbeddedFile {
        path: "app/src/main/cpp/CMakeLists.txt",
        contents: include_str!("../../../../templates/android/app/src/main/cpp/CMakeLists.txt"),
    },
    EmbeddedFile {
        path: "app/src/main/java/com/sierra/${APPLICATION_NAME}/${APPLICATION_NAME}Activity.java",
        contents: include_str!(
            "../../../../templates/android/app/src/main/java/com/sierra/${APPLICATION_NAME}/${APPLICATION_NAME}Activity.java"
        ),
    },
];
