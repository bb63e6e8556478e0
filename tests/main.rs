/*!
 * Main test entry point for subweave test suite
 */

// Import common test utilities
pub mod common;

// Import unit tests
mod unit {
    // App configuration tests
    pub mod app_config_tests;

    // Language identifier tests
    pub mod language_utils_tests;

    // Subtitle codec tests
    pub mod subtitle_codec_tests;

    // Provider request construction tests
    pub mod providers_tests;
}

// Import integration tests
mod integration {
    // Import, convert and export across formats
    pub mod subtitle_workflow_tests;

    // Diff translation end to end over mock providers
    pub mod diff_translation_tests;

    // SQLite-backed store tests
    pub mod repository_store_tests;
}
