// Version information for the QR Detection Node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-qr-detection-2026-10-17";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2026-10-17";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "yolov8-onnx-detection",
    "qr-decoding",
    "multipart-upload",
    "annotated-image",
    "base64-json",
    "dataset-augmentation",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("QR Detection Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
