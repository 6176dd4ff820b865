//! URL detection: options, scheme allow-list, host reader and the scanner.

pub mod detector;
pub mod domain;
pub mod options;
pub mod schemes;

pub use detector::UrlDetector;
pub use options::{DetectorConfig, DetectorOptions};
pub use schemes::{SchemeSet, DEFAULT_SCHEMES};
