#![allow(non_local_definitions)]
//! URL detection in free text.
//!
//! ```
//! use url_detector::{detect, DetectorConfig, DetectorOptions};
//!
//! let config = DetectorConfig::new(DetectorOptions::HTML);
//! let urls = detect(r#"<a href="http://www.google.com/">Google</a>"#, &config);
//! assert_eq!(urls[0].host(), "www.google.com");
//! ```

pub mod detection;
pub mod error;
#[cfg(feature = "python")]
mod python;
pub mod url;
pub mod utils;

pub use detection::{DetectorConfig, DetectorOptions, SchemeSet, UrlDetector};
pub use error::UrlError;
pub use url::marker::{UrlMarker, UrlPart};
pub use url::normalized::NormalizedUrl;
pub use url::Url;

/// 在文本中查找所有 URL
pub fn detect(text: &str, config: &DetectorConfig) -> Vec<Url> {
    UrlDetector::new(config.clone()).detect(text)
}
