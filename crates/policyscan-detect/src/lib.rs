//! Privacy-policy detection for arbitrary web pages.
//!
//! A [`PageInspector`] turns a page handle into a read-only [`PageSignal`]
//! (candidate element texts plus the page's visible text); the
//! [`ContentExtractor`] then decides whether any candidate mentions a
//! privacy-policy keyword.

pub mod error;
pub mod extractor;
pub mod html;
pub mod inspector;
pub mod keywords;

pub use error::DetectError;
pub use extractor::ContentExtractor;
pub use inspector::{HttpPageInspector, PageInspector, StaticPageInspector};
pub use keywords::{matching_keyword, PRIVACY_KEYWORDS};
