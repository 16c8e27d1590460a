//! Shared WebDAV mechanics used by both the CalDAV and CardDAV handlers:
//! error-to-status mapping, multistatus building, request-body scraping,
//! and the OPTIONS handler.

pub mod error;
pub mod multistatus;
pub mod options;
pub mod propfind;
pub mod xml;
