//! Headless rendition of the browser front-end.
//!
//! [`Backend`] is the single choke point for calls to the REST API and the
//! [`pages`] hold the list/edit page logic minus any DOM rendering. Browser
//! pop-ups go through the [`Prompt`] trait.

/// Data-access facade over the REST API.
pub mod backend;
/// Client failures.
pub mod error;
/// List, board and edit pages.
pub mod pages;
/// Alert and confirmation pop-ups.
pub mod prompt;

pub use backend::Backend;
pub use error::{ClientError, ClientResult};
pub use prompt::{Prompt, RecordingPrompt};
