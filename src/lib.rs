#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use,
    clippy::uninlined_format_args
)]

pub mod catalog;
pub mod chat;
pub mod classifier;
pub mod config;
pub mod orders;
pub mod prompt;
pub mod providers;
pub mod router;
pub mod sessions;

pub use config::Config;
