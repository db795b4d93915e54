//! `isoform` - A field form for fire-ground incident safety officers
//!
//! This library holds the form document and everything around it: local
//! persistence, photo normalization, AI analysis prompts and calls, and the
//! printable report.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod form;
pub mod image_normalizer;
pub mod logging;
pub mod prompt;
pub mod render;
pub mod storage;

pub use analysis::{analyze, AnalysisProvider, GeminiProvider, RetryPolicy};
pub use config::Config;
pub use controller::{AnalysisTarget, Controller, Intent, PendingConfirmation, Tab};
pub use error::{Error, Result};
pub use export::{export_report, DocumentRenderer, PageLayout, PrintableHtml};
pub use form::{FormState, RowId, SideKey};
pub use image_normalizer::{DataUri, ImageNormalizer};
pub use logging::init_logging;
pub use prompt::{build_incident_prompt, build_medic_prompt, PromptRequest, Segment};
pub use render::{render_blocks, render_full_report, Block};
pub use storage::{FormStore, StoreStats};
