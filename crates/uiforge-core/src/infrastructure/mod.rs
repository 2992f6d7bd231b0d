//! Infrastructure layer providing external integrations.
//!
//! This module contains the HTTP implementations of the generation backend and
//! the preview renderer, plus the local stub backend used in admin mode.

pub mod clients;
pub mod preview;
