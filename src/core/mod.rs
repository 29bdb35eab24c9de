//! Core types, identity resolution, field formatting and file naming.
//!
//! This module holds everything that does not touch XML: the data model
//! shared by the declaration builders, the identity resolver, the numeric
//! field formatter and the computation engine interface.

mod engine;
mod error;
mod format;
mod identity;
mod numbering;
mod types;

pub use engine::*;
pub use error::*;
pub use format::*;
pub use identity::*;
pub use numbering::*;
pub use types::*;
