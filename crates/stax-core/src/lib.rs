//! Shared foundations of the stax calculator core: the LEB128 codec, the
//! closed tag set, the byte-level object model, operator metadata, the
//! error taxonomy, settings and the cooperative interrupt flag.
//!
//! Nothing here touches the object heap; see `stax-runtime` for memory.

pub mod error;
pub mod interrupt;
pub mod leb128;
pub mod object;
pub mod ops;
pub mod settings;
pub mod tag;

pub use error::Error;
pub use interrupt::Interrupt;
pub use ops::{CaseStyle, OpInfo};
pub use settings::Settings;
pub use tag::Tag;

/// Convenient result alias used across the workspace.
pub type Result<T> = core::result::Result<T, Error>;
