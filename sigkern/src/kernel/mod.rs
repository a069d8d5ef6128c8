//! Shared kernel substrate.
//!
//! Constructor validation, the two error layers, and the flat-buffer
//! adapters every strided kernel reads from and writes into.

mod errors;
mod io;
mod lifecycle;
#[cfg(feature = "alloc")]
mod scratch;

pub use errors::*;
pub use io::*;
pub use lifecycle::*;
#[cfg(feature = "alloc")]
pub use scratch::*;
