//! Mesh-side algorithms backing the density engine.
//!
//! - **Shells**: connected components of the UV layout
//! - **Rescale**: shell-preserving UV scale and relaxation, the in-crate
//!   implementation of [`UvRescale`](crate::host::UvRescale)
//! - **Progress**: callbacks for long-running operations

pub mod progress;
pub mod rescale;
pub mod shells;

pub use progress::Progress;
pub use rescale::{rescale_uv, rescale_uv_with_progress};
pub use shells::{find_uv_shells, UvShells};
