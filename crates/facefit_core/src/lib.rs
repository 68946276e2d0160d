//! # facefit_core - Shared Storage Primitives
//!
//! Index-based storage used by the scene graph and the render buckets:
//! - [`Arena`]: generational storage addressed by stable [`Key`]s
//! - [`IndexSet`]: insertion-ordered key set with O(1) removal
//!
//! Nothing here relies on object identity. Every stored value is reached
//! through a key handed out at insertion time.

pub mod arena;
pub mod index_set;

pub use arena::{Arena, Key};
pub use index_set::IndexSet;

pub mod prelude {
    pub use crate::arena::{Arena, Key};
    pub use crate::index_set::IndexSet;
}
