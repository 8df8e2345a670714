//! Builders for relocatable, pointer-free binary blobs.
//!
//! A caller assembles a tree of builders mirroring the shape of the data and
//! builds it in one call. Each builder writes its fixed-size header at the
//! position its parent chose, then reserves patch space for variable content
//! and recurses into it.
//!
//! # Architecture
//!
//! - **BlobStream**: byte sink with a movable data cursor and a growing patch cursor
//! - **Builder / AnyBuilder**: the header-then-patch build template, typed and erased
//! - **BuildHandle**: where a builder ended up, for pointers to already-built values
//! - **builders**: value, pointer, array, string, struct, tree, sorted-array and Any builders
//! - **BuildConfig**: final-length rounding and stream sizing

pub mod blob;
pub mod builder;
pub mod builders;
pub mod config;
pub mod error;
pub mod ops;
pub mod stream;

pub use blob::{build_blob, AnyBlobBuilderExt, BlobBuilderExt};
pub use builder::{AnyBuilder, BuildHandle, BuildRecord, Builder};
pub use builders::*;
pub use config::{BuildConfig, FinalAlignment};
pub use error::{BuildError, BuildResult};
pub use stream::BlobStream;
