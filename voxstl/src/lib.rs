//! Convert a stack of equally sized binary cross-section images into a
//! triangulated, watertight STL surface bounding the union of their
//! voxels.
//!
//! The pixel at (x, y) of layer z stands for the unit voxel spanning
//! (x..x+1, y..y+1, z..z+1), with x growing to the right inside a row,
//! y to the back across rows and z upwards through the stack. An on
//! pixel (0xff) is solid, an off pixel (0) is empty.
//!
//! Extraction works layer by layer: every layer yields the facets that
//! depend on that image alone (the outer walls and the inner walls
//! between adjacent rows and columns), every pair of consecutive layers
//! yields the facets on the separating plane, and the first and last
//! layers get their bottom and top caps with coplanar runs merged into
//! rectangles. The per-layer work is independent, so the pipeline fans
//! it out to a worker pool and concatenates the resulting buffers into
//! one global mesh that the STL writer then serializes.

pub mod buffer;
pub mod extract;
pub mod layer;
pub mod pipeline;
pub mod point;
pub mod stl;
pub mod triangle;

use thiserror::Error as ThisError;

pub use buffer::TriangleBuffer;
pub use layer::Layer;
pub use point::Point;
pub use triangle::{Normal, Triangle};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal conversion errors.
///
/// There is no retry or partial recovery anywhere: every variant aborts
/// the run, and an output file that was already being written stays
/// behind incomplete.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Command line contract violation.
    #[error("{0}")]
    InvalidArgument(String),

    /// A layer image could not be opened or decoded.
    #[error("can't load layer image {path}: {source}")]
    ImageLoad {
        path: String,
        source: image::ImageError,
    },

    /// Two adjacent layers disagree on the raster dimensions.
    #[error("layer size {found:?} does not match {expected:?}")]
    GeometryMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },

    /// The STL output file could not be created.
    #[error("can't open output file {path}: {source}")]
    OutputOpen {
        path: String,
        source: std::io::Error,
    },

    /// Writing the STL stream failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    /// The worker pool could not be started.
    #[error("can't start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
