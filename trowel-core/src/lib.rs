//! Trowel Core Library - STL meshes and horizontal slicing
//!
//! This library loads triangle meshes from STL files, keeps their faces
//! indexed by Z-extent, and intersects them with horizontal planes to produce
//! the line segments of a slice contour.

pub mod error;
pub mod face;
pub mod geometry;
pub mod index;
pub mod mesh;
pub mod params;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use error::{Error, Result};
pub use face::{Face, ZBounds};
pub use geometry::{Plane, Point, Segment, Vec3};
pub use mesh::Mesh;
pub use params::SliceParams;
pub use stl::{parse_stl, read_stl, RawTriangle};
pub use transform::Transform;
