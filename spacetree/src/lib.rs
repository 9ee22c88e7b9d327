//! Spacetree is a library for adaptive spatial subdivision and surface
//! extraction around implicit shapes.
//!
//! An implicit shape is described by a **target oracle**: a function from a
//! position in `D`-dimensional space to a value.  The value is either a
//! boolean (inside / outside) or a signed scalar, where the sign is what
//! matters.  The library never looks inside the oracle; it only samples it.
//!
//! There are two engines built on top of that idea.
//!
//! # Subdivision
//! A [`SpaceTreeNode`](crate::tree::SpaceTreeNode) wraps a **cell** (an
//! axis-aligned [`Cube`](crate::primitive::Cube) or
//! [`Cuboid`](crate::primitive::Cuboid)), a
//! [`Sampler`](crate::sampler::Sampler)
//! that picks sample positions within the cell, and a
//! [`SplitPolicy`](crate::split::SplitPolicy) that decides where the cell
//! should be cut.  Dividing the node evaluates the oracle at every sample
//! position; if the samples disagree in sign, the cell straddles the shape's
//! boundary and is split into `2^D` children, which are divided in turn.
//!
//! ```
//! use spacetree::{
//!     primitive::Cube, sampler::CartesianGridSampler, split::MidPoint,
//!     tree::SpaceTreeNode, types::Point,
//! };
//! use std::sync::Arc;
//!
//! let cube = Cube::new(Point::<2>::new(-1.0, -1.0), 2.0)?;
//! let root = SpaceTreeNode::new(
//!     cube,
//!     Arc::new(CartesianGridSampler::new(3)?),
//!     Arc::new(MidPoint),
//! );
//! let circle = |p: &Point<2>| p.norm() - 0.5;
//! assert!(root.divide(&circle, 4));
//! assert!(root.is_boundary()?);
//! assert!(root.node_count() > 1);
//! # Ok::<(), spacetree::Error>(())
//! ```
//!
//! Subdivision may also run across a [`ThreadPool`](crate::pool::ThreadPool),
//! sharing a [`TargetMap`](crate::map::TargetMap) between tasks so that sample
//! positions shared by neighbouring cells are only evaluated once.
//!
//! # Surface extraction
//! The [`marching`] module scans a set of cells, classifies each cell corner
//! as inside or outside, and looks up the corner configuration in a
//! connectivity table (marching squares in 2D, marching cubes in 3D).  Each
//! surface fragment is reported to a caller-supplied output function as a
//! list of cell edges; the [`MeshBuilder`](crate::mesh::MeshBuilder) turns
//! those fragments into an indexed [`Mesh`](crate::mesh::Mesh).
//!
//! ```
//! use spacetree::{
//!     marching::{MarchingPrimitives, StructuredGrid},
//!     mesh::MeshBuilder,
//!     types::Point,
//! };
//!
//! let grid = StructuredGrid::new([(-1.0, 1.0); 3], [9; 3])?;
//! let sphere = |p: &Point<3>| p.norm() - 0.6;
//! let builder = MeshBuilder::new();
//! MarchingPrimitives::marching_cubes(grid, &sphere, |f| builder.push(f))
//!     .execute(None);
//! let mesh = builder.take();
//! assert!(!mesh.faces.is_empty());
//! # Ok::<(), spacetree::Error>(())
//! ```
//!
//! # Feature flags
#![doc = document_features::document_features!()]
#![warn(missing_docs)]

mod error;
pub use error::Error;

pub mod cell;
pub mod map;
pub mod marching;
pub mod mesh;
pub mod oracle;
pub mod pool;
pub mod primitive;
pub mod sampler;
pub mod split;
pub mod tree;
pub mod types;
