//! Green-function kernels: Rankine sources, their mirror images and the
//! free-surface wave term.

pub mod finite_depth;
pub mod rankine;
pub mod wave;
