//! Influence matrices for linear potential-flow wave-body interaction.
#![cfg_attr(feature = "strict", deny(warnings))]
#![warn(missing_docs)]

#[macro_use]
extern crate lazy_static;

pub mod assembly;
pub mod green;
pub mod mesh;
pub mod quadrature;
pub mod shapes;
pub mod special;
pub mod tabulation;
pub mod types;
