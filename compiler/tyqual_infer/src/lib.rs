//! Constraint-based type argument inference with qualifier inference running
//! in lockstep.
//!
//! A [`Session`] owns the inference variables of one call site. Constraints
//! submitted to the session are reduced into bounds on the variables, the
//! bounds are closed under the incorporation rules, and the resolver picks
//! instantiations until every variable is resolved. Every variable carries a
//! structural bound set and, per qualifier hierarchy, a qualifier bound set
//! that is resolved with the hierarchy's own lattice operations.
//!
//! The [`infer`] entry point drives a whole session for a call of a generic
//! [`Signature`].
//!
//! [`Session`]: session::Session
//! [`infer`]: signature::infer
//! [`Signature`]: signature::Signature

pub mod config;
pub mod constraint;
pub mod error;
pub mod incorporation;
pub mod reduction;
pub mod resolution;
pub mod session;
pub mod signature;
pub mod use_of_variable;
pub mod variable;

pub use config::Config;
pub use error::Error;
pub use session::Session;
pub use signature::{infer, Call, Signature, Solution};
