//! The structural oracle of the inference engine.
//!
//! The [`Environment`] answers the structural questions the inference engine
//! asks about proper types: subtyping, equality, supertype parameterization
//! and least-upper/greatest-lower bounds. It bundles the declarations
//! [`Table`] with the qualifier [`Registry`]; both are read-only after
//! construction so one environment can be shared by any number of sessions
//! running on different threads.

use getset::Getters;
use tyqual_qualifier::Registry;
use tyqual_term::{r#type::Type, table::Table};

pub mod display;
pub mod equality;
pub mod lub;
pub mod subtyping;

/// The declarations and qualifier hierarchies visible to inference.
#[derive(Debug, Clone, Default, Getters, derive_new::new)]
pub struct Environment {
    /// The class and type parameter declarations.
    #[get = "pub"]
    table: Table,

    /// The registered qualifier hierarchies.
    #[get = "pub"]
    registry: Registry,
}

/// More than one incomparable candidate exists where a unique one is
/// required.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
#[error("no unique bound exists among the candidates")]
pub struct AmbiguousBoundError {
    /// The incomparable candidates.
    pub candidates: Vec<Type>,
}
