//! The type term model of the inference engine.
//!
//! A [`Type`] occurring during inference is either proper (no inference
//! variable reachable from it), a [use](Use) of exactly one inference
//! variable, or a composite type containing nested terms. Declarations of
//! classes and type parameters referenced by the terms live in the
//! [`Table`].
//!
//! [`Type`]: r#type::Type
//! [`Table`]: table::Table

pub mod instantiation;
pub mod table;
pub mod r#type;
pub mod variable;
pub mod visitor;

#[cfg(test)]
mod test;
