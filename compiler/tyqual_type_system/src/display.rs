//! Contains the rendering of terms with the names from an [`Environment`].

use std::fmt::{self, Formatter, Write};

use tyqual_qualifier::{Qualifier, Qualifiers};
use tyqual_term::r#type::{Argument, Type, Wildcard};

use crate::Environment;

/// Similar to [`std::fmt::Display`] but with the environment that declares
/// the names used by the term.
pub trait Display {
    #[allow(missing_docs, clippy::missing_errors_doc)]
    fn fmt(&self, environment: &Environment, f: &mut Formatter<'_>) -> fmt::Result;
}

/// Contains the display object that requires the environment.
///
/// Primarily used for implementing [`std::fmt::Display`] trait.
#[derive(Debug, Clone, Copy)]
pub struct DisplayObject<'a, D: ?Sized> {
    /// The environment declaring the names.
    pub environment: &'a Environment,

    /// The display object that requires the environment.
    pub display: &'a D,
}

impl<D: Display + ?Sized> fmt::Display for DisplayObject<'_, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.display.fmt(self.environment, f)
    }
}

impl Environment {
    /// Wraps the term so it can be rendered with [`std::fmt::Display`].
    #[must_use]
    pub const fn display<'a, D: Display + ?Sized>(
        &'a self,
        display: &'a D,
    ) -> DisplayObject<'a, D> {
        DisplayObject { environment: self, display }
    }
}

impl Display for Qualifier {
    fn fmt(&self, environment: &Environment, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&environment.registry().qualifier_name(*self))
    }
}

impl Display for Qualifiers {
    fn fmt(&self, environment: &Environment, f: &mut Formatter<'_>) -> fmt::Result {
        for qualifier in self.iter() {
            qualifier.fmt(environment, f)?;
            f.write_char(' ')?;
        }

        Ok(())
    }
}

impl Display for Argument {
    fn fmt(&self, environment: &Environment, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(ty) => ty.fmt(environment, f),
            Self::Wildcard(Wildcard::Unbounded) => f.write_char('?'),
            Self::Wildcard(Wildcard::Extends(bound)) => {
                write!(f, "? extends {}", environment.display(bound.as_ref()))
            }
            Self::Wildcard(Wildcard::Super(bound)) => {
                write!(f, "? super {}", environment.display(bound.as_ref()))
            }
        }
    }
}

impl Display for Type {
    fn fmt(&self, environment: &Environment, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(class) => {
                class.qualifiers.fmt(environment, f)?;

                match environment.table().class(class.id) {
                    Some(declaration) => f.write_str(declaration.name())?,
                    None => write!(f, "{:?}", class.id)?,
                }

                if class.arguments.is_empty() {
                    return Ok(());
                }

                f.write_char('<')?;
                for (index, argument) in class.arguments.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }

                    argument.fmt(environment, f)?;
                }
                f.write_char('>')
            }

            Self::Array(array) => {
                array.element.fmt(environment, f)?;

                if !array.qualifiers.is_empty() {
                    f.write_char(' ')?;
                    array.qualifiers.fmt(environment, f)?;
                }

                f.write_str("[]")
            }

            Self::Parameter(parameter) => {
                parameter.qualifiers.fmt(environment, f)?;

                match environment.table().type_parameter(parameter.id) {
                    Some(declaration) => f.write_str(declaration.name()),
                    None => write!(f, "{:?}", parameter.id),
                }
            }

            Self::Inference(use_of) => {
                use_of.qualifiers().fmt(environment, f)?;
                write!(f, "var{}", use_of.variable().index())
            }
        }
    }
}
