//! Contains the declarations referenced by type terms.

use getset::{CopyGetters, Getters};
use tyqual_arena::{Arena, ID};

use crate::r#type::{self, Type};

/// Identifies a class declaration in the [`Table`].
pub type ClassID = ID<Class>;

/// Identifies a type parameter declaration in the [`Table`].
pub type TypeParameterID = ID<TypeParameter>;

/// The declaration of a type parameter, `T extends B1 & B2`.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct TypeParameter {
    /// The name of the type parameter.
    #[get = "pub"]
    name: String,

    /// The declared upper bounds; empty means `Object`.
    #[get = "pub"]
    bounds: Vec<Type>,
}

/// The declaration of a class or interface.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Class {
    /// The name of the class.
    #[get = "pub"]
    name: String,

    /// The declared type parameters, in order.
    #[get = "pub"]
    parameters: Vec<TypeParameterID>,

    /// The direct supertypes, written in terms of [`Self::parameters`].
    #[get = "pub"]
    supertypes: Vec<r#type::Class>,
}

/// Classes the inference engine gives a meaning to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct WellKnown {
    /// The root of the class hierarchy; the default instantiation.
    #[get_copy = "pub"]
    object: ClassID,

    /// The root of the exception hierarchy.
    #[get_copy = "pub"]
    throwable: Option<ClassID>,

    /// The root of checked exceptions.
    #[get_copy = "pub"]
    exception: Option<ClassID>,

    /// The root of unchecked exceptions; the throws-position fallback.
    #[get_copy = "pub"]
    runtime_exception: Option<ClassID>,
}

/// An error raised while declaring classes.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error,
)]
#[allow(missing_docs)]
pub enum DeclarationError {
    #[error("the class {0:?} is not declared in this table")]
    UnknownClass(ClassID),

    #[error("the type parameter {0:?} is not declared in this table")]
    UnknownTypeParameter(TypeParameterID),

    #[error(
        "the supertype {class:?} expects {expected} type arguments but \
         {found} were supplied"
    )]
    ArityMismatch { class: ClassID, expected: usize, found: usize },

    #[error("the class `{0}` is already declared")]
    DuplicatedClass(String),

    #[error("the class {0:?} would become its own supertype")]
    CyclicInheritance(ClassID),
}

/// The declarations of every class and type parameter visible to the
/// inference engine.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Table {
    /// The declared classes.
    #[get = "pub"]
    classes: Arena<Class>,

    /// The declared type parameters.
    #[get = "pub"]
    type_parameters: Arena<TypeParameter>,

    /// The well-known classes.
    #[get_copy = "pub"]
    well_known: WellKnown,
}

impl Default for Table {
    fn default() -> Self { Self::new() }
}

impl Table {
    /// Creates a table containing only `Object`.
    #[must_use]
    pub fn new() -> Self {
        let mut classes = Arena::new();
        let object = classes.insert(Class {
            name: "Object".to_string(),
            parameters: Vec::new(),
            supertypes: Vec::new(),
        });

        Self {
            classes,
            type_parameters: Arena::new(),
            well_known: WellKnown {
                object,
                throwable: None,
                exception: None,
                runtime_exception: None,
            },
        }
    }

    /// The id of `Object`.
    #[must_use]
    pub const fn object(&self) -> ClassID { self.well_known.object }

    /// The type `Object`.
    #[must_use]
    pub fn object_type(&self) -> Type { Type::class(self.object(), []) }

    /// Declares a new type parameter with the given upper bounds.
    pub fn add_type_parameter(
        &mut self,
        name: impl Into<String>,
        bounds: Vec<Type>,
    ) -> TypeParameterID {
        self.type_parameters
            .insert(TypeParameter { name: name.into(), bounds })
    }

    /// Replaces the bounds of a declared type parameter. Allows F-bounded
    /// declarations such as `T extends Comparable<T>`.
    ///
    /// # Errors
    ///
    /// Returns [`DeclarationError::UnknownTypeParameter`] if the id is not
    /// from this table.
    pub fn set_type_parameter_bounds(
        &mut self,
        id: TypeParameterID,
        bounds: Vec<Type>,
    ) -> Result<(), DeclarationError> {
        let parameter = self
            .type_parameters
            .get_mut(id)
            .ok_or(DeclarationError::UnknownTypeParameter(id))?;

        parameter.bounds = bounds;
        Ok(())
    }

    /// Declares a new class. A class without supertypes extends `Object`.
    ///
    /// # Errors
    ///
    /// See [`DeclarationError`] for the rejected declarations.
    pub fn add_class(
        &mut self,
        name: impl Into<String>,
        parameters: Vec<TypeParameterID>,
        mut supertypes: Vec<r#type::Class>,
    ) -> Result<ClassID, DeclarationError> {
        let name = name.into();
        if self.find_class(&name).is_some() {
            return Err(DeclarationError::DuplicatedClass(name));
        }

        if let Some(parameter) =
            parameters.iter().find(|x| !self.type_parameters.contains(**x))
        {
            return Err(DeclarationError::UnknownTypeParameter(*parameter));
        }

        self.validate_supertypes(&supertypes)?;

        if supertypes.is_empty() {
            supertypes.push(r#type::Class::new(self.object(), Vec::new()));
        }

        Ok(self.classes.insert(Class { name, parameters, supertypes }))
    }

    /// Replaces the direct supertypes of a declared class. Allows
    /// declarations that mention the class itself, such as
    /// `Integer extends Comparable<Integer>`.
    ///
    /// # Errors
    ///
    /// See [`DeclarationError`] for the rejected declarations.
    pub fn set_supertypes(
        &mut self,
        id: ClassID,
        mut supertypes: Vec<r#type::Class>,
    ) -> Result<(), DeclarationError> {
        self.validate_supertypes(&supertypes)?;

        if supertypes.is_empty() {
            supertypes.push(r#type::Class::new(self.object(), Vec::new()));
        }

        if id == self.object()
            || supertypes.iter().any(|x| self.is_subclass(x.id, id))
        {
            return Err(DeclarationError::CyclicInheritance(id));
        }

        self.classes
            .get_mut(id)
            .ok_or(DeclarationError::UnknownClass(id))?
            .supertypes = supertypes;

        Ok(())
    }

    fn is_subclass(&self, sub: ClassID, sup: ClassID) -> bool {
        let mut stack = vec![sub];
        let mut visited = std::collections::BTreeSet::new();

        while let Some(id) = stack.pop() {
            if id == sup {
                return true;
            }

            if visited.insert(id) {
                if let Some(class) = self.classes.get(id) {
                    stack.extend(class.supertypes.iter().map(|x| x.id));
                }
            }
        }

        false
    }

    fn validate_supertypes(
        &self,
        supertypes: &[r#type::Class],
    ) -> Result<(), DeclarationError> {
        for supertype in supertypes {
            let class = self
                .classes
                .get(supertype.id)
                .ok_or(DeclarationError::UnknownClass(supertype.id))?;

            if !supertype.arguments.is_empty()
                && supertype.arguments.len() != class.parameters.len()
            {
                return Err(DeclarationError::ArityMismatch {
                    class: supertype.id,
                    expected: class.parameters.len(),
                    found: supertype.arguments.len(),
                });
            }
        }

        Ok(())
    }

    /// Marks the given classes as the roots of the exception hierarchy.
    pub fn set_exception_classes(
        &mut self,
        throwable: ClassID,
        exception: ClassID,
        runtime_exception: ClassID,
    ) {
        self.well_known.throwable = Some(throwable);
        self.well_known.exception = Some(exception);
        self.well_known.runtime_exception = Some(runtime_exception);
    }

    /// Gets the class declaration.
    #[must_use]
    pub fn class(&self, id: ClassID) -> Option<&Class> { self.classes.get(id) }

    /// Gets the type parameter declaration.
    #[must_use]
    pub fn type_parameter(&self, id: TypeParameterID) -> Option<&TypeParameter> {
        self.type_parameters.get(id)
    }

    /// Looks up a class by its name.
    #[must_use]
    pub fn find_class(&self, name: &str) -> Option<ClassID> {
        self.classes.iter().find(|(_, x)| x.name == name).map(|(id, _)| id)
    }
}
