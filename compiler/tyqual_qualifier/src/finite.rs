//! Contains the definition of [`FiniteHierarchy`], a [`Hierarchy`] given by
//! an explicit finite set of elements and their direct subtype edges.

use getset::Getters;

use crate::{Element, Hierarchy};

/// An error raised while building a [`FiniteHierarchy`].
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error,
)]
#[allow(missing_docs)]
pub enum FiniteHierarchyError {
    #[error("the hierarchy `{0}` has no elements")]
    Empty(String),

    #[error("the element `{0}` is declared more than once")]
    DuplicatedElement(String),

    #[error("the element `{first}` and `{second}` are subtypes of each other")]
    Cycle { first: String, second: String },

    #[error("the hierarchy `{0}` has no unique top element")]
    NoTop(String),

    #[error("the hierarchy `{0}` has no unique bottom element")]
    NoBottom(String),

    #[error("the element {0} was not declared by this builder")]
    UnknownElement(Element),
}

/// Incrementally declares the elements and edges of a [`FiniteHierarchy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Builder {
    name: String,
    elements: Vec<String>,
    edges: Vec<(Element, Element)>,
    default_qualifier: Option<Element>,
}

impl Builder {
    /// Starts a new hierarchy with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
            edges: Vec::new(),
            default_qualifier: None,
        }
    }

    /// Declares a new element.
    pub fn element(&mut self, name: impl Into<String>) -> Element {
        self.elements.push(name.into());
        Element(self.elements.len() - 1)
    }

    /// Declares that `sub` is directly below `sup`.
    pub fn subtype(&mut self, sub: Element, sup: Element) -> &mut Self {
        self.edges.push((sub, sup));
        self
    }

    /// Sets the qualifier of unconstrained types. Defaults to the top.
    pub fn default_qualifier(&mut self, element: Element) -> &mut Self {
        self.default_qualifier = Some(element);
        self
    }

    /// Computes the order and validates that the declared elements form a
    /// bounded partial order.
    ///
    /// # Errors
    ///
    /// See [`FiniteHierarchyError`] for the rejected shapes.
    pub fn build(self) -> Result<FiniteHierarchy, FiniteHierarchyError> {
        let count = self.elements.len();
        if count == 0 {
            return Err(FiniteHierarchyError::Empty(self.name));
        }

        for (index, name) in self.elements.iter().enumerate() {
            if self.elements[..index].contains(name) {
                return Err(FiniteHierarchyError::DuplicatedElement(
                    name.clone(),
                ));
            }
        }

        // reflexive-transitive closure of the declared edges
        let mut order = vec![vec![false; count]; count];
        for (index, row) in order.iter_mut().enumerate() {
            row[index] = true;
        }
        for (sub, sup) in &self.edges {
            for element in [sub, sup] {
                if element.0 >= count {
                    return Err(FiniteHierarchyError::UnknownElement(*element));
                }
            }

            order[sub.0][sup.0] = true;
        }
        for k in 0..count {
            for i in 0..count {
                if !order[i][k] {
                    continue;
                }
                for j in 0..count {
                    if order[k][j] {
                        order[i][j] = true;
                    }
                }
            }
        }

        for i in 0..count {
            for j in (i + 1)..count {
                if order[i][j] && order[j][i] {
                    return Err(FiniteHierarchyError::Cycle {
                        first: self.elements[i].clone(),
                        second: self.elements[j].clone(),
                    });
                }
            }
        }

        let Some(top) = (0..count).find(|&t| (0..count).all(|x| order[x][t]))
        else {
            return Err(FiniteHierarchyError::NoTop(self.name));
        };
        let Some(bottom) =
            (0..count).find(|&b| (0..count).all(|x| order[b][x]))
        else {
            return Err(FiniteHierarchyError::NoBottom(self.name));
        };

        Ok(FiniteHierarchy {
            default_qualifier: self.default_qualifier.unwrap_or(Element(top)),
            name: self.name,
            elements: self.elements,
            order,
            top: Element(top),
            bottom: Element(bottom),
        })
    }
}

/// A bounded partial order over a finite set of named qualifiers.
///
/// Pairs without a unique join or meet are allowed; [`Hierarchy::lub`] and
/// [`Hierarchy::glb`] report them as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct FiniteHierarchy {
    name: String,

    /// The names of the elements, indexed by [`Element`].
    #[get = "pub"]
    elements: Vec<String>,

    order: Vec<Vec<bool>>,

    top: Element,
    bottom: Element,
    default_qualifier: Element,
}

impl FiniteHierarchy {
    /// Starts building a new hierarchy.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> Builder { Builder::new(name) }

    /// Looks up an element by its name.
    #[must_use]
    pub fn element(&self, name: &str) -> Option<Element> {
        self.elements.iter().position(|x| x == name).map(Element)
    }

    fn contains(&self, element: Element) -> bool {
        element.0 < self.elements.len()
    }

    fn leq(&self, sub: Element, sup: Element) -> bool {
        self.contains(sub) && self.contains(sup) && self.order[sub.0][sup.0]
    }

    /// Picks the candidate that is related to every other candidate in the
    /// given direction.
    fn extremum(
        &self,
        candidates: &[Element],
        related: impl Fn(Element, Element) -> bool,
    ) -> Option<Element> {
        candidates
            .iter()
            .copied()
            .find(|&x| candidates.iter().all(|&y| related(x, y)))
    }
}

impl Hierarchy for FiniteHierarchy {
    fn name(&self) -> &str { &self.name }

    fn top(&self) -> Element { self.top }

    fn bottom(&self) -> Element { self.bottom }

    fn default_qualifier(&self) -> Element { self.default_qualifier }

    fn is_subtype(&self, sub: Element, sup: Element) -> bool {
        self.leq(sub, sup)
    }

    fn lub(&self, first: Element, second: Element) -> Option<Element> {
        if !self.contains(first) || !self.contains(second) {
            return None;
        }

        let upper_bounds = (0..self.elements.len())
            .map(Element)
            .filter(|&x| self.leq(first, x) && self.leq(second, x))
            .collect::<Vec<_>>();

        self.extremum(&upper_bounds, |x, y| self.leq(x, y))
    }

    fn glb(&self, first: Element, second: Element) -> Option<Element> {
        if !self.contains(first) || !self.contains(second) {
            return None;
        }

        let lower_bounds = (0..self.elements.len())
            .map(Element)
            .filter(|&x| self.leq(x, first) && self.leq(x, second))
            .collect::<Vec<_>>();

        self.extremum(&lower_bounds, |x, y| self.leq(y, x))
    }

    fn element_name(&self, element: Element) -> Option<&str> {
        self.elements.get(element.0).map(String::as_str)
    }
}
