//! Arbitrary implementations for [`ID`].

use proptest::prelude::{Arbitrary, BoxedStrategy, Strategy};

use crate::ID;

/// Identifiers are drawn from a small range so that generated ids collide
/// often enough to exercise ordering and deduplication.
const MAX_ARBITRARY_INDEX: usize = 1024;

impl<T: 'static> Arbitrary for ID<T> {
    type Strategy = BoxedStrategy<Self>;
    type Parameters = ();

    fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
        (0..MAX_ARBITRARY_INDEX).prop_map(Self::new).boxed()
    }
}
