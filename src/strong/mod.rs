use num_traits::int::PrimInt;
use num_traits::{FromPrimitive, ToPrimitive};

pub use index_derive::IndexBase;
use derive_more::Display;
use serde::Serialize;

/// Base derivable trait for indexing with new types of integers
pub trait IndexBase {
    /// Underlying type
    type Type : PrimInt + ToPrimitive + FromPrimitive;

    /// Access the underlying type
    fn get(&self) -> Self::Type;
}

/// Collective trait used for indexing
pub trait Index:
    IndexBase
    + Copy
    + From<<Self as IndexBase>::Type>
    + Into<<Self as IndexBase>::Type>
    + PartialEq
{
    /// Return a range with self as the upper bound
    fn range(bound: <Self as IndexBase>::Type) -> Range<Self>;

    /// Position in a plain container
    fn position(&self) -> usize {
        self.get().to_usize().unwrap_or(usize::MAX)
    }
}

impl<T> Index for T where T: IndexBase
    + Copy
    + From<<Self as IndexBase>::Type>
    + Into<<Self as IndexBase>::Type>
    + PartialEq
{
    fn range(bound: <Self as IndexBase>::Type) -> Range<Self> {
        let start = <<T as IndexBase>::Type as num_traits::identities::Zero>::zero();
        Range {start, end: bound}
    }
}

/// Range generating Index Items
pub struct Range<I: Index> {
    start: <I as IndexBase>::Type,
    end: <I as IndexBase>::Type
}

impl<I: Index> Iterator for Range<I> {
    type Item = I;

    fn next(&mut self) -> Option<Self::Item> {
        if self.start >= self.end {
            None
        } else {
            let value = self.start;
            self.start = self.start + <<I as IndexBase>::Type as num_traits::identities::One>::one();
            Some(Into::into(value))
        }
    }
}

/// Position matrices indexed by new types
pub mod matrix;

/// Nucleus is an index referring to a heavy atom of a ligand and simultaneously
/// a vertex of its molecular graph
#[derive(IndexBase, Display, Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nucleus(pub usize);
