use derive_more::{From, Into, Display};

/// Integer handle into one of the model arenas
pub trait Index:
    Copy
    + From<usize>
    + Into<usize>
    + PartialEq
{
    /// Access the underlying position in the arena
    fn get(&self) -> usize {
        (*self).into()
    }

    /// Return a range with self as the upper bound
    fn range(bound: usize) -> Range<Self> {
        Range {start: 0, end: bound, index_type: std::marker::PhantomData}
    }
}

/// Range generating Index Items
pub struct Range<I: Index> {
    start: usize,
    end: usize,
    index_type: std::marker::PhantomData<I>
}

impl<I: Index> Iterator for Range<I> {
    type Item = I;

    fn next(&mut self) -> Option<Self::Item> {
        if self.start >= self.end {
            None
        } else {
            let value = self.start;
            self.start += 1;
            Some(I::from(value))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.start);
        (remaining, Some(remaining))
    }
}

impl<I: Index> ExactSizeIterator for Range<I> {}

/// Position of a vertex in a model's vertex arena
#[derive(From, Into, Display, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexIndex(usize);

impl Index for VertexIndex {}

/// Position of a link in a model's link arena
#[derive(From, Into, Display, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkIndex(usize);

impl Index for LinkIndex {}
