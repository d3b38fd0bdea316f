/// Something that hands out fresh values, one after the other.
pub trait Identifier {
    type Value;
    fn next(&mut self) -> Self::Value;
}

/// The `Counter` stamps each message appended to the [`crate::MessageStore`] with a sequence
/// number.  The first message gets `1`, and nothing ever gets the same number twice, which gives
/// tests an easy way to check that reveals come out in the order messages went in.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Deref,
    derive_more::DerefMut,
)]
pub struct Counter(u64);

impl Identifier for Counter {
    type Value = u64;
    fn next(&mut self) -> Self::Value {
        self.0 += 1;
        self.0
    }
}
