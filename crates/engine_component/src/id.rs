//! Identifier kinds and their allocator.
//!
//! Every identifier in the world is a `u64` newtype. Zero is reserved as the
//! "absent" sentinel, so allocation starts at 1 and only ever counts up.

use std::marker::PhantomData;

/// Conversion from the raw counter value into a typed identifier.
pub trait RawId: Copy {
    /// Wrap a raw counter value.
    fn from_u64(id: u64) -> Self;
}

/// Declare a `u64` identifier newtype with the shared accessors.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            /// The null / invalid sentinel.
            pub const INVALID: $name = $name(0);

            /// Create an identifier from a raw `u64`.
            #[must_use]
            pub const fn from_raw(id: u64) -> Self {
                Self(id)
            }

            /// Returns the raw `u64` identifier.
            #[must_use]
            pub const fn id(self) -> u64 {
                self.0
            }

            /// Returns `true` if this is a valid (non-zero) identifier.
            #[must_use]
            pub const fn is_valid(self) -> bool {
                self.0 != 0
            }
        }

        impl $crate::id::RawId for $name {
            fn from_u64(id: u64) -> Self {
                Self(id)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }
    };
}

pub(crate) use define_id;

define_id!(
    /// Identifies a group: a shared component table with a member set.
    GroupId,
    "Group"
);

define_id!(
    /// Identifies a captured snapshot of world state.
    SnapshotId,
    "Snapshot"
);

/// Allocates monotonically increasing identifiers of one kind.
///
/// Each world owns one allocator per identifier kind. IDs are never recycled,
/// so a despawned entity's id can never come back from [`IdAllocator::allocate`].
#[derive(Debug)]
pub struct IdAllocator<I> {
    next_id: u64,
    _kind: PhantomData<fn() -> I>,
}

impl<I: RawId> IdAllocator<I> {
    /// Creates a new allocator. IDs start at 1 (0 is reserved for `INVALID`).
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            _kind: PhantomData,
        }
    }

    /// Allocates a fresh identifier.
    pub fn allocate(&mut self) -> I {
        let id = self.next_id;
        self.next_id += 1;
        I::from_u64(id)
    }

    /// Returns the number of identifiers allocated so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next_id - 1
    }
}

impl<I: RawId> Default for IdAllocator<I> {
    fn default() -> Self {
        Self::new()
    }
}
