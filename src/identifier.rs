//! Opaque identifiers for the nodes and metapaths of the hetnet
//!
//! Sources ([`SourceId`]) are Biological Processes, targets ([`TargetId`])
//! are Genes and [`MetapathId`]s name a typed relational pattern between them,
//! e.g. `BPpGdAdG`.
//!
//! All identifiers wrap an `Arc<str>`, so cloning them while enumerating
//! millions of triples does not copy the underlying string.

use core::fmt::Debug;
use core::hash::Hash;
use std::fmt::Display;
use std::sync::Arc;

mod list;
pub use list::{IdentifierList, Iter};

/// All identifiers are defined by a unique, non-empty string
///
/// The ID must be unique only within its own list, i.e. a source and
/// a target can use the same value.
pub trait Identifier:
    Clone + Debug + Display + Hash + PartialEq + Eq + PartialOrd + Ord + From<&'static str>
{
    /// The name of the list that holds this kind of identifier, used in errors and logs
    const KIND: &'static str;

    /// Creates a new identifier from a string
    fn new(value: &str) -> Self;

    /// The string representation of the identifier
    fn as_str(&self) -> &str;
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name {
            inner: Arc<str>,
        }

        impl Identifier for $name {
            const KIND: &'static str = $kind;

            fn new(value: &str) -> Self {
                Self {
                    inner: Arc::from(value),
                }
            }

            fn as_str(&self) -> &str {
                &self.inner
            }
        }

        impl From<&'static str> for $name {
            fn from(value: &'static str) -> Self {
                <Self as Identifier>::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self {
                    inner: Arc::from(value),
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.inner)
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.inner)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                &*self.inner == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                &*self.inner == *other
            }
        }
    };
}

identifier!(
    /// A unique identifier of a Biological Process, e.g. `GO:0000002`
    SourceId,
    "source"
);

identifier!(
    /// A unique identifier of a Gene, most likely the Entrez Gene ID
    TargetId,
    "target"
);

identifier!(
    /// The abbreviation of a metapath, e.g. `BPpGdAdG`
    MetapathId,
    "metapath"
);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_and_debug() {
        let id = SourceId::from("GO:0000002");
        assert_eq!(id.to_string(), "GO:0000002");
        assert_eq!(format!("{id:?}"), "SourceId(GO:0000002)");
    }

    #[test]
    fn compare_to_str() {
        let id = MetapathId::from("BPpGdAdG");
        assert!(id == "BPpGdAdG");
        assert_eq!(id.as_str(), "BPpGdAdG");
    }

    #[test]
    fn cheap_clones_share_data() {
        let id = TargetId::from(String::from("1"));
        let other = id.clone();
        assert_eq!(id, other);
        assert!(std::ptr::eq(id.as_str(), other.as_str()));
    }
}
