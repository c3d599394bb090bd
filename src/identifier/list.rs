use std::collections::HashSet;

use tracing::debug;

use crate::identifier::Identifier;
use crate::{GatherError, GatherResult};

/// An ordered list of unique identifiers
///
/// The list keeps the order in which the identifiers were loaded, since
/// the enumeration order of all triples depends on it. Each identifier
/// can occur only once; a duplicate indicates an upstream data problem
/// and is rejected instead of being silently removed.
///
/// A list is never empty.
#[derive(Debug, Clone)]
pub struct IdentifierList<T> {
    ids: Vec<T>,
    index: HashSet<T>,
}

impl<T: Identifier> IdentifierList<T> {
    /// Constructs a new list from the identifiers in the given order
    ///
    /// # Errors
    ///
    /// - [`GatherError::EmptyList`]: `ids` does not contain any identifier
    /// - [`GatherError::DuplicateIdentifier`]: An identifier occurs more than once
    ///
    /// # Examples
    ///
    /// ```
    /// use hetgather::{IdentifierList, SourceId};
    ///
    /// let sources = IdentifierList::<SourceId>::try_new(["BP1".into(), "BP2".into()]).unwrap();
    /// assert_eq!(sources.len(), 2);
    ///
    /// assert!(IdentifierList::<SourceId>::try_new(["BP1".into(), "BP1".into()]).is_err());
    /// assert!(IdentifierList::<SourceId>::try_new(Vec::new()).is_err());
    /// ```
    pub fn try_new<I: IntoIterator<Item = T>>(ids: I) -> GatherResult<Self> {
        let iter = ids.into_iter();
        let mut list = Self {
            ids: Vec::with_capacity(iter.size_hint().0),
            index: HashSet::with_capacity(iter.size_hint().0),
        };
        for id in iter {
            if !list.index.insert(id.clone()) {
                return Err(GatherError::DuplicateIdentifier {
                    list: T::KIND,
                    id: id.to_string(),
                });
            }
            list.ids.push(id);
        }
        if list.ids.is_empty() {
            return Err(GatherError::EmptyList(T::KIND));
        }
        debug!("Loaded {} {} identifiers", list.len(), T::KIND);
        Ok(list)
    }

    /// Returns `true` if the list contains the identifier
    pub fn contains(&self, id: &T) -> bool {
        self.index.contains(id)
    }
}

impl<T> IdentifierList<T> {
    /// Returns the number of identifiers in the list
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always `false`, lists are never empty
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns an Iterator of the identifiers in load order
    pub fn iter(&self) -> Iter<'_, T> {
        self.ids.iter()
    }

    /// The identifiers as a slice, in load order
    pub fn as_slice(&self) -> &[T] {
        &self.ids
    }
}

/// Iterator of the identifiers of an [`IdentifierList`]
pub type Iter<'a, T> = std::slice::Iter<'a, T>;

impl<'a, T> IntoIterator for &'a IdentifierList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ErrorKind, TargetId};

    #[test]
    fn keeps_load_order() {
        let list = IdentifierList::<TargetId>::try_new(["G3".into(), "G1".into(), "G2".into()])
            .expect("valid list");
        let ids: Vec<&str> = list.iter().map(Identifier::as_str).collect();
        assert_eq!(ids, ["G3", "G1", "G2"]);
        assert!(list.contains(&"G1".into()));
        assert!(!list.contains(&"G4".into()));
    }

    #[test]
    fn rejects_duplicates() {
        let err = IdentifierList::<TargetId>::try_new(["G1".into(), "G2".into(), "G1".into()])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
        match err {
            GatherError::DuplicateIdentifier { list, id } => {
                assert_eq!(list, "target");
                assert_eq!(id, "G1");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn rejects_empty() {
        let err = IdentifierList::<TargetId>::try_new(Vec::new()).unwrap_err();
        assert!(matches!(err, GatherError::EmptyList("target")));
    }
}
