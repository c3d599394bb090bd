//! The catalog of all known metapaths and the subset that must be ignored
//!
//! The metapaths that are actually gathered are the [`EffectiveMetapaths`],
//! i.e. all metapaths of the catalog that are not part of the [`IgnoreSet`].

use tracing::{debug, info};

use crate::config::ListFile;
use crate::identifier::{Identifier, IdentifierList};
use crate::parser::load_list;
use crate::{GatherError, GatherResult, MetapathId};

/// Metapaths that are excluded from gathering
///
/// Every metapath of the set must be part of the [`MetapathCatalog`],
/// otherwise [`MetapathCatalog::effective`] fails.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    metapaths: Option<IdentifierList<MetapathId>>,
}

impl IgnoreSet {
    /// An `IgnoreSet` that does not exclude any metapath
    pub fn none() -> Self {
        Self::default()
    }

    /// Constructs an `IgnoreSet` from a list of metapaths
    pub fn new(metapaths: IdentifierList<MetapathId>) -> Self {
        Self {
            metapaths: Some(metapaths),
        }
    }

    /// Loads the `IgnoreSet` from a CSV file
    ///
    /// # Errors
    ///
    /// See [`crate::parser::load_list`]. An ignore file without any
    /// metapath is an error as well.
    pub fn load(file: &ListFile) -> GatherResult<Self> {
        load_list(&file.path, &file.column).map(Self::new)
    }

    /// Returns `true` if the metapath must be ignored
    pub fn contains(&self, metapath: &MetapathId) -> bool {
        self.metapaths
            .as_ref()
            .is_some_and(|metapaths| metapaths.contains(metapath))
    }

    /// Returns the number of ignored metapaths
    pub fn len(&self) -> usize {
        self.metapaths.as_ref().map_or(0, IdentifierList::len)
    }

    /// Returns `true` if no metapath is ignored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an Iterator of the ignored metapaths
    pub fn iter(&self) -> impl Iterator<Item = &MetapathId> {
        self.metapaths.iter().flat_map(IdentifierList::iter)
    }
}

/// All known metapaths together with the metapaths to ignore
///
/// # Examples
///
/// ```
/// use hetgather::{IdentifierList, IgnoreSet, MetapathCatalog};
///
/// let catalog = MetapathCatalog::new(
///     IdentifierList::try_new(["M1".into(), "M2".into(), "M3".into()]).unwrap(),
///     IgnoreSet::new(IdentifierList::try_new(["M2".into()]).unwrap()),
/// );
///
/// let effective = catalog.effective().unwrap();
/// assert_eq!(effective.len(), 2);
/// assert!(!effective.contains(&"M2".into()));
/// ```
#[derive(Debug, Clone)]
pub struct MetapathCatalog {
    metapaths: IdentifierList<MetapathId>,
    ignore: IgnoreSet,
}

impl MetapathCatalog {
    /// Constructs a new catalog
    pub fn new(metapaths: IdentifierList<MetapathId>, ignore: IgnoreSet) -> Self {
        Self { metapaths, ignore }
    }

    /// Loads the catalog and the ignored metapaths from CSV files
    ///
    /// # Errors
    ///
    /// All errors of [`crate::parser::load_list`] for either file
    pub fn load(catalog: &ListFile, ignore: &ListFile) -> GatherResult<Self> {
        let metapaths = load_list(&catalog.path, &catalog.column)?;
        let ignore = IgnoreSet::load(ignore)?;
        Ok(Self::new(metapaths, ignore))
    }

    /// All metapaths of the catalog, in load order
    pub fn metapaths(&self) -> &IdentifierList<MetapathId> {
        &self.metapaths
    }

    /// The ignored metapaths
    pub fn ignore_set(&self) -> &IgnoreSet {
        &self.ignore
    }

    /// Replaces the ignored metapaths
    pub fn set_ignore_set(&mut self, ignore: IgnoreSet) {
        self.ignore = ignore;
    }

    /// Returns the metapaths that should be gathered: The catalog without the ignored metapaths
    ///
    /// The effective metapaths keep the order of the catalog and
    /// can be empty, if all metapaths are ignored.
    ///
    /// # Errors
    ///
    /// [`GatherError::UnknownIgnoredMetapath`] if a metapath of the [`IgnoreSet`]
    /// is not part of the catalog. This usually means that the ignore list is
    /// out of sync with the catalog.
    pub fn effective(&self) -> GatherResult<EffectiveMetapaths> {
        if let Some(unknown) = self.ignore.iter().find(|m| !self.metapaths.contains(m)) {
            return Err(GatherError::UnknownIgnoredMetapath(unknown.clone()));
        }
        let metapaths: Vec<MetapathId> = self
            .metapaths
            .iter()
            .filter(|m| !self.ignore.contains(m))
            .cloned()
            .collect();
        info!(
            "Using {} of {} metapaths ({} ignored)",
            metapaths.len(),
            self.metapaths.len(),
            self.ignore.len()
        );
        Ok(EffectiveMetapaths { metapaths })
    }
}

/// The metapaths of the catalog that are not ignored, in catalog order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveMetapaths {
    metapaths: Vec<MetapathId>,
}

impl EffectiveMetapaths {
    /// Narrows the metapaths down to the given subset
    ///
    /// The order of the catalog is kept, not the order of `subset`.
    ///
    /// # Errors
    ///
    /// [`GatherError::UnknownMetapath`] if a metapath of `subset` is
    /// not part of the effective metapaths, e.g. because it is ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use hetgather::{IdentifierList, IgnoreSet, MetapathCatalog, MetapathId};
    ///
    /// let catalog = MetapathCatalog::new(
    ///     IdentifierList::try_new(["BPpGiG".into(), "BPpGdAdG".into()]).unwrap(),
    ///     IgnoreSet::none(),
    /// );
    ///
    /// let subset = catalog
    ///     .effective()
    ///     .unwrap()
    ///     .restrict_to(&[MetapathId::from("BPpGdAdG")])
    ///     .unwrap();
    /// assert_eq!(subset.len(), 1);
    /// ```
    pub fn restrict_to(&self, subset: &[MetapathId]) -> GatherResult<Self> {
        if let Some(unknown) = subset.iter().find(|m| !self.contains(m)) {
            return Err(GatherError::UnknownMetapath(unknown.clone()));
        }
        let metapaths: Vec<MetapathId> = self
            .metapaths
            .iter()
            .filter(|m| subset.contains(m))
            .cloned()
            .collect();
        debug!("Restricted metapaths to {}", metapaths.len());
        Ok(Self { metapaths })
    }

    /// Returns `true` if the metapath is part of the effective metapaths
    pub fn contains(&self, metapath: &MetapathId) -> bool {
        self.metapaths.contains(metapath)
    }

    /// Returns the number of metapaths
    pub fn len(&self) -> usize {
        self.metapaths.len()
    }

    /// Returns `true` if all metapaths were ignored
    pub fn is_empty(&self) -> bool {
        self.metapaths.is_empty()
    }

    /// Returns an Iterator of the metapaths in catalog order
    pub fn iter(&self) -> std::slice::Iter<'_, MetapathId> {
        self.metapaths.iter()
    }

    /// The metapaths as a slice, in catalog order
    pub fn as_slice(&self) -> &[MetapathId] {
        &self.metapaths
    }
}

impl<'a> IntoIterator for &'a EffectiveMetapaths {
    type Item = &'a MetapathId;
    type IntoIter = std::slice::Iter<'a, MetapathId>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Shows the metapaths that are ignored, mostly for debugging
impl std::fmt::Display for IgnoreSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.iter().map(Identifier::as_str).collect();
        write!(f, "[{}]", ids.join(", "))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ErrorKind;

    fn list(ids: &[&'static str]) -> IdentifierList<MetapathId> {
        IdentifierList::try_new(ids.iter().map(|id| MetapathId::from(*id))).unwrap()
    }

    #[test]
    fn effective_excludes_ignored() {
        let catalog = MetapathCatalog::new(
            list(&["M1", "M2", "M3", "M4"]),
            IgnoreSet::new(list(&["M3", "M1"])),
        );
        let effective = catalog.effective().unwrap();
        assert_eq!(effective.as_slice(), &[MetapathId::from("M2"), MetapathId::from("M4")]);
        for ignored in catalog.ignore_set().iter() {
            assert!(!effective.contains(ignored));
        }
        for m in &effective {
            assert!(catalog.metapaths().contains(m));
        }
    }

    #[test]
    fn nothing_ignored() {
        let catalog = MetapathCatalog::new(list(&["M1", "M2"]), IgnoreSet::none());
        assert_eq!(catalog.effective().unwrap().len(), 2);
    }

    #[test]
    fn all_ignored() {
        let catalog = MetapathCatalog::new(
            list(&["M1", "M2"]),
            IgnoreSet::new(list(&["M2", "M1"])),
        );
        assert!(catalog.effective().unwrap().is_empty());
    }

    #[test]
    fn unknown_ignored_metapath() {
        let catalog = MetapathCatalog::new(
            list(&["M1", "M2"]),
            IgnoreSet::new(list(&["M2", "M9"])),
        );
        let err = catalog.effective().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(matches!(err, GatherError::UnknownIgnoredMetapath(ref m) if m == "M9"));
    }

    #[test]
    fn recomputed_after_ignore_change() {
        let mut catalog = MetapathCatalog::new(list(&["M1", "M2"]), IgnoreSet::none());
        assert_eq!(catalog.effective().unwrap().len(), 2);
        catalog.set_ignore_set(IgnoreSet::new(list(&["M1"])));
        assert_eq!(catalog.effective().unwrap().as_slice(), &[MetapathId::from("M2")]);
    }

    #[test]
    fn restrict_keeps_catalog_order() {
        let catalog = MetapathCatalog::new(
            list(&["M1", "M2", "M3"]),
            IgnoreSet::new(list(&["M2"])),
        );
        let effective = catalog.effective().unwrap();
        let subset = effective
            .restrict_to(&["M3".into(), "M1".into()])
            .unwrap();
        assert_eq!(subset.as_slice(), &[MetapathId::from("M1"), MetapathId::from("M3")]);

        let err = effective.restrict_to(&["M2".into()]).unwrap_err();
        assert!(matches!(err, GatherError::UnknownMetapath(_)));
    }

    #[test]
    fn display_ignore_set() {
        assert_eq!(IgnoreSet::new(list(&["M1", "M2"])).to_string(), "[M1, M2]");
        assert_eq!(IgnoreSet::none().to_string(), "[]");
    }
}
