use std::fmt::Display;

use crate::{MetapathId, SourceId, TargetId};

/// The unit of work: one (source, target, metapath) combination
///
/// Each triple is scored at most once and stored at most once
/// in a [`ResultTable`](crate::ResultTable).
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Triple {
    source: SourceId,
    target: TargetId,
    metapath: MetapathId,
}

impl Triple {
    /// Constructs a new triple
    pub fn new(source: SourceId, target: TargetId, metapath: MetapathId) -> Self {
        Self {
            source,
            target,
            metapath,
        }
    }

    /// The Biological Process
    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// The Gene
    pub fn target(&self) -> &TargetId {
        &self.target
    }

    /// The metapath connecting source and target
    pub fn metapath(&self) -> &MetapathId {
        &self.metapath
    }
}

impl<S, T, M> From<(S, T, M)> for Triple
where
    S: Into<SourceId>,
    T: Into<TargetId>,
    M: Into<MetapathId>,
{
    fn from((source, target, metapath): (S, T, M)) -> Self {
        Self::new(source.into(), target.into(), metapath.into())
    }
}

impl Display for Triple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.source, self.target, self.metapath)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        let triple = Triple::from(("BP1", "G1", "M1"));
        assert_eq!(triple.to_string(), "(BP1, G1, M1)");
        assert!(triple.metapath() == "M1");
    }
}
