//! Catalog resolver: search a backend and flag candidates already held.

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::constants::limits::{EXISTENCE_CHECK_CONCURRENCY, MAX_LOOKUP_RESULTS};
use crate::domain::{Candidate, ExternalKey, MediaKind};
use crate::error::{RequestError, RequestResult};
use crate::services::backends::Backends;

/// How the collection and library sets combine into the "already held" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Held if either the collection or the library has it.
    Union,
    /// Held only if both have it.
    Intersection,
}

impl DedupPolicy {
    #[must_use]
    pub const fn for_kind(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Movie => Self::Union,
            MediaKind::Series => Self::Intersection,
        }
    }
}

/// Keys found in the target collection and in the media library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldSets {
    pub collection: HashSet<ExternalKey>,
    pub library: HashSet<ExternalKey>,
}

impl HeldSets {
    /// Pure function of the candidate's keys and the two sets.
    #[must_use]
    pub fn is_held(&self, keys: &[ExternalKey], policy: DedupPolicy) -> bool {
        keys.iter().any(|key| {
            let in_collection = self.collection.contains(key);
            let in_library = self.library.contains(key);
            match policy {
                DedupPolicy::Union => in_collection || in_library,
                DedupPolicy::Intersection => in_collection && in_library,
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCandidate {
    pub candidate: Candidate,
    pub already_held: bool,
}

#[derive(Debug, Default)]
struct CheckOutcome {
    keys: Vec<ExternalKey>,
    in_collection: bool,
    in_library: bool,
}

#[derive(Debug, Clone)]
pub struct CatalogResolver {
    backends: Backends,
    check_limit: usize,
}

impl CatalogResolver {
    #[must_use]
    pub const fn new(backends: Backends, check_limit: usize) -> Self {
        Self {
            backends,
            check_limit,
        }
    }

    /// Searches the backend for `kind` and flags candidates already held.
    ///
    /// Existence checks run for the first `check_limit` results only and
    /// every check failure counts as "not found".
    ///
    /// # Errors
    ///
    /// - [`RequestError::NotFound`] when the lookup returns nothing
    /// - [`RequestError::Backend`] when the lookup itself fails
    /// - [`RequestError::NotConfigured`] for series without a series backend
    pub async fn search(
        &self,
        query: &str,
        kind: MediaKind,
    ) -> RequestResult<Vec<ResolvedCandidate>> {
        let mut candidates = match kind {
            MediaKind::Movie => self
                .backends
                .movies
                .lookup(query)
                .await
                .map_err(RequestError::movies)?,
            MediaKind::Series => self
                .backends
                .series()?
                .lookup(query)
                .await
                .map_err(RequestError::series)?,
        };
        candidates.truncate(MAX_LOOKUP_RESULTS);

        if candidates.is_empty() {
            let msg = match kind {
                MediaKind::Movie => "No movies found.",
                MediaKind::Series => "No series found.",
            };
            return Err(RequestError::not_found(msg));
        }

        let held = self.held_sets(kind, &candidates).await;
        let policy = DedupPolicy::for_kind(kind);
        info!(
            query,
            kind = %kind,
            results = candidates.len(),
            in_collection = held.collection.len(),
            in_library = held.library.len(),
            "Resolved catalog search"
        );

        Ok(candidates
            .into_iter()
            .map(|candidate| {
                let already_held = held.is_held(&candidate.ids.keys(kind), policy);
                ResolvedCandidate {
                    candidate,
                    already_held,
                }
            })
            .collect())
    }

    /// Runs the bounded existence checks and collects the two key sets.
    pub async fn held_sets(&self, kind: MediaKind, candidates: &[Candidate]) -> HeldSets {
        let outcomes: Vec<CheckOutcome> = stream::iter(candidates.iter().take(self.check_limit))
            .map(|candidate| self.check(kind, candidate))
            .buffered(EXISTENCE_CHECK_CONCURRENCY)
            .collect()
            .await;

        let mut held = HeldSets::default();
        for outcome in outcomes {
            if outcome.in_collection {
                held.collection.extend(outcome.keys.iter().copied());
            }
            if outcome.in_library {
                held.library.extend(outcome.keys.iter().copied());
            }
        }
        held
    }

    async fn check(&self, kind: MediaKind, candidate: &Candidate) -> CheckOutcome {
        let keys = candidate.ids.keys(kind);
        if keys.is_empty() {
            return CheckOutcome::default();
        }

        let in_collection = match self.in_collection(kind, candidate).await {
            Ok(found) => found,
            Err(e) => {
                debug!(title = %candidate.title, error = %e, "Collection existence check failed");
                false
            }
        };

        let in_library = match &self.backends.library {
            Some(library) => match library.exists(kind, candidate).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(title = %candidate.title, error = %e, "Library existence check failed");
                    false
                }
            },
            None => false,
        };

        CheckOutcome {
            keys,
            in_collection,
            in_library,
        }
    }

    async fn in_collection(&self, kind: MediaKind, candidate: &Candidate) -> anyhow::Result<bool> {
        match kind {
            MediaKind::Movie => match candidate.ids.tmdb_id.filter(|id| *id > 0) {
                Some(tmdb) => Ok(self
                    .backends
                    .movies
                    .get_by_external_id(tmdb)
                    .await?
                    .is_some()),
                None => Ok(false),
            },
            MediaKind::Series => match &self.backends.series {
                Some(series) => Ok(series.get_by_external_ids(&candidate.ids).await?.is_some()),
                None => Ok(false),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_flags_any_overlap() {
        let key = ExternalKey::Tmdb(27205);
        let held = HeldSets {
            collection: HashSet::from([key]),
            library: HashSet::from([key]),
        };
        assert!(held.is_held(&[key], DedupPolicy::Union));

        let only_library = HeldSets {
            collection: HashSet::new(),
            library: HashSet::from([key]),
        };
        assert!(only_library.is_held(&[key], DedupPolicy::Union));
        assert!(!only_library.is_held(&[ExternalKey::Tmdb(1)], DedupPolicy::Union));
    }

    #[test]
    fn test_intersection_requires_both() {
        let key = ExternalKey::Tvdb(81189);
        let only_collection = HeldSets {
            collection: HashSet::from([key]),
            library: HashSet::new(),
        };
        assert!(!only_collection.is_held(&[key], DedupPolicy::Intersection));

        let both = HeldSets {
            collection: HashSet::from([key]),
            library: HashSet::from([key]),
        };
        assert!(both.is_held(&[key], DedupPolicy::Intersection));
    }

    #[test]
    fn test_policy_per_kind() {
        assert_eq!(DedupPolicy::for_kind(MediaKind::Movie), DedupPolicy::Union);
        assert_eq!(
            DedupPolicy::for_kind(MediaKind::Series),
            DedupPolicy::Intersection
        );
    }

    #[test]
    fn test_candidate_without_keys_is_never_held() {
        let held = HeldSets {
            collection: HashSet::from([ExternalKey::Tmdb(1)]),
            library: HashSet::from([ExternalKey::Tmdb(1)]),
        };
        assert!(!held.is_held(&[], DedupPolicy::Union));
    }
}
