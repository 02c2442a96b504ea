//! Two-pass construction of the per-locale abbreviation index.
//!
//! Pass one records, for every candidate key, which targets claim it and how
//! (an explicit table token, a leader-substituted form, or a derived prefix).
//! Pass two commits each key to the strongest tier that has claims: a single
//! claimant wins, several explicit claimants are a data error, and several
//! derived claimants evict the key. Keys are visited in sorted order, so the
//! result does not depend on the order records were supplied in.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use biblenames_types::ResolutionTarget;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::leaders::LeaderTable;
use crate::normalize::{LocaleRules, WhitespacePolicy};

/// Where a candidate key came from, strongest first.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Tier {
    Explicit,
    Leader,
    Prefix,
}

/// Counts of committed and evicted keys, per tier.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IndexStats {
    pub explicit: usize,
    pub leader: usize,
    pub prefix: usize,
    pub evicted: usize,
}

impl IndexStats {
    pub fn total(&self) -> usize {
        self.explicit + self.leader + self.prefix
    }
}

/// Immutable normalized-key → target map for one locale.
#[derive(Clone, Debug, Default)]
pub struct AbbreviationIndex {
    entries: HashMap<String, (ResolutionTarget, Tier)>,
    ambiguous: BTreeMap<String, Vec<ResolutionTarget>>,
    stats: IndexStats,
}

impl AbbreviationIndex {
    /// Exact lookup of an already-normalized key.
    pub fn get(&self, key: &str) -> Option<&ResolutionTarget> {
        self.entries.get(key).map(|(target, _)| target)
    }

    /// Lookup that also reports how the key was derived.
    pub fn get_with_tier(&self, key: &str) -> Option<(&ResolutionTarget, Tier)> {
        self.entries.get(key).map(|(target, tier)| (target, *tier))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    /// Derived keys that were evicted because several targets wanted them.
    pub fn ambiguous_prefixes(&self) -> &BTreeMap<String, Vec<ResolutionTarget>> {
        &self.ambiguous
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolutionTarget)> + '_ {
        self.entries
            .iter()
            .map(|(key, (target, _))| (key.as_str(), target))
    }

    /// Sorted keys that resolve to `target`.
    pub fn keys_for(&self, target: &ResolutionTarget) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .iter()
            .filter(|(_, t)| *t == target)
            .map(|(key, _)| key)
            .collect();
        keys.sort_unstable();
        keys
    }
}

#[derive(Default)]
struct Claims {
    // Explicit claimants keep the first raw token seen for error reporting.
    explicit: BTreeMap<ResolutionTarget, String>,
    leader: BTreeSet<ResolutionTarget>,
    prefix: BTreeSet<ResolutionTarget>,
}

pub(crate) struct IndexBuilder<'a> {
    locale: &'a str,
    rules: &'a LocaleRules,
    leaders: &'a LeaderTable,
    candidates: BTreeMap<String, Claims>,
}

impl<'a> IndexBuilder<'a> {
    pub(crate) fn new(locale: &'a str, rules: &'a LocaleRules, leaders: &'a LeaderTable) -> Self {
        Self {
            locale,
            rules,
            leaders,
            candidates: BTreeMap::new(),
        }
    }

    /// Register a target's explicit tokens plus everything derived from them.
    pub(crate) fn add_target<'t>(
        &mut self,
        target: &ResolutionTarget,
        tokens: impl IntoIterator<Item = &'t str>,
    ) {
        for raw in tokens {
            let raw = raw.trim();
            let key = self.rules.normalize(raw);
            if key.is_empty() {
                warn!(
                    "locale {}: token {:?} for {} is empty after normalization",
                    self.locale, raw, target
                );
                continue;
            }
            self.claim(&key, target, Tier::Explicit, raw);

            for alternate in self.leaders.substitutions(raw, self.rules.glued_leaders) {
                let key = self.rules.normalize(&alternate);
                if !key.is_empty() {
                    self.claim(&key, target, Tier::Leader, &alternate);
                }
            }
        }
    }

    fn claim(&mut self, key: &str, target: &ResolutionTarget, tier: Tier, raw: &str) {
        let claims = self.candidates.entry(key.to_string()).or_default();
        match tier {
            Tier::Explicit => {
                claims
                    .explicit
                    .entry(target.clone())
                    .or_insert_with(|| raw.to_string());
            }
            Tier::Leader => {
                claims.leader.insert(target.clone());
            }
            Tier::Prefix => {
                claims.prefix.insert(target.clone());
            }
        }
        if tier == Tier::Prefix {
            return;
        }

        let collapse = self.rules.whitespace == WhitespacePolicy::Collapse;
        for (end, _) in key.char_indices().skip(1) {
            let prefix = &key[..end];
            if collapse && prefix.ends_with(' ') {
                continue;
            }
            self.candidates
                .entry(prefix.to_string())
                .or_default()
                .prefix
                .insert(target.clone());
        }
    }

    pub(crate) fn finish(self) -> Result<AbbreviationIndex, LoadError> {
        let mut entries = HashMap::with_capacity(self.candidates.len());
        let mut ambiguous = BTreeMap::new();
        let mut stats = IndexStats::default();

        for (key, claims) in self.candidates {
            if !claims.explicit.is_empty() {
                let mut claimants = claims.explicit.into_iter();
                let (first, first_token) = claimants.next().expect("non-empty claims");
                if let Some((second, second_token)) = claimants.next() {
                    return Err(LoadError::TokenCollision {
                        locale: self.locale.to_string(),
                        key,
                        first,
                        first_token,
                        second,
                        second_token,
                    });
                }
                stats.explicit += 1;
                entries.insert(key, (first, Tier::Explicit));
                continue;
            }

            let (tier, claimants) = if claims.leader.is_empty() {
                (Tier::Prefix, claims.prefix)
            } else {
                (Tier::Leader, claims.leader)
            };
            if claimants.len() == 1 {
                let target = claimants.into_iter().next().expect("one claimant");
                match tier {
                    Tier::Leader => stats.leader += 1,
                    _ => stats.prefix += 1,
                }
                entries.insert(key, (target, tier));
            } else {
                debug!(
                    "locale {}: evicting ambiguous key {:?} ({} claimants)",
                    self.locale,
                    key,
                    claimants.len()
                );
                stats.evicted += 1;
                ambiguous.insert(key, claimants.into_iter().collect());
            }
        }

        Ok(AbbreviationIndex {
            entries,
            ambiguous,
            stats,
        })
    }
}
