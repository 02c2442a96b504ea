//! Numeral leaders ("1", "Saint") and the alternate spellings substituted for them.

use std::collections::HashMap;

use biblenames_types::LeaderRecord;

use crate::error::LoadError;

/// Validated leader table for one locale, longest standard leader first.
#[derive(Clone, Debug, Default)]
pub struct LeaderTable {
    leaders: Vec<(String, Vec<String>)>,
}

impl LeaderTable {
    /// Check that no variant belongs to two leaders (or is itself a leader).
    pub fn new(locale: &str, records: &[LeaderRecord]) -> Result<Self, LoadError> {
        let mut owner: HashMap<&str, &str> = HashMap::new();
        for record in records {
            let leader = record.standard_leader.trim();
            if owner.insert(leader, leader).is_some() {
                return Err(LoadError::DuplicateLeader {
                    locale: locale.to_string(),
                    leader: leader.to_string(),
                });
            }
        }

        let mut leaders = Vec::with_capacity(records.len());
        for record in records {
            let leader = record.standard_leader.trim();
            let mut variants: Vec<String> = Vec::with_capacity(record.input_variants.len());
            for variant in &record.input_variants {
                let variant = variant.trim();
                if variant.is_empty() || variant == leader {
                    continue;
                }
                if let Some(prev) = owner.insert(variant, leader)
                    && prev != leader
                {
                    return Err(LoadError::LeaderOverlap {
                        locale: locale.to_string(),
                        variant: variant.to_string(),
                        first: prev.to_string(),
                        second: leader.to_string(),
                    });
                }
                if !variants.iter().any(|v| v == variant) {
                    variants.push(variant.to_string());
                }
            }
            leaders.push((leader.to_string(), variants));
        }

        leaders.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        Ok(Self { leaders })
    }

    pub fn len(&self) -> usize {
        self.leaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaders.is_empty()
    }

    /// Alternate spellings of `token` with its leader swapped for each variant.
    ///
    /// The leader must be the token's leading segment, followed by whitespace
    /// or, when `glued` is set, directly by a non-digit character. Only the
    /// longest matching leader is used.
    pub fn substitutions(&self, token: &str, glued: bool) -> Vec<String> {
        for (leader, variants) in &self.leaders {
            let Some(rest) = token.strip_prefix(leader.as_str()) else {
                continue;
            };
            let Some(next) = rest.chars().next() else {
                continue;
            };
            if next.is_whitespace() {
                let remainder = rest.trim_start();
                if remainder.is_empty() {
                    continue;
                }
                return variants
                    .iter()
                    .map(|variant| format!("{variant} {remainder}"))
                    .collect();
            }
            if glued && !next.is_numeric() {
                return variants
                    .iter()
                    .map(|variant| format!("{variant}{rest}"))
                    .collect();
            }
        }
        Vec::new()
    }
}
