//! Cultural caregiver hierarchy.
//!
//! An ordered list of roles per culture; earlier roles are asked first.
//! The table is data so households can extend or override it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::CulturalRole;

/// Culture used when a household names an unknown culture.
pub const DEFAULT_CULTURE: &str = "default";

/// Role ordering per culture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HierarchyTable {
    pub cultures: BTreeMap<String, Vec<CulturalRole>>,
}

impl Default for HierarchyTable {
    fn default() -> Self {
        use CulturalRole::*;
        let entries = [
            (
                DEFAULT_CULTURE,
                vec![
                    PrimaryCaregiver,
                    Spouse,
                    AdultChild,
                    Sibling,
                    Elder,
                    Grandchild,
                    ExtendedFamily,
                    ProfessionalCarer,
                    Other,
                ],
            ),
            (
                "south_asian",
                vec![
                    PrimaryCaregiver,
                    Elder,
                    AdultChild,
                    Spouse,
                    Grandchild,
                    Sibling,
                    ExtendedFamily,
                    ProfessionalCarer,
                    Other,
                ],
            ),
            (
                "middle_eastern",
                vec![
                    PrimaryCaregiver,
                    Elder,
                    Spouse,
                    AdultChild,
                    Sibling,
                    ExtendedFamily,
                    Grandchild,
                    ProfessionalCarer,
                    Other,
                ],
            ),
            (
                "east_asian",
                vec![
                    PrimaryCaregiver,
                    AdultChild,
                    Spouse,
                    Elder,
                    Grandchild,
                    Sibling,
                    ExtendedFamily,
                    ProfessionalCarer,
                    Other,
                ],
            ),
            (
                "western",
                vec![
                    PrimaryCaregiver,
                    Spouse,
                    AdultChild,
                    ProfessionalCarer,
                    Sibling,
                    Grandchild,
                    Elder,
                    ExtendedFamily,
                    Other,
                ],
            ),
        ];
        Self {
            cultures: entries
                .into_iter()
                .map(|(name, roles)| (name.to_string(), roles))
                .collect(),
        }
    }
}

impl HierarchyTable {
    /// An empty table; every role ranks equally.
    pub fn empty() -> Self {
        Self {
            cultures: BTreeMap::new(),
        }
    }

    /// Adds or replaces a culture's ordering.
    pub fn with_culture(mut self, culture: impl Into<String>, roles: Vec<CulturalRole>) -> Self {
        self.cultures.insert(culture.into(), roles);
        self
    }

    /// Position of `role` in the culture's ordering.
    ///
    /// Unknown cultures use [`DEFAULT_CULTURE`]; roles missing from the
    /// ordering rank after every listed role.
    pub fn rank(&self, culture: &str, role: &CulturalRole) -> usize {
        let order = self
            .cultures
            .get(culture)
            .or_else(|| self.cultures.get(DEFAULT_CULTURE));
        match order {
            Some(roles) => roles.iter().position(|r| r == role).unwrap_or(roles.len()),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_by_culture() {
        let table = HierarchyTable::default();
        assert!(
            table.rank("south_asian", &CulturalRole::Elder)
                < table.rank("south_asian", &CulturalRole::Spouse)
        );
        assert!(
            table.rank("western", &CulturalRole::Spouse)
                < table.rank("western", &CulturalRole::Elder)
        );
    }

    #[test]
    fn test_unknown_culture_uses_default() {
        let table = HierarchyTable::default();
        assert_eq!(
            table.rank("atlantean", &CulturalRole::Spouse),
            table.rank(DEFAULT_CULTURE, &CulturalRole::Spouse)
        );
    }

    #[test]
    fn test_unlisted_role_ranks_last() {
        let table = HierarchyTable::empty().with_culture("tiny", vec![CulturalRole::Elder]);
        assert_eq!(table.rank("tiny", &CulturalRole::Elder), 0);
        assert_eq!(table.rank("tiny", &CulturalRole::Sibling), 1);
        assert_eq!(table.rank("other", &CulturalRole::Sibling), 0);
    }

    #[test]
    fn test_json_round_trip() {
        let table = HierarchyTable::empty()
            .with_culture("tiny", vec![CulturalRole::AdultChild, CulturalRole::Spouse]);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"tiny":["adult_child","spouse"]}"#);
        let back: HierarchyTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
