//! Mapping from database taxonomic labels to broad groups.

use crate::domain::BroadGroup;

const FISH: &[&str] = &["Fish"];

const INVERTEBRATE: &[&str] = &[
    "Invertebrate",
    "Aquatic Invertebrates",
    "Invertebrates",
    "Crustaceans",
    "Crustacean",
    "Insects",
    "Molluscs",
    "Mollusc",
    "Worms",
    "Zooplankton",
];

const PLANT: &[&str] = &[
    "Plant",
    "Algae",
    "Aquatic Plants",
    "Plants (Seedlings)",
    "Plants",
    "Algae/Plants",
];

const AMPHIBIAN: &[&str] = &["Amphibian", "Amphibians"];

/// Broad group for a raw label. Unknown or empty labels map to `Other`.
pub fn broad_group(label: &str) -> BroadGroup {
    let label = label.trim();
    let table: [(BroadGroup, &[&str]); 4] = [
        (BroadGroup::Fish, FISH),
        (BroadGroup::Invertebrate, INVERTEBRATE),
        (BroadGroup::Plant, PLANT),
        (BroadGroup::Amphibian, AMPHIBIAN),
    ];

    table
        .iter()
        .find(|(_, labels)| labels.contains(&label))
        .map_or(BroadGroup::Other, |(group, _)| *group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_database_labels() {
        assert_eq!(broad_group("Crustaceans"), BroadGroup::Invertebrate);
        assert_eq!(broad_group("Zooplankton"), BroadGroup::Invertebrate);
        assert_eq!(broad_group("Algae"), BroadGroup::Plant);
        assert_eq!(broad_group("Plants (Seedlings)"), BroadGroup::Plant);
        assert_eq!(broad_group(" Fish "), BroadGroup::Fish);
        assert_eq!(broad_group("Amphibians"), BroadGroup::Amphibian);
    }

    #[test]
    fn unknown_labels_are_other() {
        assert_eq!(broad_group("Reptiles"), BroadGroup::Other);
        assert_eq!(broad_group(""), BroadGroup::Other);
    }
}
