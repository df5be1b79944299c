//! Fixed category buckets and keyword classification.
//!
//! Facebook reports a free-text category ("Magasin de vêtements",
//! "Restaurant italien", ...). Pages are grouped into ten buckets by
//! substring matching against a bilingual keyword table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the ten category buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKey {
    Restaurant,
    Shopping,
    Pets,
    Health,
    Education,
    Sports,
    Home,
    Transport,
    Services,
    #[default]
    Other,
}

impl CategoryKey {
    /// All keys, in classification order.
    pub const ALL: [CategoryKey; 10] = [
        CategoryKey::Restaurant,
        CategoryKey::Shopping,
        CategoryKey::Pets,
        CategoryKey::Health,
        CategoryKey::Education,
        CategoryKey::Sports,
        CategoryKey::Home,
        CategoryKey::Transport,
        CategoryKey::Services,
        CategoryKey::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKey::Restaurant => "restaurant",
            CategoryKey::Shopping => "shopping",
            CategoryKey::Pets => "pets",
            CategoryKey::Health => "health",
            CategoryKey::Education => "education",
            CategoryKey::Sports => "sports",
            CategoryKey::Home => "home",
            CategoryKey::Transport => "transport",
            CategoryKey::Services => "services",
            CategoryKey::Other => "other",
        }
    }

    /// The table entry for this key.
    pub fn category(&self) -> &'static Category {
        CATEGORIES
            .iter()
            .find(|c| c.key == *self)
            .unwrap_or(&CATEGORIES[CATEGORIES.len() - 1])
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a category key.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("unknown category: {0}")]
    Unknown(String),
}

impl FromStr for CategoryKey {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CategoryError::Unknown(s.to_string()))
    }
}

/// A category bucket with its display labels and matching keywords.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub key: CategoryKey,
    /// English display label.
    pub display: &'static str,
    /// French display label.
    pub display_fr: &'static str,
    /// Keywords matched case-insensitively as substrings.
    pub names: &'static [&'static str],
}

impl Category {
    /// Whether the free-text category contains one of this bucket's names.
    fn matches(&self, lowered: &str) -> bool {
        self.names
            .iter()
            .any(|n| lowered.contains(&n.to_lowercase()))
    }

    /// Whether a user search string hits either label or any keyword.
    pub fn matches_search(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.display.to_lowercase().contains(&q)
            || self.display_fr.to_lowercase().contains(&q)
            || self.names.iter().any(|n| n.to_lowercase().contains(&q))
    }
}

/// The bucket table. Order matters: the first match wins.
pub static CATEGORIES: [Category; 10] = [
    Category {
        key: CategoryKey::Restaurant,
        display: "Restaurants & Food",
        display_fr: "Restaurants & Alimentation",
        names: &[
            "Restaurant",
            "Restauration",
            "Restaurante",
            "Restauracja",
            "Restoran",
            "مطعم",
        ],
    },
    Category {
        key: CategoryKey::Shopping,
        display: "Shopping & Fashion",
        display_fr: "Mode & Shopping",
        names: &[
            "Clothing Store",
            "Magasin de vêtements",
            "Apparel & Clothing",
            "Boutique",
            "Shopping & Retail",
            "Vêtements",
            "Mode",
        ],
    },
    Category {
        key: CategoryKey::Pets,
        display: "Animals & Pets",
        display_fr: "Animaux & Animaux de compagnie",
        names: &[
            "Animals & Pets",
            "Animalerie",
            "Pet Store",
            "Pet Services",
            "Animaux",
            "Pets",
        ],
    },
    Category {
        key: CategoryKey::Health,
        display: "Health & Medical",
        display_fr: "Santé & Médical",
        names: &[
            "Health",
            "Santé",
            "Hospital",
            "Hôpital",
            "Clinic",
            "Clinique",
            "Medical Center",
            "Centre médical",
        ],
    },
    Category {
        key: CategoryKey::Education,
        display: "Education & Training",
        display_fr: "Éducation & Formation",
        names: &[
            "Education",
            "Éducation",
            "School",
            "École",
            "College",
            "Université",
            "Training",
            "Formation",
        ],
    },
    Category {
        key: CategoryKey::Sports,
        display: "Sports & Fitness",
        display_fr: "Sports & Fitness",
        names: &[
            "Sports",
            "Sport",
            "Fitness",
            "Gym",
            "Salle de sport",
            "Stadium",
            "Stade",
        ],
    },
    Category {
        key: CategoryKey::Home,
        display: "Home & Services",
        display_fr: "Maison & Services",
        names: &[
            "Home",
            "Maison",
            "Home Services",
            "Service à domicile",
            "Home Improvement",
            "Amélioration de l'habitat",
        ],
    },
    Category {
        key: CategoryKey::Transport,
        display: "Transport & Travel",
        display_fr: "Transport & Voyage",
        names: &[
            "Transport",
            "Transportation",
            "Transports",
            "Taxi",
            "Bus",
            "Train",
            "Airport",
            "Aéroport",
        ],
    },
    Category {
        key: CategoryKey::Services,
        display: "Business & Services",
        display_fr: "Services & Entreprises",
        names: &[
            "Service",
            "Services",
            "Business Service",
            "Service professionnel",
            "Consulting",
            "Conseil",
        ],
    },
    Category {
        key: CategoryKey::Other,
        display: "Other",
        display_fr: "Autres",
        names: &[],
    },
];

/// Classify a free-text category into a bucket.
///
/// Returns [`CategoryKey::Other`] for missing, blank, or unmatched input.
pub fn classify(category: Option<&str>) -> CategoryKey {
    let Some(raw) = category else {
        return CategoryKey::Other;
    };
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return CategoryKey::Other;
    }
    CATEGORIES
        .iter()
        .find(|c| c.matches(&lowered))
        .map(|c| c.key)
        .unwrap_or(CategoryKey::Other)
}

/// Buckets matching a search string; every bucket for an empty query.
pub fn search(query: &str) -> Vec<&'static Category> {
    CATEGORIES.iter().filter(|c| c.matches_search(query)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_english_and_french() {
        assert_eq!(classify(Some("Restaurant italien")), CategoryKey::Restaurant);
        assert_eq!(classify(Some("Magasin de vêtements")), CategoryKey::Shopping);
        assert_eq!(classify(Some("Clothing store")), CategoryKey::Shopping);
        assert_eq!(classify(Some("Animalerie")), CategoryKey::Pets);
        assert_eq!(classify(Some("Centre médical")), CategoryKey::Health);
        assert_eq!(classify(Some("École primaire")), CategoryKey::Education);
        assert_eq!(classify(Some("Salle de sport")), CategoryKey::Sports);
        assert_eq!(classify(Some("Taxi")), CategoryKey::Transport);
        assert_eq!(classify(Some("Consulting agency")), CategoryKey::Services);
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(classify(None), CategoryKey::Other);
        assert_eq!(classify(Some("")), CategoryKey::Other);
        assert_eq!(classify(Some("   ")), CategoryKey::Other);
        assert_eq!(classify(Some("Personnalité publique")), CategoryKey::Other);
    }

    #[test]
    fn test_classify_first_match_wins() {
        // "Home Services" also contains "Service"; home comes first.
        assert_eq!(classify(Some("Home Services")), CategoryKey::Home);
        // "Sports" bucket precedes "Transport" even though "Sport" is in "Transport".
        assert_eq!(classify(Some("Transport")), CategoryKey::Sports);
    }

    #[test]
    fn test_key_round_trip() {
        for key in CategoryKey::ALL {
            assert_eq!(key.as_str().parse::<CategoryKey>(), Ok(key));
            assert_eq!(key.category().key, key);
        }
        assert!("food".parse::<CategoryKey>().is_err());
    }

    #[test]
    fn test_key_serializes_lowercase() {
        let json = serde_json::to_string(&CategoryKey::Shopping).unwrap();
        assert_eq!(json, "\"shopping\"");
    }

    #[test]
    fn test_search() {
        assert_eq!(search("").len(), 10);
        let hits = search("mode");
        assert!(hits.iter().any(|c| c.key == CategoryKey::Shopping));
        let hits = search("santé");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, CategoryKey::Health);
        assert!(search("zzz").is_empty());
    }
}
