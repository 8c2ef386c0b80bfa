//! Closed vocabularies shared by the API and the database layer.
//!
//! Every enum serializes to the exact text stored in SQLite, so the same
//! string travels through JSON, SQL and back.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

// -- Pets --

text_enum!(PetSpecies {
    Dog => "Dog",
    Cat => "Cat",
    Other => "Other",
});

text_enum!(PetGender {
    Male => "Male",
    Female => "Female",
    Unknown => "Unknown",
});

text_enum!(PetSize {
    Small => "small",
    Medium => "medium",
    Large => "large",
});

text_enum!(PetTemperament {
    Calm => "calm",
    Playful => "playful",
    Friendly => "friendly",
    Energetic => "energetic",
    Gentle => "gentle",
});

text_enum!(PetActivityLevel {
    Low => "low",
    Moderate => "moderate",
    High => "high",
});

// -- User preferences (each accepts "any") --

text_enum!(PreferredSpecies {
    Dog => "dog",
    Cat => "cat",
    Any => "any",
});

text_enum!(PreferredSize {
    Small => "small",
    Medium => "medium",
    Large => "large",
    Any => "any",
});

text_enum!(PreferredTemperament {
    Calm => "calm",
    Playful => "playful",
    Friendly => "friendly",
    Energetic => "energetic",
    Gentle => "gentle",
    Any => "any",
});

text_enum!(PreferredActivityLevel {
    Low => "low",
    Moderate => "moderate",
    High => "high",
    Any => "any",
});

// -- Reports --

text_enum!(AdoptionStatus {
    Pending => "Pending",
    Approved => "Approved",
    Rejected => "Rejected",
    Completed => "Completed",
});

impl AdoptionStatus {
    /// Statuses that imply the pet has found a home.
    pub fn settles_pet(self) -> bool {
        matches!(self, AdoptionStatus::Approved | AdoptionStatus::Completed)
    }
}

text_enum!(RescueStatus {
    Pending => "Pending",
    InProgress => "InProgress",
    Resolved => "Resolved",
    Rejected => "Rejected",
});

text_enum!(AlertLevel {
    Critical => "Critical",
    High => "High",
    Medium => "Medium",
    Low => "Low",
});

text_enum!(LostFoundStatus {
    Lost => "Lost",
    Found => "Found",
    Reunited => "Reunited",
    Archived => "Archived",
});

// -- Chats, notifications, map --

text_enum!(ChatKind {
    Rescue => "rescue",
    Adoption => "adoption",
    LostPet => "lostpet",
    Generic => "generic",
});

text_enum!(NotificationKind {
    Rescue => "rescue",
    LostPet => "lostpet",
});

text_enum!(LocationType {
    RescueHome => "rescue_home",
    StrayAnimal => "stray_animal",
    VetCenter => "vet_center",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_matches_serde_representation() {
        for status in AdoptionStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert_eq!(serde_json::to_string(&LocationType::StrayAnimal).unwrap(), "\"stray_animal\"");
    }

    #[test]
    fn parse_rejects_wrong_case() {
        assert_eq!("Resolved".parse::<RescueStatus>(), Ok(RescueStatus::Resolved));
        let err = "resolved".parse::<RescueStatus>().unwrap_err();
        assert_eq!(err.kind, "RescueStatus");
        assert_eq!(err.value, "resolved");
    }

    #[test]
    fn only_approved_and_completed_settle_pet() {
        let settling: Vec<_> = AdoptionStatus::ALL.iter().filter(|s| s.settles_pet()).collect();
        assert_eq!(settling, vec![&AdoptionStatus::Approved, &AdoptionStatus::Completed]);
    }
}
