use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Enlargement of the gland for diffuse goiter, applied to both semi-axes.
const GOITER_SCALE: f64 = 1.15;

/// Uptake pattern applied on top of the two-lobe baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Pathology {
    #[default]
    Normal,
    /// Autonomous adenoma: focal increased uptake.
    HotNodule,
    /// Focal suppressed uptake.
    ColdNodule,
    /// Enlarged gland with near-uniform uptake.
    DiffuseGoiter,
    /// Hashimoto-style inhomogeneous uptake.
    PatchyAutoimmune,
}

impl Pathology {
    pub const ALL: [Pathology; 5] = [
        Pathology::Normal,
        Pathology::HotNodule,
        Pathology::ColdNodule,
        Pathology::DiffuseGoiter,
        Pathology::PatchyAutoimmune,
    ];

    /// Parse a slug, display label, or German clinical label.
    /// Unknown input selects the unmodulated baseline.
    pub fn from_label(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }

    pub fn parse(value: &str) -> Option<Self> {
        let key = value.trim().to_lowercase().replace(['_', ' '], "-");
        let pathology = match key.as_str() {
            "normal" | "physiological" | "physiological-(normal)" | "physiologisch"
            | "physiologisch-(normal)" => Pathology::Normal,
            "hot" | "hot-nodule" | "hot-nodule-(autonomous-adenoma)" | "heißer-knoten"
            | "heißer-knoten-(autonomes-adenom)" | "autonomous-adenoma" => Pathology::HotNodule,
            "cold" | "cold-nodule" | "kalter-knoten" => Pathology::ColdNodule,
            "diffuse" | "diffuse-goiter" | "goiter" | "struma-diffusa" => {
                Pathology::DiffuseGoiter
            }
            "patchy" | "patchy-autoimmune" | "hashimoto" | "hashimoto-(patchy)"
            | "hashimoto-(inhomogen)" => Pathology::PatchyAutoimmune,
            _ => return None,
        };
        Some(pathology)
    }

    pub fn slug(self) -> &'static str {
        match self {
            Pathology::Normal => "normal",
            Pathology::HotNodule => "hot-nodule",
            Pathology::ColdNodule => "cold-nodule",
            Pathology::DiffuseGoiter => "diffuse-goiter",
            Pathology::PatchyAutoimmune => "patchy-autoimmune",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Pathology::Normal => "Physiological (normal)",
            Pathology::HotNodule => "Hot nodule (autonomous adenoma)",
            Pathology::ColdNodule => "Cold nodule",
            Pathology::DiffuseGoiter => "Diffuse goiter",
            Pathology::PatchyAutoimmune => "Hashimoto (patchy)",
        }
    }

    /// Factor applied to the gland's semi-axes before sampling.
    pub fn region_scale(self) -> f64 {
        match self {
            Pathology::DiffuseGoiter => GOITER_SCALE,
            _ => 1.0,
        }
    }
}

impl fmt::Display for Pathology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Pathology {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.slug())
    }
}

impl<'de> Deserialize<'de> for Pathology {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Pathology::from_label(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugs_round_trip() {
        for p in Pathology::ALL {
            assert_eq!(Pathology::from_label(p.slug()), p);
        }
    }

    #[test]
    fn test_german_labels() {
        assert_eq!(
            Pathology::from_label("Heißer Knoten (autonomes Adenom)"),
            Pathology::HotNodule
        );
        assert_eq!(Pathology::from_label("Kalter Knoten"), Pathology::ColdNodule);
        assert_eq!(Pathology::from_label("Struma diffusa"), Pathology::DiffuseGoiter);
        assert_eq!(
            Pathology::from_label("Hashimoto (inhomogen)"),
            Pathology::PatchyAutoimmune
        );
    }

    #[test]
    fn test_display_labels_round_trip() {
        for p in Pathology::ALL {
            assert_eq!(Pathology::parse(p.label()), Some(p));
        }
        assert_eq!(Pathology::parse("Physiologisch (normal)"), Some(Pathology::Normal));
    }

    #[test]
    fn test_unknown_label_falls_back_to_normal() {
        assert_eq!(Pathology::parse("graves"), None);
        assert_eq!(Pathology::from_label("graves"), Pathology::Normal);
        assert_eq!(Pathology::from_label(""), Pathology::Normal);
    }

    #[test]
    fn test_only_goiter_enlarges_region() {
        for p in Pathology::ALL {
            let expected = if p == Pathology::DiffuseGoiter { 1.15 } else { 1.0 };
            assert_eq!(p.region_scale(), expected);
        }
    }

    #[test]
    fn test_serde_uses_slug() {
        let json = serde_json::to_string(&Pathology::ColdNodule).unwrap();
        assert_eq!(json, "\"cold-nodule\"");
        let back: Pathology = serde_json::from_str("\"Hashimoto\"").unwrap();
        assert_eq!(back, Pathology::PatchyAutoimmune);
    }
}
