use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_TRACK: &str = "main";

/// Server-assigned product identifier. Zero means "not assigned yet".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub i64);

impl ProductId {
    pub const UNASSIGNED: Self = Self(0);

    pub fn is_unassigned(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: ProductId,
    pub number: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub revision: String,
    #[serde(default = "default_track")]
    pub track: String,
}

/// An explicit `null` id is the same as leaving it out.
fn deserialize_id<'de, D>(deserializer: D) -> Result<ProductId, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(|id| ProductId(id.unwrap_or_default()))
}

fn default_track() -> String {
    DEFAULT_TRACK.to_string()
}

impl Product {
    /// A product with only the required fields set; everything else takes its default.
    pub fn new(number: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            id: ProductId::UNASSIGNED,
            number: number.into(),
            name: None,
            description: None,
            revision: revision.into(),
            track: default_track(),
        }
    }

    pub fn matches(&self, lookup: &ProductLookup) -> bool {
        match lookup {
            ProductLookup::Id(id) => self.id == *id,
            ProductLookup::Revision(revision) => &self.revision == revision,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LookupField {
    Id,
    Revision,
}

impl LookupField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Revision => "revision",
        }
    }
}

impl fmt::Display for LookupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field/value pair used to address a single product.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProductLookup {
    Id(ProductId),
    Revision(String),
}

impl ProductLookup {
    pub fn field(&self) -> LookupField {
        match self {
            Self::Id(_) => LookupField::Id,
            Self::Revision(_) => LookupField::Revision,
        }
    }

    pub fn value(&self) -> String {
        match self {
            Self::Id(id) => id.to_string(),
            Self::Revision(revision) => revision.clone(),
        }
    }
}

impl fmt::Display for ProductLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field(), self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::{Product, ProductId, ProductLookup, DEFAULT_TRACK};

    #[test]
    fn deserialize_applies_declared_defaults() {
        let product: Product =
            serde_json::from_str(r#"{"number":"N1","revision":"R1"}"#).expect("parse product");

        assert_eq!(product.id, ProductId::UNASSIGNED);
        assert_eq!(product.name, None);
        assert_eq!(product.description, None);
        assert_eq!(product.track, DEFAULT_TRACK);
    }

    #[test]
    fn null_id_is_treated_as_unassigned() {
        let product: Product =
            serde_json::from_str(r#"{"id":null,"number":"N1","revision":"R1"}"#).expect("parse");
        let supplied: Product =
            serde_json::from_str(r#"{"id":12,"number":"N1","revision":"R1"}"#).expect("parse");

        assert!(product.id.is_unassigned());
        assert_eq!(supplied.id, ProductId(12));
    }

    #[test]
    fn deserialize_rejects_missing_required_fields() {
        let missing_revision = serde_json::from_str::<Product>(r#"{"number":"N1"}"#);
        let missing_number = serde_json::from_str::<Product>(r#"{"revision":"R1"}"#);

        assert!(missing_revision.is_err());
        assert!(missing_number.is_err());
    }

    #[test]
    fn serialize_emits_flat_id_and_null_optionals() {
        let mut product = Product::new("N1", "R1");
        product.id = ProductId(42);

        let value = serde_json::to_value(&product).expect("serialize product");

        assert_eq!(value["id"], 42);
        assert!(value["name"].is_null());
        assert_eq!(value["track"], "main");
    }

    #[test]
    fn lookup_matches_on_its_own_field_only() {
        let mut product = Product::new("N1", "7");
        product.id = ProductId(3);

        assert!(product.matches(&ProductLookup::Id(ProductId(3))));
        assert!(product.matches(&ProductLookup::Revision("7".to_string())));
        assert!(!product.matches(&ProductLookup::Id(ProductId(7))));
        assert_eq!(ProductLookup::Revision("7".to_string()).to_string(), "revision=7");
    }
}
