// * Static result schema.
// * Every field the analyzer can ever emit is listed here; a narrower module set
// * just leaves more of them at null.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared output type of a field, used for validation and coercion only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    Number,
    TextList,
    Structured,
}

/// One named attribute of the final product record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Availability,
    Brand,
    Breadcrumbs,
    Currency,
    Description,
    Ean,
    Image,
    JsonLd,
    OpenGraph,
    Price,
    Sku,
    Specifications,
    Title,
}

impl Field {
    pub const ALL: [Field; 13] = [
        Field::Availability,
        Field::Brand,
        Field::Breadcrumbs,
        Field::Currency,
        Field::Description,
        Field::Ean,
        Field::Image,
        Field::JsonLd,
        Field::OpenGraph,
        Field::Price,
        Field::Sku,
        Field::Specifications,
        Field::Title,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Availability => "availability",
            Field::Brand => "brand",
            Field::Breadcrumbs => "breadcrumbs",
            Field::Currency => "currency",
            Field::Description => "description",
            Field::Ean => "ean",
            Field::Image => "image",
            Field::JsonLd => "json_ld",
            Field::OpenGraph => "open_graph",
            Field::Price => "price",
            Field::Sku => "sku",
            Field::Specifications => "specifications",
            Field::Title => "title",
        }
    }

    /// Looks a field up by its exact schema name
    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|field| field.as_str() == name)
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Price => FieldKind::Number,
            Field::Breadcrumbs => FieldKind::TextList,
            Field::JsonLd | Field::OpenGraph | Field::Specifications => FieldKind::Structured,
            _ => FieldKind::Text,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_lookup() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.as_str()), Some(field));
        }
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(Field::from_name("identifiers"), None);
        assert_eq!(Field::from_name("Title"), None);
        assert_eq!(Field::from_name("price:amount"), None);
    }

    #[test]
    fn test_all_is_sorted_by_name() {
        let names: Vec<&str> = Field::ALL.iter().map(|f| f.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_declared_kinds() {
        assert_eq!(Field::Price.kind(), FieldKind::Number);
        assert_eq!(Field::Breadcrumbs.kind(), FieldKind::TextList);
        assert_eq!(Field::Specifications.kind(), FieldKind::Structured);
        assert_eq!(Field::Brand.kind(), FieldKind::Text);
    }
}
