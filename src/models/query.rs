//! Structured search filter submitted before paging.

use serde::Serialize;
use serde_json::{json, Value};

/// Geographic area filter, as the site's area picker identifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeographicArea {
    /// Human label, e.g. "Montréal (Island)".
    pub text: String,
    /// Backend area id, e.g. "GSGS4621".
    pub id: String,
}

/// Immutable search query.
///
/// Built once from configuration; the `with_*` methods consume and return
/// a new value, so a query handed to the crawler cannot change under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    geography: GeographicArea,
    category: String,
    selling_type: String,
    land_area_unit: String,
    price_min: u64,
    price_max: u64,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            geography: GeographicArea {
                text: "Montréal (Island)".to_string(),
                id: "GSGS4621".to_string(),
            },
            category: "Residential".to_string(),
            selling_type: "Sale".to_string(),
            land_area_unit: "SquareFeet".to_string(),
            price_min: 0,
            price_max: 999_999_999_999,
        }
    }
}

impl SearchQuery {
    pub fn new(geography: GeographicArea) -> Self {
        Self {
            geography,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_selling_type(mut self, selling_type: impl Into<String>) -> Self {
        self.selling_type = selling_type.into();
        self
    }

    pub fn with_land_area_unit(mut self, unit: impl Into<String>) -> Self {
        self.land_area_unit = unit.into();
        self
    }

    pub fn with_price_range(mut self, min: u64, max: u64) -> Self {
        self.price_min = min;
        self.price_max = max;
        self
    }

    pub fn geography(&self) -> &GeographicArea {
        &self.geography
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn selling_type(&self) -> &str {
        &self.selling_type
    }

    pub fn land_area_unit(&self) -> &str {
        &self.land_area_unit
    }

    pub fn price_range(&self) -> (u64, u64) {
        (self.price_min, self.price_max)
    }

    /// Request body for the UpdateQuery endpoint.
    pub fn to_payload(&self) -> Value {
        json!({
            "query": {
                "UseGeographyShapes": 0,
                "Filters": [
                    {
                        "MatchType": "GeographicArea",
                        "Text": self.geography.text,
                        "Id": self.geography.id,
                    }
                ],
                "FieldsValues": [
                    field_value("GeographicArea", json!(self.geography.id), ""),
                    field_value("Category", json!(self.category), ""),
                    field_value("SellingType", json!(self.selling_type), ""),
                    field_value("LandArea", json!(self.land_area_unit), "IsLandArea"),
                    field_value("SalePrice", json!(self.price_min), "ForSale"),
                    field_value("SalePrice", json!(self.price_max), "ForSale"),
                ]
            },
            "isHomePage": true
        })
    }
}

fn field_value(field_id: &str, value: Value, condition: &str) -> Value {
    json!({
        "fieldId": field_id,
        "value": value,
        "fieldConditionId": condition,
        "valueConditionId": ""
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_payload_matches_site_format() {
        let payload = SearchQuery::default().to_payload();
        assert_eq!(payload["isHomePage"], true);
        assert_eq!(payload["query"]["UseGeographyShapes"], 0);
        assert_eq!(payload["query"]["Filters"][0]["Text"], "Montréal (Island)");
        assert_eq!(payload["query"]["Filters"][0]["Id"], "GSGS4621");

        let fields = payload["query"]["FieldsValues"].as_array().unwrap();
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[3]["fieldId"], "LandArea");
        assert_eq!(fields[3]["fieldConditionId"], "IsLandArea");
        assert_eq!(fields[4]["value"], 0);
        assert_eq!(fields[5]["value"], 999_999_999_999u64);
    }

    #[test]
    fn test_builder_overrides() {
        let query = SearchQuery::new(GeographicArea {
            text: "Laval".to_string(),
            id: "GSGS4622".to_string(),
        })
        .with_category("Commercial")
        .with_selling_type("Rent")
        .with_price_range(1000, 5000);

        let payload = query.to_payload();
        let fields = payload["query"]["FieldsValues"].as_array().unwrap();
        assert_eq!(fields[0]["value"], "GSGS4622");
        assert_eq!(fields[1]["value"], "Commercial");
        assert_eq!(fields[2]["value"], "Rent");
        assert_eq!(query.price_range(), (1000, 5000));
        assert_eq!(query.land_area_unit(), "SquareFeet");
    }
}
