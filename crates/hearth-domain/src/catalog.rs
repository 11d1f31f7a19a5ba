//! Filter catalog - the read-only table of available filter definitions
//!
//! The catalog is built once at process start and shared (behind an `Arc`)
//! across concurrent extractions. Nothing mutates it after construction.

use crate::{FilterDefinition, SourceType, ValueType};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// Errors raised while building a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog document could not be parsed
    #[error("Catalog parse error: {0}")]
    Parse(String),

    /// Two definitions share an id within one source type
    #[error("Duplicate filter id {id} for source type '{source_type}'")]
    DuplicateId {
        /// Offending id
        id: i64,
        /// Source type the duplicate was found in
        source_type: SourceType,
    },

    /// A multiselect definition has no options
    #[error("Multiselect filter {0} has no options")]
    MissingOptions(i64),
}

/// The static list of filter definitions, grouped by source type
#[derive(Debug, Clone, Default)]
pub struct FilterCatalog {
    definitions: Vec<FilterDefinition>,
}

impl FilterCatalog {
    /// Build a catalog, rejecting duplicate ids and option-less multiselects
    pub fn new(definitions: Vec<FilterDefinition>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for def in &definitions {
            if !seen.insert((def.source_type, def.id)) {
                return Err(CatalogError::DuplicateId {
                    id: def.id,
                    source_type: def.source_type,
                });
            }
            if def.value_type == ValueType::Multiselect
                && def.options.as_ref().map_or(true, |o| o.is_empty())
            {
                return Err(CatalogError::MissingOptions(def.id));
            }
        }
        Ok(Self { definitions })
    }

    /// Parse a catalog from a JSON array of definitions
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let definitions: Vec<FilterDefinition> =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(definitions)
    }

    /// Look up a definition by id within a source type
    pub fn lookup(&self, id: i64, source_type: SourceType) -> Option<&FilterDefinition> {
        self.definitions
            .iter()
            .find(|d| d.id == id && d.source_type == source_type)
    }

    /// All ids defined for a source type
    pub fn all_ids(&self, source_type: SourceType) -> BTreeSet<i64> {
        self.for_source(source_type).map(|d| d.id).collect()
    }

    /// Definitions for one source type, in catalog order
    pub fn for_source(
        &self,
        source_type: SourceType,
    ) -> impl Iterator<Item = &FilterDefinition> + '_ {
        self.definitions
            .iter()
            .filter(move |d| d.source_type == source_type)
    }

    /// All definitions, in catalog order
    pub fn definitions(&self) -> &[FilterDefinition] {
        &self.definitions
    }

    /// Number of definitions across all source types
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// The built-in property and contact catalog
    pub fn builtin() -> Self {
        let mut definitions = property_filters();
        definitions.extend(contact_filters());
        Self { definitions }
    }
}

fn property_filters() -> Vec<FilterDefinition> {
    use SourceType::Properties as P;

    vec![
        FilterDefinition::new(1, "Property Value", ValueType::Number, P, "Estimated market value of the property")
            .with_subtype("currency")
            .with_unit("USD")
            .with_bounds(0.0, 100_000_000.0)
            .with_aliases(&["price", "value", "worth", "cost", "home value"])
            .with_group("Valuation"),
        FilterDefinition::new(2, "Square Footage", ValueType::Number, P, "Total living area of the building")
            .with_unit("sqft")
            .with_bounds(0.0, 50_000.0)
            .with_aliases(&["size", "sq ft", "living area"])
            .with_group("Building"),
        FilterDefinition::new(3, "Bedrooms", ValueType::Number, P, "Number of bedrooms")
            .with_bounds(0.0, 20.0)
            .with_aliases(&["beds", "bedroom", "br"])
            .with_group("Building"),
        FilterDefinition::new(4, "Bathrooms", ValueType::Number, P, "Number of bathrooms")
            .with_bounds(0.0, 20.0)
            .with_aliases(&["baths", "bathroom", "ba"])
            .with_group("Building"),
        FilterDefinition::new(5, "Year Built", ValueType::Number, P, "Year the building was constructed")
            .with_bounds(1700.0, 2100.0)
            .with_aliases(&["built", "construction year", "age of home"])
            .with_group("Building"),
        FilterDefinition::new(6, "City", ValueType::Text, P, "City the property is located in")
            .with_aliases(&["town", "municipality"])
            .with_group("Location"),
        FilterDefinition::new(7, "Zip Code", ValueType::Text, P, "Postal code of the property")
            .with_aliases(&["zip", "postal code"])
            .with_group("Location"),
        FilterDefinition::new(8, "Owner Occupied", ValueType::Bool, P, "Whether the owner lives at the property")
            .with_aliases(&["owner lives there", "primary residence"])
            .with_group("Ownership"),
        FilterDefinition::new(9, "Absentee Owner", ValueType::Bool, P, "Whether the owner's mailing address differs from the property")
            .with_aliases(&["absentee", "out of state owner", "non-resident owner"])
            .with_group("Ownership"),
        FilterDefinition::new(10, "Last Sale Date", ValueType::Date, P, "Date the property last changed hands")
            .with_aliases(&["sold", "purchased", "bought"])
            .with_group("Transactions"),
        FilterDefinition::new(11, "Property Type", ValueType::Multiselect, P, "Kind of property")
            .with_options(&[
                (1, "Single Family"),
                (2, "Condo"),
                (3, "Townhouse"),
                (4, "Multi-Family"),
                (5, "Land"),
            ])
            .with_aliases(&["type", "house", "apartment", "home type"])
            .with_group("Building"),
        FilterDefinition::new(12, "Amenities", ValueType::Multiselect, P, "Notable amenities on the lot")
            .with_options(&[(1, "Pool"), (2, "Garage"), (3, "Fireplace"), (4, "Waterfront")])
            .with_aliases(&["features", "extras"])
            .with_group("Features"),
        FilterDefinition::new(13, "Vacant", ValueType::Bool, P, "Whether the property is currently unoccupied")
            .with_aliases(&["empty", "unoccupied", "abandoned"])
            .with_group("Ownership"),
        FilterDefinition::new(14, "Listing Date", ValueType::Date, P, "Date the property was listed for sale")
            .with_aliases(&["listed", "on market since"])
            .with_group("Transactions"),
        FilterDefinition::new(15, "Street Name", ValueType::Text, P, "Street of the property address")
            .with_aliases(&["street", "road", "avenue"])
            .with_group("Location"),
    ]
}

fn contact_filters() -> Vec<FilterDefinition> {
    use SourceType::Contacts as C;

    vec![
        FilterDefinition::new(18, "Age", ValueType::Number, C, "Age of the contact in years")
            .with_bounds(18.0, 100.0)
            .with_aliases(&["age", "years old", "person age"]),
        FilterDefinition::new(19, "Household Income", ValueType::Number, C, "Estimated yearly household income")
            .with_subtype("currency")
            .with_unit("USD")
            .with_aliases(&["income", "salary", "earnings"]),
        FilterDefinition::new(20, "Occupation", ValueType::Text, C, "Reported occupation of the contact")
            .with_aliases(&["job", "profession", "works as"]),
        FilterDefinition::new(21, "Homeowner", ValueType::Bool, C, "Whether the contact owns their residence")
            .with_aliases(&["owns home", "renter"]),
        FilterDefinition::new(22, "Move-in Date", ValueType::Date, C, "Date the contact moved to their current address")
            .with_aliases(&["moved", "new resident"]),
        FilterDefinition::new(23, "Interests", ValueType::Multiselect, C, "Declared interests of the contact")
            .with_options(&[(1, "Investing"), (2, "Travel"), (3, "Golf"), (4, "Gardening")])
            .with_aliases(&["hobbies", "likes"]),
    ]
}
