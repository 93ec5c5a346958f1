/// Field schema for the crop parameter form.
///
/// This is the single source of truth for which fields exist, how they are
/// labelled and grouped, their default values, and the closed set of legal
/// values for categorical fields. Nothing else in the crate lists
/// fields by hand; the form, the request payload and the terminal renderer
/// all walk [`fields`].
pub mod form;

pub use form::{FieldValue, FormError, FormInput, FrozenInput};

// ---------------------------------------------------------------------------
// Choice sets
// ---------------------------------------------------------------------------

const CROPS: &[&str] = &[
    "Rice",
    "Wheat",
    "Maize",
    "Cotton",
    "Sugarcane",
    "Tea",
    "Coffee",
    "Jute",
    "Potato",
    "Onion",
];

const SOIL_TYPES: &[&str] = &["Clay", "Sandy", "Loam", "Silt", "Peaty", "Chalky"];

const SEASONS: &[&str] = &["Kharif", "Rabi", "Zaid", "Whole Year"];

const IRRIGATION_METHODS: &[&str] = &["Drip", "Sprinkler", "Flood", "Rainfed"];

const FERTILIZER_TYPES: &[&str] = &[
    "Urea",
    "DAP",
    "MOP",
    "NPK",
    "Superphosphate",
    "Organic",
    "None",
];

const AREA_UNITS: &[&str] = &["Hectare", "Acre", "Sq_Meter"];

const YIELD_UNITS: &[&str] = &["Ton", "Kg", "Quintal"];

// ---------------------------------------------------------------------------
// Field descriptors
// ---------------------------------------------------------------------------

/// Form section a field is displayed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    BasicInfo,
    FieldParameters,
    SoilNutrients,
    WeatherAndWater,
    FertilizerStrategy,
}

impl Section {
    /// All sections in display order.
    pub const ALL: [Section; 5] = [
        Section::BasicInfo,
        Section::FieldParameters,
        Section::SoilNutrients,
        Section::WeatherAndWater,
        Section::FertilizerStrategy,
    ];
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BasicInfo => write!(f, "Basic Info"),
            Self::FieldParameters => write!(f, "Field Parameters"),
            Self::SoilNutrients => write!(f, "Soil Nutrients"),
            Self::WeatherAndWater => write!(f, "Weather & Water"),
            Self::FertilizerStrategy => write!(f, "Fertilizer Strategy"),
        }
    }
}

/// Kind of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any real number. Ranges are left to the prediction service.
    Numeric,
    /// One of a closed, non-empty set of strings.
    Categorical(&'static [&'static str]),
}

/// Static description of one form field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Wire name, used as the JSON key in the request body.
    pub name: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    pub section: Section,
    pub kind: FieldKind,
    /// Default value as the form would display it.
    pub default: &'static str,
}

impl FieldSpec {
    /// Legal values for categorical fields, `None` for numeric ones.
    pub fn choices(&self) -> Option<&'static [&'static str]> {
        match self.kind {
            FieldKind::Categorical(choices) => Some(choices),
            FieldKind::Numeric => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == FieldKind::Numeric
    }
}

const fn numeric(
    name: &'static str,
    label: &'static str,
    section: Section,
    default: &'static str,
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        section,
        kind: FieldKind::Numeric,
        default,
    }
}

const fn categorical(
    name: &'static str,
    label: &'static str,
    section: Section,
    choices: &'static [&'static str],
    default: &'static str,
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        section,
        kind: FieldKind::Categorical(choices),
        default,
    }
}

/// Every form field, in display order.
static FIELDS: &[FieldSpec] = &[
    // Basic info
    categorical("Crop_Type", "Crop Type", Section::BasicInfo, CROPS, "Rice"),
    categorical("Season", "Season", Section::BasicInfo, SEASONS, "Kharif"),
    numeric("Growth_Duration", "Duration (Days)", Section::BasicInfo, "120"),
    // Field parameters
    categorical("Soil_Type", "Soil Type", Section::FieldParameters, SOIL_TYPES, "Clay"),
    numeric("Area", "Area Size", Section::FieldParameters, "1"),
    categorical("Area_Unit", "Area Unit", Section::FieldParameters, AREA_UNITS, "Hectare"),
    // Soil nutrients
    numeric("Nitrogen", "N (kg/ha)", Section::SoilNutrients, "80"),
    numeric("Phosphorus", "P (kg/ha)", Section::SoilNutrients, "40"),
    numeric("Potassium", "K (kg/ha)", Section::SoilNutrients, "40"),
    numeric("Soil_pH", "pH Level", Section::SoilNutrients, "6.5"),
    numeric("Soil_Moisture", "Moisture (%)", Section::SoilNutrients, "80"),
    // Weather & water
    numeric("Temperature", "Temp (°C)", Section::WeatherAndWater, "25"),
    numeric("Rainfall", "Rain (mm)", Section::WeatherAndWater, "200"),
    numeric("Humidity", "Humidity (%)", Section::WeatherAndWater, "80"),
    numeric("Sunlight_Hours", "Sunlight (h/day)", Section::WeatherAndWater, "8"),
    categorical(
        "Irrigation_Method",
        "Irrigation",
        Section::WeatherAndWater,
        IRRIGATION_METHODS,
        "Flood",
    ),
    // Fertilizer strategy
    categorical(
        "Fertilizer_Type",
        "Type",
        Section::FertilizerStrategy,
        FERTILIZER_TYPES,
        "Urea",
    ),
    numeric("Fertilizer_Dosage", "Dosage (kg/ha)", Section::FertilizerStrategy, "100"),
    categorical("Yield_Unit", "Output Unit", Section::FertilizerStrategy, YIELD_UNITS, "Ton"),
];

/// All form fields in display order.
pub fn fields() -> &'static [FieldSpec] {
    FIELDS
}

/// Look up a field by its wire name (exact match).
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Position of a field in [`fields`].
pub(crate) fn index_of(name: &str) -> Option<usize> {
    FIELDS.iter().position(|f| f.name == name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_nineteen_unique_fields() {
        let names: std::collections::HashSet<_> = fields().iter().map(|f| f.name).collect();
        assert_eq!(fields().len(), 19);
        assert_eq!(names.len(), 19);
    }

    #[test]
    fn categorical_defaults_are_legal_choices() {
        for spec in fields() {
            if let Some(choices) = spec.choices() {
                assert!(!choices.is_empty(), "{} has no choices", spec.name);
                assert!(
                    choices.contains(&spec.default),
                    "{} default {:?} not in choice set",
                    spec.name,
                    spec.default
                );
            }
        }
    }

    #[test]
    fn numeric_defaults_parse() {
        for spec in fields().iter().filter(|f| f.is_numeric()) {
            assert!(spec.default.parse::<f64>().is_ok(), "{}", spec.name);
        }
    }

    #[test]
    fn seven_categorical_and_twelve_numeric() {
        let numeric = fields().iter().filter(|f| f.is_numeric()).count();
        assert_eq!(numeric, 12);
        assert_eq!(fields().len() - numeric, 7);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(field("Soil_pH").is_some());
        assert!(field("soil_ph").is_none());
        assert_eq!(index_of("Crop_Type"), Some(0));
    }

    #[test]
    fn every_section_has_fields() {
        for section in Section::ALL {
            assert!(fields().iter().any(|f| f.section == section), "{section}");
        }
    }
}
