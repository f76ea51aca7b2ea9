//! Patient attributes and their one-hot encoding.
//!
//! Raw values arrive as untyped strings (form fields, CLI flags, JSON lines).
//! [`encode`] turns them into the fixed eleven-column [`EncodedFeatureVector`]
//! the model was trained on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PredictError;

/// Column names of the encoded vector, in training-time schema order
pub const FEATURE_NAMES: [&str; 11] = [
    "age",
    "bmi",
    "children",
    "smoker_no",
    "smoker_yes",
    "sex_female",
    "sex_male",
    "region_northeast",
    "region_northwest",
    "region_southeast",
    "region_southwest",
];

/// The six request fields, exactly as the caller supplied them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInput {
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub bmi: String,
    #[serde(default)]
    pub children: String,
    #[serde(default)]
    pub smoker: String,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub region: String,
}

impl RawInput {
    pub fn new(
        age: impl Into<String>,
        bmi: impl Into<String>,
        children: impl Into<String>,
        smoker: impl Into<String>,
        sex: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            age: age.into(),
            bmi: bmi.into(),
            children: children.into(),
            smoker: smoker.into(),
            sex: sex.into(),
            region: region.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Smoker {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Female,
    Male,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

/// Error for a categorical value outside its option set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory {
    pub value: String,
    pub expected: &'static [&'static str],
}

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized value '{}', expected one of: {}",
            self.value,
            self.expected.join(", ")
        )
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Smoker {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            other => Err(UnknownCategory {
                value: other.to_string(),
                expected: &["yes", "no"],
            }),
        }
    }
}

impl FromStr for Sex {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "female" => Ok(Self::Female),
            "male" => Ok(Self::Male),
            other => Err(UnknownCategory {
                value: other.to_string(),
                expected: &["male", "female"],
            }),
        }
    }
}

impl FromStr for Region {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "northeast" => Ok(Self::Northeast),
            "northwest" => Ok(Self::Northwest),
            "southeast" => Ok(Self::Southeast),
            "southwest" => Ok(Self::Southwest),
            other => Err(UnknownCategory {
                value: other.to_string(),
                expected: &["northeast", "northwest", "southeast", "southwest"],
            }),
        }
    }
}

/// How to treat a categorical value that is not one of the known options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryPolicy {
    /// Reject the request with an invalid-input error
    #[default]
    Strict,
    /// Leave every indicator of the group at zero
    ZeroFill,
}

/// Single-row feature vector with a fixed schema
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EncodedFeatureVector {
    pub age: f64,
    pub bmi: f64,
    pub children: f64,
    pub smoker_no: f64,
    pub smoker_yes: f64,
    pub sex_female: f64,
    pub sex_male: f64,
    pub region_northeast: f64,
    pub region_northwest: f64,
    pub region_southeast: f64,
    pub region_southwest: f64,
}

impl EncodedFeatureVector {
    /// Look up a column by its feature name
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "age" => self.age,
            "bmi" => self.bmi,
            "children" => self.children,
            "smoker_no" => self.smoker_no,
            "smoker_yes" => self.smoker_yes,
            "sex_female" => self.sex_female,
            "sex_male" => self.sex_male,
            "region_northeast" => self.region_northeast,
            "region_northwest" => self.region_northwest,
            "region_southeast" => self.region_southeast,
            "region_southwest" => self.region_southwest,
            _ => return None,
        };
        Some(value)
    }

    /// Columns in [`FEATURE_NAMES`] order
    pub fn values(&self) -> [f64; 11] {
        [
            self.age,
            self.bmi,
            self.children,
            self.smoker_no,
            self.smoker_yes,
            self.sex_female,
            self.sex_male,
            self.region_northeast,
            self.region_northwest,
            self.region_southeast,
            self.region_southwest,
        ]
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_NAMES.into_iter().zip(self.values())
    }
}

fn indicator(set: bool) -> f64 {
    if set {
        1.0
    } else {
        0.0
    }
}

fn parse_count(field: &'static str, raw: &str) -> Result<f64, PredictError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| PredictError::invalid_input(field, e.to_string()))?;
    if value < 0 {
        return Err(PredictError::invalid_input(
            field,
            format!("must not be negative, got {}", value),
        ));
    }
    Ok(value as f64)
}

fn parse_bmi(raw: &str) -> Result<f64, PredictError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e: std::num::ParseFloatError| PredictError::invalid_input("bmi", e.to_string()))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(PredictError::invalid_input(
            "bmi",
            format!("must be a positive number, got {}", raw.trim()),
        ));
    }
    Ok(value)
}

fn parse_category<T>(
    field: &'static str,
    raw: &str,
    policy: CategoryPolicy,
) -> Result<Option<T>, PredictError>
where
    T: FromStr<Err = UnknownCategory>,
{
    match raw.parse::<T>() {
        Ok(value) => Ok(Some(value)),
        Err(e) => match policy {
            CategoryPolicy::Strict => Err(PredictError::invalid_input(field, e.to_string())),
            CategoryPolicy::ZeroFill => {
                tracing::warn!(field, value = %raw, "Unrecognized category, leaving indicators at zero");
                Ok(None)
            }
        },
    }
}

/// Parse and one-hot encode a raw request
///
/// Numeric fields are trimmed before parsing. Categorical fields are compared
/// against the literal option strings.
pub fn encode(raw: &RawInput, policy: CategoryPolicy) -> Result<EncodedFeatureVector, PredictError> {
    let age = parse_count("age", &raw.age)?;
    let bmi = parse_bmi(&raw.bmi)?;
    let children = parse_count("children", &raw.children)?;

    let smoker = parse_category::<Smoker>("smoker", &raw.smoker, policy)?;
    let sex = parse_category::<Sex>("sex", &raw.sex, policy)?;
    let region = parse_category::<Region>("region", &raw.region, policy)?;

    Ok(EncodedFeatureVector {
        age,
        bmi,
        children,
        smoker_no: indicator(smoker == Some(Smoker::No)),
        smoker_yes: indicator(smoker == Some(Smoker::Yes)),
        sex_female: indicator(sex == Some(Sex::Female)),
        sex_male: indicator(sex == Some(Sex::Male)),
        region_northeast: indicator(region == Some(Region::Northeast)),
        region_northwest: indicator(region == Some(Region::Northwest)),
        region_southeast: indicator(region == Some(Region::Southeast)),
        region_southwest: indicator(region == Some(Region::Southwest)),
    })
}
