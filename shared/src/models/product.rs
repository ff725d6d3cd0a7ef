//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw-material family of a product
///
/// Parsed case-insensitively; serialized in upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Material {
    /// Cellophane bags, sold by the thousand sheets (millares)
    Celofan,
    /// Polyethylene, sold by the kilogram
    Polietileno,
}

impl Material {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Material::Celofan => "CELOFAN",
            Material::Polietileno => "POLIETILENO",
        }
    }

    /// Unit the quantity of a line item is expressed in
    pub const fn quantity_unit(&self) -> &'static str {
        match self {
            Material::Celofan => "millares",
            Material::Polietileno => "kg",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a material name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown material: {0}")]
pub struct UnknownMaterial(pub String);

impl FromStr for Material {
    type Err = UnknownMaterial;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CELOFAN" => Ok(Material::Celofan),
            "POLIETILENO" => Ok(Material::Polietileno),
            _ => Err(UnknownMaterial(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Material {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Bag-seal style of a CELOFAN product; selects the geometric price formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManufacturingType {
    Mordaza,
    Lateral,
    Pegol,
    /// Written "CENEFA + PEGOL" in the catalog
    CenefaPegol,
}

impl ManufacturingType {
    /// Lenient parse: trims, ignores case, accepts "CENEFA + PEGOL".
    ///
    /// Unrecognised text yields `None`, which the pricing engine treats as
    /// "no formula".
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .to_ascii_uppercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        match normalized.as_str() {
            "MORDAZA" => Some(Self::Mordaza),
            "LATERAL" => Some(Self::Lateral),
            "PEGOL" => Some(Self::Pegol),
            "CENEFA+PEGOL" | "CENEFA_PEGOL" | "CENEFAPEGOL" => Some(Self::CenefaPegol),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mordaza => "MORDAZA",
            Self::Lateral => "LATERAL",
            Self::Pegol => "PEGOL",
            Self::CenefaPegol => "CENEFA_PEGOL",
        }
    }
}

impl fmt::Display for ManufacturingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn lenient_manufacturing_type<'de, D>(deserializer: D) -> Result<Option<ManufacturingType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(ManufacturingType::parse))
}

/// Catalog entry, read-only from the pricing engine's perspective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSpec {
    pub id: i64,
    pub name: String,
    pub material: Material,
    #[serde(default, deserialize_with = "lenient_manufacturing_type")]
    pub manufacturing_type: Option<ManufacturingType>,
    #[serde(default)]
    pub width_cm: Option<Decimal>,
    #[serde(default)]
    pub length_cm: Option<Decimal>,
    #[serde(default)]
    pub gauge_microns: Option<Decimal>,
}

/// Absent or negative dimensions count as zero
#[inline]
fn dimension(value: Option<Decimal>) -> Decimal {
    value
        .filter(|v| v.is_sign_positive())
        .unwrap_or(Decimal::ZERO)
}

impl ProductSpec {
    pub fn width(&self) -> Decimal {
        dimension(self.width_cm)
    }

    pub fn length(&self) -> Decimal {
        dimension(self.length_cm)
    }

    pub fn gauge(&self) -> Decimal {
        dimension(self.gauge_microns)
    }

    /// Manufacturing type that actually drives pricing.
    ///
    /// Always `None` for POLIETILENO, whatever the catalog row says.
    pub fn seal(&self) -> Option<ManufacturingType> {
        match self.material {
            Material::Celofan => self.manufacturing_type,
            Material::Polietileno => None,
        }
    }
}
