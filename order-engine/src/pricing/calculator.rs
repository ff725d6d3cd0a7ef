//! Unit price and weight calculator
//!
//! Geometric formulas that turn a bag's dimensions (cm), gauge (microns)
//! and a price per kilogram into a price per thousand sheets. All
//! functions are total: missing dimensions count as zero and arithmetic is
//! checked, so nothing panics. Results are unrounded; rounding happens when a line item is
//! built.

use rust_decimal::prelude::*;
use shared::models::{ManufacturingType, ProductSpec};

const TEN_THOUSAND: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Sheet density factor used by the weight formulas (in place of the gauge)
const WEIGHT_FACTOR: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

/// Extra width added by each seal style, in cm
fn seal_allowance(seal: ManufacturingType) -> Decimal {
    match seal {
        ManufacturingType::Mordaza => Decimal::TWO,
        ManufacturingType::Lateral => Decimal::ZERO,
        ManufacturingType::Pegol => Decimal::from(3),
        ManufacturingType::CenefaPegol => Decimal::from(6),
    }
}

/// Film area (cm², both faces) of a single bag
fn film_area(spec: &ProductSpec, seal: ManufacturingType) -> Option<Decimal> {
    let length = spec.length();
    let width = spec.width();

    let face = match seal {
        // MORDAZA and PEGOL add the allowance to the face area
        ManufacturingType::Mordaza | ManufacturingType::Pegol => {
            length.checked_mul(width)?.checked_add(seal_allowance(seal))?
        }
        ManufacturingType::Lateral => length.checked_mul(width)?,
        // CENEFA + PEGOL widens the bag itself
        ManufacturingType::CenefaPegol => {
            length.checked_mul(width.checked_add(seal_allowance(seal))?)?
        }
    };
    face.checked_mul(Decimal::TWO)
}

/// Fixed finishing cost per thousand for adhesive-strip styles
fn finishing_cost(spec: &ProductSpec, seal: ManufacturingType) -> Option<Decimal> {
    let length = spec.length();
    match seal {
        ManufacturingType::Pegol => length
            .checked_mul(Decimal::new(12, 2))?
            .checked_add(Decimal::from(13)),
        ManufacturingType::CenefaPegol => length
            .checked_mul(Decimal::new(21, 2))?
            .checked_add(Decimal::from(20)),
        ManufacturingType::Mordaza | ManufacturingType::Lateral => Some(Decimal::ZERO),
    }
}

/// Price per thousand sheets, `None` on overflow
///
/// | Seal | Formula |
/// |------|---------|
/// | MORDAZA | `((l·w + 2)·2·g / 10000)·p` |
/// | LATERAL | `((l·w)·2·g / 10000)·p` |
/// | PEGOL | `((l·w + 3)·2·g / 10000)·p + l·0.12 + 13` |
/// | CENEFA + PEGOL | `((l·(w + 6))·2·g / 10000)·p + l·0.21 + 20` |
/// | none / POLIETILENO | `p` |
///
/// A non-positive `price_per_kg` yields zero.
pub fn try_unit_price(spec: &ProductSpec, price_per_kg: Decimal) -> Option<Decimal> {
    if price_per_kg <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }

    match spec.seal() {
        Some(seal) => film_area(spec, seal)?
            .checked_mul(spec.gauge())?
            .checked_div(TEN_THOUSAND)?
            .checked_mul(price_per_kg)?
            .checked_add(finishing_cost(spec, seal)?),
        None => Some(price_per_kg),
    }
}

/// Price per thousand sheets (zero when the dimensions overflow)
pub fn compute_unit_price(spec: &ProductSpec, price_per_kg: Decimal) -> Decimal {
    try_unit_price(spec, price_per_kg).unwrap_or(Decimal::ZERO)
}

/// Kilograms per thousand sheets, `None` on overflow
pub fn try_weight_per_thousand(spec: &ProductSpec) -> Option<Decimal> {
    match spec.seal() {
        Some(seal) => spec
            .length()
            .checked_mul(spec.width().checked_add(seal_allowance(seal))?)?
            .checked_mul(Decimal::TWO)?
            .checked_mul(WEIGHT_FACTOR)?
            .checked_div(TEN_THOUSAND),
        None => Some(Decimal::ZERO),
    }
}

/// Kilograms per thousand sheets (CELOFAN informational display)
///
/// Same areas as [`compute_unit_price`] but the allowance is always applied
/// to the width and a fixed factor of 25 replaces the gauge. Zero when the
/// product has no seal formula or the dimensions overflow.
pub fn compute_weight_per_thousand(spec: &ProductSpec) -> Decimal {
    try_weight_per_thousand(spec).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shared::models::Material;

    fn celofan(seal: Option<ManufacturingType>, width: Decimal, length: Decimal, gauge: Decimal) -> ProductSpec {
        ProductSpec {
            id: 1,
            name: "Bolsa".to_string(),
            material: Material::Celofan,
            manufacturing_type: seal,
            width_cm: Some(width),
            length_cm: Some(length),
            gauge_microns: Some(gauge),
        }
    }

    #[test]
    fn test_mordaza_formula() {
        // ((40·30 + 2)·2·25 / 10000)·45
        let spec = celofan(Some(ManufacturingType::Mordaza), dec!(30), dec!(40), dec!(25));
        assert_eq!(compute_unit_price(&spec, dec!(45)), dec!(270.45));
    }

    #[test]
    fn test_lateral_formula() {
        // (1200·2·25 / 10000)·45 = 6·45
        let spec = celofan(Some(ManufacturingType::Lateral), dec!(30), dec!(40), dec!(25));
        assert_eq!(compute_unit_price(&spec, dec!(45)), dec!(270));
    }

    #[test]
    fn test_pegol_formula() {
        // (1203·2·25 / 10000)·45 + 40·0.12 + 13 = 270.675 + 4.8 + 13
        let spec = celofan(Some(ManufacturingType::Pegol), dec!(30), dec!(40), dec!(25));
        assert_eq!(compute_unit_price(&spec, dec!(45)), dec!(288.475));
    }

    #[test]
    fn test_cenefa_pegol_formula() {
        // (40·36·2·25 / 10000)·45 + 40·0.21 + 20 = 324 + 8.4 + 20
        let spec = celofan(Some(ManufacturingType::CenefaPegol), dec!(30), dec!(40), dec!(25));
        assert_eq!(compute_unit_price(&spec, dec!(45)), dec!(352.4));
    }

    #[test]
    fn test_unset_type_returns_price_per_kg() {
        let spec = celofan(None, dec!(30), dec!(40), dec!(25));
        assert_eq!(compute_unit_price(&spec, dec!(45)), dec!(45));
    }

    #[test]
    fn test_polietileno_ignores_dimensions() {
        let spec = ProductSpec {
            id: 2,
            name: "Rollo".to_string(),
            material: Material::Polietileno,
            manufacturing_type: Some(ManufacturingType::Pegol),
            width_cm: Some(dec!(80)),
            length_cm: Some(dec!(120)),
            gauge_microns: Some(dec!(50)),
        };
        assert_eq!(compute_unit_price(&spec, dec!(35)), dec!(35));
        assert_eq!(compute_weight_per_thousand(&spec), Decimal::ZERO);
    }

    #[test]
    fn test_non_positive_price_yields_zero() {
        let spec = celofan(Some(ManufacturingType::Mordaza), dec!(30), dec!(40), dec!(25));
        assert_eq!(compute_unit_price(&spec, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(compute_unit_price(&spec, dec!(-5)), Decimal::ZERO);
    }

    #[test]
    fn test_missing_dimensions_count_as_zero() {
        let spec = ProductSpec {
            id: 3,
            name: "Sin medidas".to_string(),
            material: Material::Celofan,
            manufacturing_type: Some(ManufacturingType::Pegol),
            width_cm: None,
            length_cm: None,
            gauge_microns: None,
        };
        // Only the fixed finishing cost survives
        assert_eq!(compute_unit_price(&spec, dec!(45)), dec!(13));
        assert_eq!(compute_weight_per_thousand(&spec), Decimal::ZERO);
    }

    #[test]
    fn test_weight_per_thousand() {
        let mordaza = celofan(Some(ManufacturingType::Mordaza), dec!(30), dec!(40), dec!(25));
        let lateral = celofan(Some(ManufacturingType::Lateral), dec!(30), dec!(40), dec!(25));
        let pegol = celofan(Some(ManufacturingType::Pegol), dec!(30), dec!(40), dec!(25));
        let cenefa = celofan(Some(ManufacturingType::CenefaPegol), dec!(30), dec!(40), dec!(25));

        // 40·32·2·25 / 10000
        assert_eq!(compute_weight_per_thousand(&mordaza), dec!(6.4));
        assert_eq!(compute_weight_per_thousand(&lateral), dec!(6));
        assert_eq!(compute_weight_per_thousand(&pegol), dec!(6.6));
        assert_eq!(compute_weight_per_thousand(&cenefa), dec!(7.2));
    }

    #[test]
    fn test_weight_does_not_depend_on_gauge() {
        let thin = celofan(Some(ManufacturingType::Lateral), dec!(10), dec!(20), dec!(15));
        let thick = celofan(Some(ManufacturingType::Lateral), dec!(10), dec!(20), dec!(60));
        assert_eq!(
            compute_weight_per_thousand(&thin),
            compute_weight_per_thousand(&thick)
        );
    }

    #[test]
    fn test_huge_dimensions_do_not_panic() {
        let huge = dec!(1000000000000000);
        let spec = celofan(Some(ManufacturingType::Lateral), huge, huge, dec!(25));
        assert_eq!(try_unit_price(&spec, dec!(45)), None);
        assert_eq!(compute_unit_price(&spec, dec!(45)), Decimal::ZERO);
        assert_eq!(try_weight_per_thousand(&spec), None);
        assert_eq!(compute_weight_per_thousand(&spec), Decimal::ZERO);
    }
}
