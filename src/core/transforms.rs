//! Per-field value transforms
//!
//! Every function here is total: input that cannot be interpreted degrades to
//! a placeholder ("-", blank, "N") instead of failing the conversion.

use crate::types::CellValue;

/// Placeholder written for missing or unusable values on the Data Sheet
pub const PLACEHOLDER: &str = "-";

fn placeholder() -> CellValue {
    CellValue::text(PLACEHOLDER)
}

fn folded(value: &CellValue) -> Option<String> {
    value.as_text().map(|s| s.trim().to_uppercase())
}

/// Round the exact binary value to one decimal place, ties to even (0.25 → 0.2)
fn round1(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

//==============================================================================
// Calculation Sheet → Data Sheet
//==============================================================================

/// Missing → "-", integral floats → integers, everything else unchanged
pub fn convert_value(value: Option<&CellValue>) -> CellValue {
    match value {
        None | Some(CellValue::Empty) => placeholder(),
        Some(CellValue::Float(f)) if f.is_nan() => placeholder(),
        Some(CellValue::Float(f))
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 =>
        {
            CellValue::Int(*f as i64)
        }
        Some(other) => other.clone(),
    }
}

/// Phase code from the Calculation Sheet → state word on the Data Sheet
pub fn phase_state(value: Option<&CellValue>) -> CellValue {
    let state = match value.and_then(folded).as_deref() {
        Some("V" | "VAPOR" | "GAS") => "VAPOR",
        Some("S" | "STEAM") => "STEAM",
        Some("L" | "LIQUID") => "LIQUID",
        _ => PLACEHOLDER,
    };
    CellValue::text(state)
}

/// "<min> / <max - min>" from the header back pressures, or "-"
pub fn back_pressure(min: Option<&CellValue>, max: Option<&CellValue>) -> CellValue {
    let (Some(min), Some(max)) = (
        min.and_then(CellValue::as_f64),
        max.and_then(CellValue::as_f64),
    ) else {
        return placeholder();
    };

    let built_up = max - min;
    if built_up < 0.0 {
        return placeholder();
    }

    let min = convert_value(Some(&CellValue::Float(min)));
    let built_up = convert_value(Some(&CellValue::Float(round1(built_up))));
    CellValue::text(format!("{} / {}", min, built_up))
}

//==============================================================================
// Data Sheet → Calculation Sheet
//==============================================================================

/// State word on the Data Sheet → single-letter phase code, blank if unknown
pub fn state_code(value: &CellValue) -> Option<&'static str> {
    match folded(value).as_deref() {
        Some("VAPOR" | "GAS") => Some("V"),
        Some("STEAM") => Some("S"),
        Some("LIQUID") => Some("L"),
        _ => None,
    }
}

/// Back-pressure ratio implied by the PSV type letter
pub fn psv_ratio(psv_type: &CellValue) -> CellValue {
    match folded(psv_type).as_deref() {
        Some("C") => CellValue::Float(0.1),
        Some("B") => CellValue::Float(0.3),
        Some("P") => CellValue::Float(1.0),
        _ => CellValue::Empty,
    }
}

/// "Y" when the remark mentions a rupture disk, "N" otherwise
pub fn rupture_disk(remark: &CellValue) -> CellValue {
    let mentioned = remark
        .as_text()
        .is_some_and(|s| s.to_lowercase().contains("rupture disk"));
    CellValue::text(if mentioned { "Y" } else { "N" })
}

fn back_pressure_parts(value: &CellValue) -> Option<Vec<f64>> {
    if value.is_blank() {
        return None;
    }
    if let Some(number) = value.as_f64() {
        return Some(vec![number]);
    }
    value
        .as_text()?
        .split('/')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect()
}

/// Sum of an "X / Y" back-pressure string (the max back pressure), blank if unreadable
pub fn back_pressure_sum(value: &CellValue) -> CellValue {
    back_pressure_parts(value)
        .map(|parts| CellValue::Float(parts.iter().sum()))
        .unwrap_or_default()
}

/// First component of an "X / Y" back-pressure string (the min back pressure)
pub fn back_pressure_left(value: &CellValue) -> CellValue {
    if value.is_blank() {
        return CellValue::Empty;
    }
    value
        .as_f64()
        .or_else(|| {
            value
                .as_text()
                .and_then(|s| s.split('/').next())
                .and_then(|part| part.trim().parse::<f64>().ok())
        })
        .map(CellValue::Float)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> CellValue {
        CellValue::text(s)
    }

    #[test]
    fn test_convert_value_collapses_integral_floats() {
        assert_eq!(convert_value(Some(&CellValue::Float(3.0))), CellValue::Int(3));
        assert_eq!(convert_value(Some(&CellValue::Float(3.5))), CellValue::Float(3.5));
        assert_eq!(convert_value(Some(&CellValue::Float(-2.0))), CellValue::Int(-2));
    }

    #[test]
    fn test_convert_value_missing() {
        assert_eq!(convert_value(None), text("-"));
        assert_eq!(convert_value(Some(&CellValue::Empty)), text("-"));
        assert_eq!(convert_value(Some(&CellValue::Float(f64::NAN))), text("-"));
    }

    #[test]
    fn test_convert_value_passes_other_values() {
        assert_eq!(convert_value(Some(&text("PSV-101"))), text("PSV-101"));
        assert_eq!(convert_value(Some(&CellValue::Int(4))), CellValue::Int(4));
        assert_eq!(convert_value(Some(&CellValue::Bool(true))), CellValue::Bool(true));
    }

    #[test]
    fn test_phase_state() {
        assert_eq!(phase_state(Some(&text("V"))), text("VAPOR"));
        assert_eq!(phase_state(Some(&text(" s "))), text("STEAM"));
        assert_eq!(phase_state(Some(&text("l"))), text("LIQUID"));
        assert_eq!(phase_state(Some(&text("Liquid"))), text("LIQUID"));
        assert_eq!(phase_state(Some(&text("X"))), text("-"));
        assert_eq!(phase_state(Some(&CellValue::Int(1))), text("-"));
        assert_eq!(phase_state(None), text("-"));
    }

    #[test]
    fn test_back_pressure_formats_min_and_built_up() {
        let result = back_pressure(Some(&CellValue::Float(50.8)), Some(&CellValue::Float(55.2)));
        assert_eq!(result, text("50.8 / 4.4"));
    }

    #[test]
    fn test_back_pressure_collapses_integers() {
        let result = back_pressure(Some(&CellValue::Float(50.0)), Some(&CellValue::Int(60)));
        assert_eq!(result, text("50 / 10"));

        let result = back_pressure(Some(&text("1.5")), Some(&text(" 1.5 ")));
        assert_eq!(result, text("1.5 / 0"));
    }

    #[test]
    fn test_back_pressure_rounds_ties_to_even() {
        assert_eq!(
            back_pressure(Some(&CellValue::Float(50.0)), Some(&CellValue::Float(50.25))),
            text("50 / 0.2")
        );
        assert_eq!(
            back_pressure(Some(&CellValue::Int(0)), Some(&CellValue::Float(2.25))),
            text("0 / 2.2")
        );
        assert_eq!(
            back_pressure(Some(&CellValue::Float(0.0)), Some(&CellValue::Float(0.35))),
            text("0 / 0.3")
        );
    }

    #[test]
    fn test_back_pressure_negative_or_invalid() {
        assert_eq!(
            back_pressure(Some(&CellValue::Float(50.8)), Some(&CellValue::Int(40))),
            text("-")
        );
        assert_eq!(
            back_pressure(Some(&text("n/a")), Some(&CellValue::Float(55.2))),
            text("-")
        );
        assert_eq!(back_pressure(None, Some(&CellValue::Float(55.2))), text("-"));
        assert_eq!(
            back_pressure(Some(&CellValue::Float(50.8)), Some(&text("F.V."))),
            text("-")
        );
        assert_eq!(back_pressure(Some(&CellValue::Float(50.8)), None), text("-"));
    }

    #[test]
    fn test_state_code() {
        assert_eq!(state_code(&text("VAPOR")), Some("V"));
        assert_eq!(state_code(&text("GAS")), Some("V"));
        assert_eq!(state_code(&text("STEAM")), Some("S"));
        assert_eq!(state_code(&text("LIQUID")), Some("L"));
        assert_eq!(state_code(&text("-")), None);
        assert_eq!(state_code(&CellValue::Empty), None);
    }

    #[test]
    fn test_psv_ratio() {
        assert_eq!(psv_ratio(&text("C")), CellValue::Float(0.1));
        assert_eq!(psv_ratio(&text("B")), CellValue::Float(0.3));
        assert_eq!(psv_ratio(&text("P")), CellValue::Float(1.0));
        assert_eq!(psv_ratio(&text("Q")), CellValue::Empty);
        assert_eq!(psv_ratio(&CellValue::Empty), CellValue::Empty);
    }

    #[test]
    fn test_rupture_disk() {
        assert_eq!(rupture_disk(&text("Fitted with Rupture Disk")), text("Y"));
        assert_eq!(rupture_disk(&text("N/A")), text("N"));
        assert_eq!(rupture_disk(&CellValue::Empty), text("N"));
    }

    #[test]
    fn test_back_pressure_split() {
        assert_eq!(back_pressure_sum(&text("50.8 / 4.4")), CellValue::Float(50.8 + 4.4));
        assert_eq!(back_pressure_left(&text("50.8 / 4.4")), CellValue::Float(50.8));
        assert_eq!(back_pressure_sum(&CellValue::Int(12)), CellValue::Float(12.0));
    }

    #[test]
    fn test_back_pressure_split_tolerates_garbage() {
        assert_eq!(back_pressure_sum(&text("50.8 / F.V.")), CellValue::Empty);
        assert_eq!(back_pressure_left(&text("50.8 / F.V.")), CellValue::Float(50.8));
        assert_eq!(back_pressure_left(&text("-")), CellValue::Empty);
        assert_eq!(back_pressure_sum(&CellValue::Empty), CellValue::Empty);
    }
}
