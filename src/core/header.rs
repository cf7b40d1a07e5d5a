//! Header normalization
//!
//! Maps the many spellings a property label takes in real sheets
//! ("Pset", "SET PRESSURE", "Set Pressure") onto one [`Property`].

use std::fmt;

use crate::types::CellValue;

/// Canonical property names known to both sheet layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    TagNo,
    Phase,
    Fluid,
    FlowRate,
    SetPressure,
    BuiltUpBackPressure,
    ReliefTemperature,
    Viscosity,
    MolecularWeight,
    GasZ,
    MaxBpAtHeader,
    MinBpAtHeader,
    ReliefCondition,
    RevNo,
    Remark,
    DwgNo,
    PsvType,
    PsvCount,
    AllowableOverpressure,
    ReliefCase,
    PsvMaterial,
    RuptureDisk,
    Density,
    CpCv,
    NormalPressure,
    MechanicalDesignPressure,
    SuperimposedBackPressure,
    FlareSystem,
    Accumulation,
    NormalTemperature,
    MechanicalDesignTemperature,
    MaxBp,
    MinBp,
}

impl Property {
    pub fn name(self) -> &'static str {
        match self {
            Property::TagNo => "Tag No.",
            Property::Phase => "Phase",
            Property::Fluid => "Fluid",
            Property::FlowRate => "Flow Rate",
            Property::SetPressure => "Set Pressure",
            Property::BuiltUpBackPressure => "Built-up Back Pressure",
            Property::ReliefTemperature => "Relief Temperature",
            Property::Viscosity => "Viscosity",
            Property::MolecularWeight => "Molecular Weight",
            Property::GasZ => "Gas Z",
            Property::MaxBpAtHeader => "Max. BP@Header",
            Property::MinBpAtHeader => "Min. BP@Header",
            Property::ReliefCondition => "Relief Condition",
            Property::RevNo => "Rev. No.",
            Property::Remark => "Remark",
            Property::DwgNo => "Dwg No.",
            Property::PsvType => "PSV Type",
            Property::PsvCount => "No. of PSV",
            Property::AllowableOverpressure => "Allowable Overpressure",
            Property::ReliefCase => "Relief Case",
            Property::PsvMaterial => "PSV Material",
            Property::RuptureDisk => "Installed with Rupture Disk",
            Property::Density => "Density",
            Property::CpCv => "Cp/Cv",
            Property::NormalPressure => "Normal Pressure",
            Property::MechanicalDesignPressure => "Mechanical Design Pressure",
            Property::SuperimposedBackPressure => "Const./Variable Superimposed Back Pressure",
            Property::FlareSystem => "Flare System",
            Property::Accumulation => "Accumulation",
            Property::NormalTemperature => "Normal Temperature",
            Property::MechanicalDesignTemperature => "Mechanical Design Temperature",
            Property::MaxBp => "Max BP",
            Property::MinBp => "Min BP",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw label → property, searched in order.
///
/// Every canonical name appears as a key so that normalizing a name that was
/// already normalized gives it back unchanged.
pub const HEADER_ALIASES: &[(&str, Property)] = &[
    // Calculation Sheet row labels
    ("Tag No.", Property::TagNo),
    ("State (V/S/L)", Property::Phase),
    ("Phase", Property::Phase),
    ("Fluid", Property::Fluid),
    ("Flowing Fluid at Relieving Conditions", Property::Fluid),
    ("Flow Rate", Property::FlowRate),
    ("Required Flowrate", Property::FlowRate),
    ("Set Pressure", Property::SetPressure),
    ("Pset", Property::SetPressure),
    ("Built-up Back Pressure", Property::BuiltUpBackPressure),
    ("Ratio of Max. Back Pressure", Property::BuiltUpBackPressure),
    ("Relief Temperature", Property::ReliefTemperature),
    ("T", Property::ReliefTemperature),
    ("Viscosity", Property::Viscosity),
    ("mu", Property::Viscosity),
    ("Molecular Weight", Property::MolecularWeight),
    ("M", Property::MolecularWeight),
    ("Gas Z", Property::GasZ),
    ("Z", Property::GasZ),
    ("Max. BP@Header", Property::MaxBpAtHeader),
    ("Min. BP@Header", Property::MinBpAtHeader),
    ("Relief Condition", Property::ReliefCondition),
    ("Rev. No.", Property::RevNo),
    ("Remark", Property::Remark),
    ("Dwg No.", Property::DwgNo),
    ("Dwg. No.", Property::DwgNo),
    ("PSV Type", Property::PsvType),
    ("No. of PSV", Property::PsvCount),
    ("No. of Installed PSV:", Property::PsvCount),
    ("Allowable Overpressure", Property::AllowableOverpressure),
    ("AllowOverPres", Property::AllowableOverpressure),
    ("Relief Case", Property::ReliefCase),
    ("PSV Material", Property::PsvMaterial),
    ("PSV Material(CS/CMS/SS/NCA/A20)", Property::PsvMaterial),
    ("Installed with Rupture Disk", Property::RuptureDisk),
    ("WithRupDisk", Property::RuptureDisk),
    ("Density", Property::Density),
    ("k", Property::CpCv),
    ("Cp/Cv", Property::CpCv),
    // Data Sheet spellings
    ("TAG NO.", Property::TagNo),
    ("PHASE", Property::Phase),
    ("FLOW RATE", Property::FlowRate),
    ("NORMAL PRESSURE", Property::NormalPressure),
    ("MECHANICAL DESIGN PRESSURE", Property::MechanicalDesignPressure),
    ("SET PRESSURE", Property::SetPressure),
    (
        "CONST./VARIABLE SUPERIMPOSED BACK PRESSURE",
        Property::SuperimposedBackPressure,
    ),
    ("BUILT-UP BACK PRESSURE", Property::BuiltUpBackPressure),
    ("FLARE SYSTEM", Property::FlareSystem),
    ("ACCUMULATION", Property::Accumulation),
    ("NORMAL TEMPERATURE", Property::NormalTemperature),
    ("MECHANICAL DESIGN TEMPERATURE", Property::MechanicalDesignTemperature),
    ("RELIEF TEMPERATURE", Property::ReliefTemperature),
    ("VISCOSITY", Property::Viscosity),
    ("MOLECULAR WEIGHT", Property::MolecularWeight),
    ("GAS Z", Property::GasZ),
    ("MAX BP", Property::MaxBp),
    ("MIN BP", Property::MinBp),
    ("RELIEF CONDITION", Property::ReliefCondition),
    ("REV. NO.", Property::RevNo),
    ("REMARK", Property::Remark),
    ("DWG NO.", Property::DwgNo),
    ("PSV TYPE", Property::PsvType),
    ("NO. OF PSV", Property::PsvCount),
    ("ALLOWABLE OVERPRESSURE", Property::AllowableOverpressure),
];

/// Normalize a cell used as a label. Non-text and blank cells are unrecognized.
pub fn normalize(label: &CellValue) -> Option<Property> {
    label.as_text().and_then(normalize_label)
}

/// Exact match on the trimmed label first, then a case-insensitive scan
pub fn normalize_label(label: &str) -> Option<Property> {
    let cleaned = label.trim();
    if cleaned.is_empty() {
        return None;
    }

    if let Some((_, property)) = HEADER_ALIASES.iter().find(|(key, _)| *key == cleaned) {
        return Some(*property);
    }

    let folded = cleaned.to_uppercase();
    HEADER_ALIASES
        .iter()
        .find(|(key, _)| key.trim().to_uppercase() == folded)
        .map(|(_, property)| *property)
}
