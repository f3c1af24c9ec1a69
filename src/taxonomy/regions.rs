//! Region → short code table used for the location naming component

pub(super) const REGION_ABBREVIATIONS: &[(&str, &str)] = &[
    ("eastus", "eus"),
    ("eastus2", "eus2"),
    ("westus", "wus"),
    ("westus2", "wus2"),
    ("westus3", "wus3"),
    ("centralus", "cus"),
    ("southcentralus", "scus"),
    ("northcentralus", "ncus"),
    ("westcentralus", "wcus"),
    ("canadacentral", "cac"),
    ("canadaeast", "cae"),
    ("brazilsouth", "brs"),
    ("northeurope", "neu"),
    ("westeurope", "weu"),
    ("uksouth", "uks"),
    ("ukwest", "ukw"),
    ("francecentral", "frc"),
    ("germanywestcentral", "gwc"),
    ("swedencentral", "sdc"),
    ("switzerlandnorth", "szn"),
    ("norwayeast", "nwe"),
    ("australiaeast", "aue"),
    ("australiasoutheast", "ause"),
    ("japaneast", "jpe"),
    ("japanwest", "jpw"),
    ("koreacentral", "krc"),
    ("southeastasia", "sea"),
    ("eastasia", "ea"),
    ("centralindia", "inc"),
    ("southafricanorth", "san"),
    ("uaenorth", "uan"),
];
