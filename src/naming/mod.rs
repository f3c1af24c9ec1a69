//! Naming classifier
//!
//! Tokenizes resource names, classifies each token against the taxonomy,
//! detects the overall naming style, and works with tenant naming schemes.

mod classifier;
mod scheme;

pub use crate::taxonomy::tokenize;
pub use classifier::{
    analyze_name, classify_component, classify_naming_pattern, detect_separator,
    is_instance_component, split_case_boundaries, ClassifiedToken, ComponentKind, NameAnalysis,
    NamingPattern,
};
pub use scheme::{
    CaseFormat, ComponentDefinition, ComponentType, NameCheck, NamingScheme, ServiceAbbreviation,
};
