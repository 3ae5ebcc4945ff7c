pub mod base;
pub mod extractors;
pub mod normalize;
pub mod strategy;

pub use base::{Document, ExtractionResult, PageKind, RawEntry, RawValue};
pub use extractors::{extract_all, extract_all_with, extract_field, StrategyTable};
pub use normalize::{normalize, normalize_all};
pub use strategy::{Strategy, StrategyError};
