//! Core types, derived metrics, and datastore contracts for the campaign dashboard.

pub mod campaign;
pub mod classification;
pub mod cost;
pub mod display;
pub mod error;
pub mod metrics;
pub mod range;
pub mod repository;
pub mod rules;

pub use campaign::*;
pub use classification::*;
pub use cost::*;
pub use display::*;
pub use error::{
    ConflictCode, DbErrorCode, Error, ErrorKind, NotFoundCode, Result, ValidationErrorCode,
};
pub use metrics::*;
pub use range::*;
pub use repository::*;
pub use rules::{MappingRule, MatchedRule, PatternType, RuleMatch, RuleSet};
