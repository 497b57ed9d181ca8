//! Grading vocabulary.
//!
//! - [`predicate`]: `Predicate` trait, `Contains`, `ContainsAny`, `Judge`
//! - [`judge`]: `JudgeModel`, `ModelJudge`
//! - [`catalog`]: `GraderCatalog`, `GraderLoader`, `GraderSet`

pub mod catalog;
pub mod judge;
pub mod predicate;

pub use catalog::{
    contains, contains_any, judge, GraderCatalog, GraderDefinition, GraderLoader, GraderSet,
    GraderKind,
};
pub use judge::{parse_verdict, JudgeModel, ModelJudge};
pub use predicate::{Contains, ContainsAny, Judge, Predicate};
