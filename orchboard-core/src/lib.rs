//! Orchboard core library — section parsing, document I/O and claim splicing.
//!
//! Public API surface:
//! - [`sections`] — [`parse`] and [`SectionSet`]
//! - [`document`] — load / write / snapshot of the coordination file
//! - [`claim`] — validation, [`insert_claim`] and the [`apply_claim`] pipeline
//! - [`error`] — [`BoardError`]

pub mod claim;
pub mod document;
pub mod error;
pub mod sections;

pub use claim::{
    apply_claim, authorize, insert_claim, listed_claims, ClaimError, ClaimRecord, ClaimRequest,
};
pub use error::BoardError;
pub use sections::{parse, Section, SectionSet};
