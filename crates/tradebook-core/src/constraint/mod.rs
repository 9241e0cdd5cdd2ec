//! Constraint enforcement module.
//!
//! Unique and foreign-key constraints are checked and maintained inside the
//! same sled transaction that writes the row, so concurrent writers cannot
//! slip a duplicate or a dangling reference between check and write.

mod reference_index;
mod unique_index;
mod validator;

pub use reference_index::ReferenceIndex;
pub use unique_index::UniqueIndex;
pub use validator::ConstraintValidator;
