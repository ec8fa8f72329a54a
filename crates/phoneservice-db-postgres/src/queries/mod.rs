//! SQL for the `phone` table.
//!
//! - [`filter`]: predicate and sort translation to parameterized SQL
//! - [`crud`]: statements executed against the pool

pub mod crud;
pub mod filter;
