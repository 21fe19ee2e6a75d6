//! The query catalog: parameterized analytical queries over the joined view.
//!
//! Each query is a pure function of its input table and explicit typed
//! parameters, with deterministic row ordering (documented secondary sort
//! keys break ties, never incidental iteration order). Data-quality gaps in
//! the input — unmatched foreign keys, null brands, null cohorts — are
//! handled by exclusion rules stated on each query, not by errors.

mod brands;
mod power_users;
mod spend_share;

pub use brands::top_brands;
pub use power_users::power_users;
pub use spend_share::category_spend_share;
