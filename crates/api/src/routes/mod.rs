//! Route Handlers

pub mod alerts;
pub mod cases;
pub mod fuzzy;
pub mod query;
pub mod relations;
pub mod rules;
