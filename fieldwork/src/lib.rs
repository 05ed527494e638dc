//! Fieldwork - multi-tenant geospatial field-data collection platform
//!
//! Datasets carry a runtime-defined field schema, point geometries with
//! timestamped entries, CSV import/export, and per-dataset access rules
//! with optional polygon-based mapping-area restrictions.

pub mod access;
pub mod api;
pub mod areas;
pub mod auth;
pub mod codec;
pub mod data;
pub mod entity;
pub mod export;
pub mod import;
pub mod schema;
pub mod typology;
