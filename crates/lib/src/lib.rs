//! patchline-lib: update catalogs, resolution and publishing.
//!
//! This crate provides:
//! - `version`: parsing, ordering and rendering of update versions
//! - `operation`: declarative system mutations shipped with a package
//! - `config`: the per-project catalog of configuration records
//! - `resolve`: which record, if any, a client should update to
//! - `project`: project definitions and their on-disk layout
//! - `publish`: editing a record and propagating it with compensation

pub mod config;
pub mod consts;
pub mod operation;
pub mod platform;
pub mod project;
pub mod publish;
pub mod resolve;
pub mod util;
pub mod version;
