//! The configuration store: one document per project, one record per
//! published version.
//!
//! # Document Format
//!
//! ```json
//! [
//!   {
//!     "literalVersion": "1.2.0.0b2",
//!     "useStatistics": false,
//!     "versionId": 0,
//!     "updatePackageUri": "https://updates.example.com/1.2.0.0b2/<guid>.zip",
//!     "changelog": { "en": "Bug fixes" },
//!     "signature": "<base64>",
//!     "unsupportedVersions": ["1.0.0.0"],
//!     "architecture": "any",
//!     "operations": [],
//!     "mustUpdate": false
//!   }
//! ]
//! ```

mod store;
mod types;

pub use store::{
  DuplicateVersion, RemoteOptions, find_duplicate_versions, find_record, load_local, load_remote, record_position, save,
};
pub use types::{Architecture, ConfigurationRecord, StoreError};
