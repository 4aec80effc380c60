//! Host platform detection and standard directories.

pub mod arch;
pub mod paths;

pub use arch::HostArch;
