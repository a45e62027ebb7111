#[cfg(feature = "cli")]
pub mod cli;
pub mod manifest;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command, LogFormat};
pub use manifest::{DomainDecl, Manifest, ResolverConfig, ViewDecl};
