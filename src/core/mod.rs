pub mod namespace;
pub mod resolver;

pub use namespace::{global, seed_global, Member, Namespace, NamespaceStore};
pub use resolver::{module, Dependency, Resolver, Strictness};
pub use crate::utils::error::Result;
