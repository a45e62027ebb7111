//! Namespace resolution, payload-mapped domain objects and template views.

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;
pub mod view;

pub use crate::core::{module, Dependency, Member, Namespace, NamespaceStore, Resolver, Strictness};
pub use domain::{define, DomainMapping, DomainObject, DomainType};
pub use utils::error::{CarpeError, Result};
pub use view::{Behavior, View, ViewClass, ViewOptions};

#[doc(hidden)]
pub mod __private {
    pub use paste;
    pub use serde;
    pub use serde_json;
}
