// Domain layer: mapped domain types and the ports to external capabilities.

pub mod macros;
pub mod model;
pub mod ports;

pub use model::{
    define, getter_name, Accessor, ConstructOptions, DomainMapping, DomainObject, DomainType,
    FieldDescriptor, PayloadSeed,
};
