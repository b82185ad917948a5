mod backends;
mod composition;
mod compression;
mod serialization;

pub use backends::{Backend, CompositionConfig, FeOxDb, Moka, Redis};
pub use composition::{CompositionPolicyConfig, ReadPolicy, RefillPolicyConfig, WritePolicy};
pub use compression::Compression;
pub use serialization::{
    BackendConfig, KeyFormat, KeySerialization, ValueFormat, ValueSerialization,
};
