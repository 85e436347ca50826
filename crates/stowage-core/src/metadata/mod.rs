//! Class and field metadata
//!
//! Descriptions live in an explicit [`Registry`] keyed by class id and field
//! name. Inheritance is an explicit parent link on each class.
//!
//! - `types`: descriptors, sources and declared types
//! - `registry`: the store and its ancestor-walking lookups
//! - `builder`: fluent registration surface
//!
//! Copyright (c) 2025 Stowage Team
//! Licensed under the Apache-2.0 license

pub mod builder;
pub mod registry;
pub mod types;


pub use builder::{ClassBuilder, FieldBuilder};
pub use registry::Registry;
pub use types::{
    ClassId, ElementType, FieldDescriptor, FieldType, RequestTransformer, Source, Transformer,
    VirtualTransformer,
};
