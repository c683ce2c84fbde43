//! Type-directed synthesis of save/restore statements for fields persisted
//! into a keyed heterogeneous store.
//!
//! Pipeline: [`model`] → [`field::FieldDescriptor`] → [`resolver::Resolver`]
//! picks a [`strategy::Strategy`] → [`analysis::Analysis`] →
//! [`policy::RestorePolicyWrapper`] → text, collected per class by
//! [`codegen::Codegen`] through the [`cache::AccessorCache`].
pub mod analysis;
pub mod cache;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod error;
pub mod field;
pub mod filter;
pub mod model;
pub mod path_de;
pub mod policy;
pub mod registry;
pub mod resolver;
pub mod strategy;
pub mod ty;
pub mod universe;
