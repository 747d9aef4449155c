//! Builders to construct scheduler components from configuration.

pub mod kernel_builder;

pub use kernel_builder::KernelBuilder;
