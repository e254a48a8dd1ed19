//! This module specifies the core types for the Interleave instrumentation loader.
//!
//! # Usage
//!
//! Please see [the `interleave_loader` docs](https://docs.rs/interleave_loader/).
//!
//! # Features
//!
//! - `serde`: Implement `Serialize` and `Deserialize` where applicable.

#![cfg_attr(all(doc, CHANNEL_NIGHTLY), feature(doc_auto_cfg))]
#![deny(unused_must_use)]
#![warn(rust_2018_idioms, unreachable_pub)]

mod config;
mod name;
mod unit;

use std::fmt::{Debug, Formatter};

pub use config::{ModelCheckingConfiguration, TestConfiguration};
pub use name::{QualifiedName, ShadowNamespace};
pub use unit::{FormatVersion, Frame, Insn, MethodNode, UnitNode};

/// How an [`Artifact`] came to be.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Origin {
    /// Produced by the rewrite pipeline.
    Instrumented,
    /// Returned unmodified by the parent loader.
    Delegated,
}

/// A materialized, executable program unit.
#[derive(Clone, Eq, PartialEq)]
pub struct Artifact {
    name: QualifiedName,
    bytes: Vec<u8>,
    origin: Origin,
}

impl Artifact {
    pub fn new(name: QualifiedName, bytes: Vec<u8>, origin: Origin) -> Self {
        Artifact {
            name,
            bytes,
            origin,
        }
    }

    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }
}

impl Debug for Artifact {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .field("origin", &self.origin)
            .finish()
    }
}
