//! Interleave Loader rewrites program units as they are loaded, so that a concurrency testing
//! harness can observe and control every operation the code under test performs.
//!
//! The [`InstrumentationLoader`] sits between the harness and a [`ParentLoader`]. For each
//! requested name it consults an [`EligibilityPolicy`], then either delegates to the parent or
//! reads the raw unit from a [`UnitSource`], applies a [`Pipeline`] of [`RewritePass`]es, and
//! writes the result with a [`UnitWriter`] that recomputes stack metadata. Results are cached
//! per loader, and each name is rewritten at most once even under concurrent loads.
//!
//! # Example
//!
//! ```rust
//! use interleave_loader::*;
//! use interleave_core::{FormatVersion, Insn, MethodNode, UnitNode};
//! use std::sync::Arc;
//!
//! let source = Arc::new(MemorySource::new());
//! source
//!     .insert_unit(
//!         &UnitNode::new(FormatVersion::V1_8, "pkg/Counter")
//!             .method(MethodNode::new("inc", vec![Insn::Return])),
//!     )
//!     .unwrap();
//!
//! let loader = InstrumentationLoader::builder(Arc::clone(&source), PassthroughLoader::new(source))
//!     .pass(|mut unit: UnitNode| -> Result<UnitNode, PassError> {
//!         for method in &mut unit.methods {
//!             method.instructions.insert(0, Insn::Intercept { hook: "before".into() });
//!         }
//!         Ok(unit)
//!     })
//!     .build();
//!
//! let artifact = loader.load("pkg.Counter").unwrap();
//! let unit = decode(artifact.bytes()).unwrap();
//! assert_eq!(unit.methods[0].instructions[0], Insn::Intercept { hook: "before".into() });
//! ```
//!
//! # Debugging
//!
//! Set the `INTERLEAVE_DEBUG` environment variable to print every unit after each pass, with the
//! lines the pass introduced highlighted.

#![deny(unused_must_use)]
#![warn(rust_2018_idioms, unreachable_pub)]

mod cache;
mod codec;
mod error;
mod hierarchy;
mod loader;
mod pipeline;
mod policy;
mod remapper;
mod source;
mod writer;

pub use {
    cache::ArtifactCache,
    codec::{decode, encode},
    error::{InstrumentError, LoadError, PassError, ResolveError, WriteError},
    hierarchy::HierarchyResolver,
    loader::{InstrumentationLoader, LoaderBuilder},
    pipeline::{Pipeline, RewritePass, Runner, Strategy},
    policy::{EligibilityPolicy, Pattern, PolicyConfig, Rule, Verdict},
    remapper::{Remapper, ShadowRemapper},
    source::{DirectorySource, MemorySource, ParentLoader, PassthroughLoader, UnitSource},
    writer::UnitWriter,
};
