//! nulscrub core - in-place NUL-sentinel scrubbing for object graphs
//!
//! Char-typed slots default to NUL (`'\u{0}'`) when nothing was ever
//! written to them. A scrubbing pass walks a mutable object graph of any
//! shape, cycles included, and rewrites every such slot to a plain space
//! while leaving all other data exactly as it found it.
//!
//! # Architecture
//!
//! ```text
//! Root → Schema lookup → Char slots → Nested fields → Shared work-list
//!          ↓ (cached per type, process-wide)            ↓ (identity-deduplicated)
//!        Registry                                     Drained after borrows release
//! ```
//!
//! # Guarantees
//!
//! - **Terminating**: identity tracking visits every node at most once,
//!   so cyclic and diamond-shaped graphs finish in one pass
//! - **Idempotent**: a second pass over scrubbed data replaces nothing
//! - **Surgical**: only char slots equal to the sentinel change; strings,
//!   numbers, keys, and unlisted fields are never touched
//! - **Total**: with default options a pass always completes, recording
//!   anything it could not reach
//!
//! # Example
//!
//! ```
//! use nulscrub_core::{scrub, Schema, Scrub};
//!
//! struct Badge {
//!     code: char,
//!     serial: Vec<char>,
//! }
//!
//! impl Scrub for Badge {
//!     fn schema(&self) -> Schema {
//!         Schema::branch("Badge")
//!             .char_field("code", |b: &mut Self| &mut b.code)
//!             .chars("serial", |b: &mut Self| b.serial.as_mut_slice())
//!     }
//! }
//!
//! let mut badge = Badge { code: '\u{0}', serial: vec!['7', '\u{0}'] };
//! let report = scrub(&mut badge);
//! assert_eq!(badge.code, ' ');
//! assert_eq!(badge.serial, vec!['7', ' ']);
//! assert_eq!(report.replaced, 2);
//! ```

use std::any::Any;

pub mod error;
mod impls;
mod leaf;
mod registry;
pub mod schema;
pub mod shared;
pub mod walk;

pub use error::{Error, Result, SkipReason};
pub use schema::{Field, FieldKind, Schema};
pub use shared::SharedHandle;
pub use walk::{AccessPolicy, Options, Report, Skipped};

use walk::Walker;

/// The char value treated as "never written".
pub const SENTINEL: char = '\u{0}';

/// What scrubbing writes over sentinel slots.
pub const REPLACEMENT: char = ' ';

/// A node in a scrubbable object graph.
///
/// The one requirement is a [`Schema`] listing the fields a pass may
/// touch. The schema for a concrete type is built once and cached
/// process-wide, so `schema` must be deterministic for its type and must
/// not itself start a pass. Standard containers, smart pointers, and the
/// usual atomic types already implement this trait; custom types opt in
/// field by field:
///
/// - fields left out of the schema are invisible to scrubbing
/// - inherited or indirectly owned data is only reached if a listed
///   field projects to it
pub trait Scrub: Any {
    /// Describe this type's walkable fields.
    fn schema(&self) -> Schema;
}

/// Scrub every reachable sentinel slot under `root`, in place.
///
/// Runs with [`Options::default`]: NUL becomes a plain space and
/// inaccessible fields are recorded in the report rather than failing
/// the pass. This entry point never errors.
pub fn scrub(root: &mut dyn Scrub) -> Report {
    let options = Options::default();
    let mut walker = Walker::new(&options);
    let outcome = walker.run(root);
    debug_assert!(outcome.is_ok(), "the ignore policy never surfaces errors");
    walker.into_report()
}

/// Scrub with explicit [`Options`].
///
/// # Errors
///
/// Only under [`AccessPolicy::Surface`]: the first inaccessible field or
/// shared node aborts the pass with [`Error::FieldInaccessible`] or
/// [`Error::SharedInaccessible`]. Slots already rewritten stay rewritten,
/// so a failed pass leaves the graph partially scrubbed; re-running once
/// the blocking borrow is released finishes the job.
pub fn scrub_with(root: &mut dyn Scrub, options: &Options) -> Result<Report> {
    let mut walker = Walker::new(options);
    walker.run(root)?;
    Ok(walker.into_report())
}
