//! `datalith` is the hub of a multi-format serialization stack: a
//! polymorphic, self-describing [`Value`] and the algorithms that
//! manipulate it without call-stack recursion.
//!
//! # The pieces
//!
//! - **[`Value`]** — a tagged variant over null, booleans, signed and
//!   unsigned 64-bit integers, reals, byte strings, arrays, key-sorted
//!   multimap objects, and links, refined by a 32-bit [`Subtype`] (a
//!   string tagged as UUID, an integer tagged as UNIX timestamp, ...) and
//!   an optional attribute side-map.
//! - **Iterative traversal** — prefix/postfix, single, parallel, and
//!   key-aligning diff walks over arbitrarily deep trees on explicit
//!   [`TraversalFrame`] stacks. Destruction, cloning, comparison, and
//!   debug formatting run the same way: depth is bounded by heap, never
//!   by the call stack.
//! - **Comparison** — a strict total order (kind rank, subtype, payload)
//!   with opt-in domain-comparable and subtype-ignored modes.
//! - **The conversion matrix** — lossy coercions between the scalar kinds
//!   plus a strict variant that fails instead of losing information, and
//!   the [`IntoDatalith`]/[`FromDatalith`] bridges to host types.
//! - **Links** — weak or strong pointers between [`ValueCell`]s with
//!   single-owner bookkeeping, chain dereferencing, and cycle detection.
//! - **The stream protocol** — the [`StreamHandler`]/[`StreamInput`]
//!   event interface every codec speaks, with [`ValueBuilder`] assembling
//!   events into trees and [`write_value`] driving trees out as events.
//!
//! # Features
//!
//! - `attributes` (default): per-value metadata side-maps, used for XML
//!   attributes, HTTP headers, and link names.

#![warn(missing_docs)]

mod array;
mod compare;
mod convert;
mod error;
mod link;
mod macros;
mod object;
mod stream;
mod subtype;
mod traverse;
mod value;

pub use array::Array;
pub use convert::{FromDatalith, IntoDatalith};
pub use error::{
    ConversionError, ConversionErrorKind, LinkError, LinkErrorKind, StreamError, StreamErrorKind,
};
pub use link::{Link, ValueCell};
pub use object::Object;
pub use stream::{NestingTracker, StreamHandler, StreamInput, ValueBuilder, write_value};
pub use subtype::Subtype;
pub use traverse::{Ancestry, TraversalFrame};
pub use value::{Kind, Value};
