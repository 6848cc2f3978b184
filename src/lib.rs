//! # Photo Frame
//!
//! Frames a photo on a colored card with a caption built from its camera
//! metadata, then saves the result wherever the platform allows.
//!
//! # Architecture: Upload, Compose, Export
//!
//! ```text
//! 1. Upload    photo file  →  Session        (bytes + metadata + caption suggestions)
//! 2. Compose   Session     →  Composition    (node tree: card, photo, caption rows)
//! 3. Export    Composition →  ExportResult   (settle images → PNG → persistence tiers)
//! ```
//!
//! Every stage talks to the outside world through a narrow trait: metadata
//! comes from a [`metadata::MetadataSource`], pixels from a
//! [`compose::Rasterizer`], and persistence goes through the capability
//! traits in [`export::capability`]. Tests swap any of them for recording
//! mocks and never touch the filesystem.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`metadata`] | Tag extraction (kamadak-exif), device-name derivation, tech-spec formatting |
//! | [`caption`] | Caption state: colors, themes, padding, aspect ratio, text lines |
//! | [`session`] | One photo at a time; upload replaces metadata and derived caption lines |
//! | [`compose`] | Composition tree, image settling, and the built-in PNG rasterizer |
//! | [`export`] | Export pipeline, tier plan, tier dispatcher, desktop capabilities |
//! | [`fault`] | Heterogeneous failures and `normalize_error` |
//! | [`diagnostics`] | Bounded in-memory log, mirrored to the `log` facade, exportable as JSON |
//! | [`notice`] | User-facing notices (info / success / error) |
//! | [`config`] | `config.toml` loading, validation, and merging over stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Tiered Persistence
//!
//! Where a framed photo can be saved depends on the platform and on what the
//! user granted. Rather than one save path with special cases, [`export::plan`]
//! produces an ordered list of tiers and [`export::persist`] walks it, stopping
//! at the first tier that succeeds. Every attempt is recorded in the result, so
//! a failed export explains itself.
//!
//! ## Faults Are Normalized Once
//!
//! Platform bridges fail with messages, error values, bare events, or JSON
//! payloads. All of them become a [`fault::Fault`] and pass through
//! [`fault::normalize_error`] before reaching a notice, which guarantees a
//! readable string (never an opaque object dump).
//!
//! ## Derived Caption Lines Are Suggestions
//!
//! Upload pre-fills device, system, and lens from metadata. Once the user
//! edits a line it stays as written until the next upload; lines set in the
//! configured defaults stay pinned for the whole session.

pub mod caption;
pub mod compose;
pub mod config;
pub mod diagnostics;
pub mod export;
pub mod fault;
pub mod metadata;
pub mod notice;
pub mod output;
pub mod session;
