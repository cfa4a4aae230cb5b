//! Per-table mutual exclusion for imports.
//!
//! Imports into the same table are serialized so two uploads never interleave
//! their row writes. Previews and exports are read-only and never take these
//! locks.

pub mod state;
