//! Screen-space vector fields.
//!
//! [`build_field`] samples a geographic grid at every other pixel of a globe,
//! corrects each vector for the projection's local distortion and colors the
//! globe's visibility mask by the overlay value. The resulting [`Field`] answers
//! per-pixel lookups for the particle animator.
//!
//! ```text
//! Globe ──► Mask::rasterize ──┐
//!                             ├─► build_field ──► Field { columns, overlay }
//! GridPair ─► interpolate ────┘        │
//!                                      └─► progress (time sliced)
//! ```

pub mod builder;
pub mod config;
pub mod field;
pub mod progress;

pub use builder::{build_field, OVERLAY_ALPHA};
pub use config::BuilderConfig;
pub use field::{Field, FieldSample, RANDOMIZE_RETRIES};
pub use progress::{NoProgress, ProgressSink};
