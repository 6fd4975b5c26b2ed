//! Text canonicalization shared by training-time and serving-time code
//!
//! - [`normalize`]: the byte-stable normalizer every classifier input passes through
//! - [`html`]: entity unescaping and tag stripping for message bodies

pub mod html;
pub mod normalize;

pub use html::{collapse_whitespace, html_to_text};
pub use normalize::{normalize, normalize_opt, NormalizedText, MAX_CELL_LEN};
