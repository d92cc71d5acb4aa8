//! Link calculation front end.
//!
//! Reads a link definition (JSON file or a built-in per-topology template),
//! resolves formula-valued parameter fields, and hands a typed parameter
//! snapshot to the link-budget engine.

pub mod input;
pub mod templates;

pub use input::LinkInput;
pub use templates::template_for;
