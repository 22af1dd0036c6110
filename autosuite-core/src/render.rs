//! Literal rendering
//!
//! Turns values back into source text that evaluates to an equal value. The
//! check is a heuristic: a representation shaped like `<...>` is the default
//! placeholder for objects without a reconstructable form, so it is refused.
//! Other unrenderable values slip through.

use serde::{Deserialize, Serialize};

/// Anything that can describe itself as source text
pub trait Literal {
    /// Canonical debug representation, not necessarily reconstructable
    fn repr(&self) -> String;
}

impl<T: Literal + ?Sized> Literal for &T {
    fn repr(&self) -> String {
        (**self).repr()
    }
}

/// A value whose representation would not parse back into an equal value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("Value has no literal form: {repr}")]
pub struct Unrenderable {
    /// The representation that was refused
    pub repr: String,
}

/// Render a value as a reconstructable literal
pub fn render_literal(value: &dyn Literal) -> Result<String, Unrenderable> {
    let repr = value.repr();
    if is_placeholder(&repr) {
        return Err(Unrenderable { repr });
    }
    Ok(repr)
}

/// Whether a representation has the shape of a default object placeholder
pub fn is_placeholder(repr: &str) -> bool {
    repr.starts_with('<') && repr.ends_with('>')
}
