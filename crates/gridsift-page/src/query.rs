//! Declarative locator strategies.
//!
//! Attribute drift is the central hazard this engine is built for: class
//! names and ids change between releases of the target application. Instead
//! of branching code per UI variant, every logical target carries an ordered
//! list of strategies tried in priority order. New variants are supported by
//! appending a strategy to the data, not by editing control flow.

/// One locator strategy for finding elements in the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// Structural/attribute query (CSS selector) against the live tree.
    Css(&'static str),
    /// Elements matching `selector` whose visible text contains `needle`.
    TextContains {
        selector: &'static str,
        needle: &'static str,
    },
    /// Driver-evaluated script returning matching elements by identity.
    ///
    /// The script runs in the page context and is expected to return an
    /// array of elements; the driver mints handles for them. Used as the
    /// last resort when structural queries have drifted out from under us.
    Script(&'static str),
}

impl Query {
    /// Whether this strategy goes through script evaluation.
    pub fn is_script(&self) -> bool {
        matches!(self, Query::Script(_))
    }
}

/// An ordered list of strategies for one logical UI target.
///
/// Strategies are tried in order; the first one that yields a usable
/// candidate wins. Failed attempts have no side effects.
#[derive(Debug, Clone, Copy)]
pub struct QuerySpec {
    /// Stable name for logging and progress reporting.
    pub target: &'static str,
    /// Strategies in priority order.
    pub strategies: &'static [Query],
}

impl QuerySpec {
    pub const fn new(target: &'static str, strategies: &'static [Query]) -> Self {
        Self { target, strategies }
    }
}
