//! Page-driver contracts for gridsift.
//!
//! The extraction engine never talks to a browser directly. It drives an
//! abstract [`PageHandle`] supplied by the hosting application, a thin
//! adapter over whatever automation transport is in use (CDP, WebDriver, a
//! test fake). This crate defines that seam:
//!
//! - [`PageHandle`]: query and mutate the rendered document
//! - [`ElementHandle`]: an opaque reference to one live DOM node
//! - [`Query`] / [`QuerySpec`]: declarative locator strategies
//! - [`PageError`]: the driver-side failure taxonomy
//!
//! Session bootstrap, navigation to the target application, and
//! authentication are the driver's responsibility, not this contract's.

mod error;
mod handle;
mod query;

pub use error::PageError;
pub use handle::{ElementHandle, PageHandle, ScrollTarget};
pub use query::{Query, QuerySpec};
