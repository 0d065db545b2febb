//! Cross-cutting behaviors implemented as command interceptors.

mod root_elements;

pub use root_elements::{ROOT_ELEMENT_KEY, RootElementsBehavior};
