//! Fetch policy module
//!
//! Every URL the crawler requests, whether a location index page or a
//! listing link discovered on one, is checked here first.

mod gate;

pub use gate::PolicyGate;
