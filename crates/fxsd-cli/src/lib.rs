//! Library side of the `fxsd` command-line tool.

pub mod demo;
pub mod dump;
pub mod logging;
