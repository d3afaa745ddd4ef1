//! JSON configuration and report files used by the command-line tools.

pub mod demo;
pub mod io;
