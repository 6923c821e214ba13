//! `csbind` command line front end: configuration, model loading and
//! writing the generated files. The generation itself lives in
//! [`csbind_gen`].

pub mod cli;
pub mod config;
pub mod driver;
pub mod version;
