//! Command line front end for HL7 message transforms.

pub mod cli;
pub mod commands;
pub mod logging;
