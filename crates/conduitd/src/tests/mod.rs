//! Test suites for the command server.

mod process_behaviour;
mod support;
mod unit;
