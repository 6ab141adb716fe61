//! Backend bridge: command queue types and the worker thread that performs network I/O.

pub mod commands;
pub mod runtime;
