//! Reliable byte-stream core of a TCP-like transport.
//!
//! Sender and receiver halves are plain state machines: the caller feeds them segments,
//! acknowledgments and clock ticks, and collects whatever segments they emit.

pub mod tcp;
