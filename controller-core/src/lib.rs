#![no_std]

// Shared control logic for the three-colour traffic-light rig.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library and exposing abstractions the other crates can adopt.

pub mod clock;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod lamps;
pub mod modes;
pub mod protocol;
pub mod sequence;
pub mod telemetry;
