//! City Traffic Simulation Library
//!
//! A headless traffic simulation of a grid city: lane-level routing,
//! signalised junctions and sensor-driven cars.

pub mod simulation;
