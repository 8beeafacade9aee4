//! Low-level primitives shared by the storage engine.

/// Logical clocks used to timestamp mutations.
///
/// Writers ask the injected clock for a timestamp whenever the caller does not
/// supply one; the engine only relies on it never going backwards.
pub mod clock;
