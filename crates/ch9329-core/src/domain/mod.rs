//! Domain values for the CH9329 protocol.
//!
//! Pure data and arithmetic: nothing in here knows about frames, serial ports,
//! or timing.

/// Reports, device info, parameter block, and USB string descriptors.
pub mod device;

/// Screen-to-device coordinate scaling.
pub mod coords;
