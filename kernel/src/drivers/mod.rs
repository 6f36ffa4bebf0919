//! Narrow external-driver stubs (§4.9/§11 boundary: register-level hardware
//! programming that the spec explicitly puts outside the kernel's
//! interesting behavior). Each module here owns exactly one piece of
//! hardware plumbing and exposes the smallest surface the rest of the
//! kernel needs; the behavior the spec actually wants tested (frequency
//! arbitration, scancode decoding) lives in `crate::terminal` and the
//! `on_tick`/`on_byte` entry points below, not in these stubs.

pub mod fdc;
pub mod mouse;
pub mod pic;
pub mod pit;
pub mod power;
pub mod rtc;
pub mod sb16;
