//! Small cross-cutting helpers shared by the registry, session, and
//! control-plane layers, grouped the way the teacher's `utils` module
//! collects them rather than scattering one-off functions per caller.

pub mod hashing;
pub mod time;
pub mod validation;
