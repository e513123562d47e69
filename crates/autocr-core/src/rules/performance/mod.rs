//! Hot-path performance rules.

pub mod catastrophic_regex;
pub mod deep_clone_in_loop;
pub mod n2_array_lookup;
