//! Optional extensions around the ownership core.

pub mod trace;
