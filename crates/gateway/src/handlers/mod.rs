//! API handlers module

pub mod health;
pub mod networks;
pub mod researchers;
