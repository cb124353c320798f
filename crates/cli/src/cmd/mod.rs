//! Command implementations

pub mod checkout;
pub mod info;
pub mod status;
