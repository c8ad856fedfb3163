pub mod check;
pub mod daemon;
pub mod diff;
pub mod receive;
pub mod release;
pub mod status;
