pub mod check;
pub mod gateway;
