pub mod tcp;
pub mod transport;
