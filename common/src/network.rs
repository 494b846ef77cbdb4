pub mod definition;
pub mod lease;
pub mod range;
pub mod record;
