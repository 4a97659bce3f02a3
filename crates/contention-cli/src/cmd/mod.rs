pub mod deadlock;
pub mod fingerprint;
pub mod safety;
