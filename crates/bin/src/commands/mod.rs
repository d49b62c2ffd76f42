pub mod accounts;
pub mod fingerprint;
pub mod settings;
