pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod settings;
pub(crate) mod units;
