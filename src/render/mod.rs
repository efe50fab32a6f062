pub(crate) mod composite;
pub(crate) mod engine;
pub(crate) mod text;
