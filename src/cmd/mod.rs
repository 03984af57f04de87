pub(crate) mod check;
pub(crate) mod export_schema;
