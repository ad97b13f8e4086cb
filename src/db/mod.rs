pub(crate) mod holding_queries;
pub(crate) mod user_queries;
