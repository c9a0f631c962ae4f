#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JansouError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not seated at this table")]
    NotSeated,
    #[error("table is full")]
    TableFull,
}
