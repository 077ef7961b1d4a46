use zero_ast::AstError;
use zero_engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum AdhocError {
    /// Any name other than the reserved `_zero_adhoc` is rejected (§6
    /// "Adhoc-query entrypoint").
    #[error("adhoc queries must use the reserved name {expected:?}, got {actual:?}")]
    ReservedNameViolation { expected: &'static str, actual: String },
    #[error("adhoc query failed AST validation: {0}")]
    Invalid(AstError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}
