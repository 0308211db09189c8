use sqlx::FromRow;

/// Row of the batched decimals lookup against the `token` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TokenDecimalsModel {
    pub token_id: i64,
    pub decimals: i64,
}
