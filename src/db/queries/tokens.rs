use sqlx::{Error, PgPool};

use crate::db::models::tokens::TokenDecimalsModel;

/// Fetch decimals for all given encoded token ids in one round trip.
/// Ids with no row in the token table are simply absent from the result.
pub async fn get_token_decimals(pool: &PgPool, token_ids: &[i64]) -> Result<Vec<TokenDecimalsModel>, Error> {
    sqlx::query_as::<_, TokenDecimalsModel>(
        r#"
        SELECT token_id, decimals
        FROM token
        WHERE token_id = ANY($1)
        "#,
    )
    .bind(token_ids)
    .fetch_all(pool)
    .await
}
