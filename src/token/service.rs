use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::db::executor::{DecimalsStore, RowExecutor};
use crate::db::models::token_accounts::TokenRelationship;
use crate::db::queries::token_relationships::TokenRelationshipsQuery;
use crate::error::Result;
use crate::token::cache::TokenDecimalsCache;

/// Resolves an account's token relationships and annotates them with decimals.
#[derive(Debug, Clone)]
pub struct TokenService<B> {
    backend: B,
    decimals_cache: Arc<TokenDecimalsCache>,
}

impl<B> TokenService<B>
where
    B: RowExecutor + DecimalsStore,
{
    pub fn new(backend: B, decimals_cache: Arc<TokenDecimalsCache>) -> Self {
        Self { backend, decimals_cache }
    }

    pub fn decimals_cache(&self) -> &TokenDecimalsCache {
        &self.decimals_cache
    }

    /// Fetch one page of relationships in the order the query returns them.
    /// Any query, decoding or decimals lookup failure fails the whole call.
    #[instrument(
        skip(self, query),
        fields(owner = %query.owner_account_id, limit = query.limit, on_close = true)
    )]
    pub async fn get_tokens(&self, query: &TokenRelationshipsQuery) -> Result<Vec<TokenRelationship>> {
        let built = query.build()?;
        let rows = self.backend.execute(&built.sql, &built.params).await?;

        let mut token_ids = HashSet::with_capacity(rows.len());
        let mut relationships = rows
            .iter()
            .map(|row| {
                let relationship = TokenRelationship::from_row(row)?;
                token_ids.insert(relationship.token_id);
                Ok(relationship)
            })
            .collect::<Result<Vec<_>>>()?;

        if relationships.is_empty() {
            return Ok(relationships);
        }

        let decimals = self
            .decimals_cache
            .resolve_batch(&self.backend, &token_ids)
            .await?;

        for relationship in &mut relationships {
            relationship.decimals = decimals.get(&relationship.token_id).copied();
        }

        debug!(
            count = relationships.len(),
            distinct_tokens = token_ids.len(),
            unresolved = relationships.iter().filter(|r| r.decimals.is_none()).count(),
            "Token relationships resolved"
        );
        Ok(relationships)
    }
}
