use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row as _, TypeInfo, ValueRef};
use tracing::{debug, instrument};

use crate::db::models::tokens::TokenDecimalsModel;
use crate::db::queries::tokens as tokens_queries;
use crate::entity_id::EntityId;
use crate::error::{Result, TokenServiceError};

/// Scalar used for bound query parameters and for decoded row cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
}

impl SqlValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<EntityId> for SqlValue {
    fn from(value: EntityId) -> Self {
        Self::Int(value.encoded())
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(value) => write!(f, "{}", value),
            Self::Int(value) => write!(f, "{}", value),
        }
    }
}

/// A result row keyed by column name.
pub type Row = HashMap<String, SqlValue>;

/// Runs an already built query and hands back its rows.
#[allow(async_fn_in_trait)]
pub trait RowExecutor {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>>;
}

/// Batched lookup of token decimals from the authoritative store.
#[allow(async_fn_in_trait)]
pub trait DecimalsStore {
    async fn fetch_decimals(&self, token_ids: &[EntityId]) -> Result<Vec<TokenDecimalsModel>>;
}

impl<T: RowExecutor + ?Sized> RowExecutor for Arc<T> {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        (**self).execute(sql, params).await
    }
}

impl<T: DecimalsStore + ?Sized> DecimalsStore for Arc<T> {
    async fn fetch_decimals(&self, token_ids: &[EntityId]) -> Result<Vec<TokenDecimalsModel>> {
        (**self).fetch_decimals(token_ids).await
    }
}

fn bind_param<'q>(
    query: Query<'q, Postgres, PgArguments>,
    param: &SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match param {
        SqlValue::Null => query.bind(None::<i64>),
        SqlValue::Bool(value) => query.bind(*value),
        SqlValue::Int(value) => query.bind(*value),
    }
}

fn decode_row(row: &PgRow) -> Result<Row> {
    let mut decoded = HashMap::with_capacity(row.len());
    for column in row.columns() {
        let index = column.ordinal();
        let name = column.name().to_string();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            match column.type_info().name() {
                "BOOL" => SqlValue::Bool(row.try_get::<bool, _>(index)?),
                "INT2" => SqlValue::Int(row.try_get::<i16, _>(index)? as i64),
                "INT4" => SqlValue::Int(row.try_get::<i32, _>(index)? as i64),
                "INT8" => SqlValue::Int(row.try_get::<i64, _>(index)?),
                _ => {
                    return Err(TokenServiceError::UnexpectedType {
                        column: name,
                        expected: "bool or integer",
                    });
                }
            }
        };
        decoded.insert(name, value);
    }
    Ok(decoded)
}

impl RowExecutor for PgPool {
    #[instrument(skip(self, params), fields(param_count = params.len()))]
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        let query = params
            .iter()
            .fold(sqlx::query(sql), |query, param| bind_param(query, param));

        let rows = query.fetch_all(self).await?;
        debug!(row_count = rows.len(), "Query executed");

        rows.iter().map(decode_row).collect()
    }
}

impl DecimalsStore for PgPool {
    async fn fetch_decimals(&self, token_ids: &[EntityId]) -> Result<Vec<TokenDecimalsModel>> {
        let encoded: Vec<i64> = token_ids.iter().map(EntityId::encoded).collect();
        Ok(tokens_queries::get_token_decimals(self, &encoded).await?)
    }
}
