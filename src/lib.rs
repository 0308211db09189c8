pub mod config;
pub mod db;
pub mod entity_id;
pub mod error;
pub mod logging;
pub mod token;

pub use db::executor::{DecimalsStore, Row, RowExecutor, SqlValue};
pub use db::models::token_accounts::{FreezeStatus, KycStatus, TokenAccountColumn, TokenRelationship};
pub use db::queries::token_relationships::{
    BuiltQuery, Condition, InCondition, Operator, OrderDirection, OrderSpec, TokenRelationshipsQuery,
};
pub use entity_id::EntityId;
pub use error::TokenServiceError;
pub use token::{TokenDecimalsCache, TokenService};
