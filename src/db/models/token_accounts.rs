use serde::Serialize;

use crate::db::executor::{Row, SqlValue};
use crate::entity_id::EntityId;
use crate::error::{Result, TokenServiceError};

pub const TOKEN_ACCOUNT_TABLE: &str = "token_account";
pub const TOKEN_ACCOUNT_ALIAS: &str = "ta";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenAccountColumn {
    AccountId,
    Associated,
    AutomaticAssociation,
    Balance,
    CreatedTimestamp,
    FreezeStatus,
    KycStatus,
    TokenId,
}

impl TokenAccountColumn {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AccountId => "account_id",
            Self::Associated => "associated",
            Self::AutomaticAssociation => "automatic_association",
            Self::Balance => "balance",
            Self::CreatedTimestamp => "created_timestamp",
            Self::FreezeStatus => "freeze_status",
            Self::KycStatus => "kyc_status",
            Self::TokenId => "token_id",
        }
    }

    /// Column name qualified with the table alias, e.g. `ta.token_id`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", TOKEN_ACCOUNT_ALIAS, self.name())
    }
}

/// Columns selected for a relationship, in select-list order.
/// `TokenRelationship::from_row` reads exactly these.
pub const TOKEN_RELATIONSHIP_COLUMNS: [TokenAccountColumn; 6] = [
    TokenAccountColumn::AutomaticAssociation,
    TokenAccountColumn::Balance,
    TokenAccountColumn::CreatedTimestamp,
    TokenAccountColumn::FreezeStatus,
    TokenAccountColumn::KycStatus,
    TokenAccountColumn::TokenId,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FreezeStatus {
    NotApplicable,
    Frozen,
    Unfrozen,
}

impl FreezeStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::NotApplicable),
            1 => Some(Self::Frozen),
            2 => Some(Self::Unfrozen),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    NotApplicable,
    Granted,
    Revoked,
}

impl KycStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::NotApplicable),
            1 => Some(Self::Granted),
            2 => Some(Self::Revoked),
            _ => None,
        }
    }
}

/// An account's association with a token.
///
/// `decimals` is filled in after the row is decoded; `None` means the token was
/// not found in the token table, which is distinct from a token with 0 decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRelationship {
    pub token_id: EntityId,
    pub balance: i64,
    pub created_timestamp: i64,
    pub freeze_status: FreezeStatus,
    pub kyc_status: KycStatus,
    pub automatic_association: bool,
    pub decimals: Option<i64>,
}

fn cell<'a>(row: &'a Row, column: TokenAccountColumn) -> Result<&'a SqlValue> {
    row.get(column.name())
        .ok_or_else(|| TokenServiceError::MissingColumn(column.name().to_string()))
}

fn int_cell(row: &Row, column: TokenAccountColumn) -> Result<i64> {
    cell(row, column)?.as_int().ok_or_else(|| TokenServiceError::UnexpectedType {
        column: column.name().to_string(),
        expected: "integer",
    })
}

fn bool_cell(row: &Row, column: TokenAccountColumn) -> Result<bool> {
    cell(row, column)?.as_bool().ok_or_else(|| TokenServiceError::UnexpectedType {
        column: column.name().to_string(),
        expected: "bool",
    })
}

fn status_cell<T>(row: &Row, column: TokenAccountColumn, from_code: fn(i64) -> Option<T>) -> Result<T> {
    let code = int_cell(row, column)?;
    from_code(code).ok_or_else(|| TokenServiceError::InvalidStatus {
        column: column.name().to_string(),
        value: code,
    })
}

impl TokenRelationship {
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            token_id: EntityId::from_encoded(int_cell(row, TokenAccountColumn::TokenId)?),
            balance: int_cell(row, TokenAccountColumn::Balance)?,
            created_timestamp: int_cell(row, TokenAccountColumn::CreatedTimestamp)?,
            freeze_status: status_cell(row, TokenAccountColumn::FreezeStatus, FreezeStatus::from_code)?,
            kyc_status: status_cell(row, TokenAccountColumn::KycStatus, KycStatus::from_code)?,
            automatic_association: bool_cell(row, TokenAccountColumn::AutomaticAssociation)?,
            decimals: None,
        })
    }
}
