use std::fmt;
use std::str::FromStr;

use crate::db::executor::SqlValue;
use crate::db::models::token_accounts::{
    TOKEN_ACCOUNT_ALIAS, TOKEN_ACCOUNT_TABLE, TOKEN_RELATIONSHIP_COLUMNS, TokenAccountColumn,
};
use crate::entity_id::EntityId;
use crate::error::{Result, TokenServiceError};

/// Parameter slots fixed by the base query: `$1` owner, `$2` limit.
const OWNER_PARAM_INDEX: usize = 1;
const LIMIT_PARAM_INDEX: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

impl FromStr for Operator {
    type Err = TokenServiceError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "=" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Gte),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Lte),
            other => Err(TokenServiceError::invalid_request(format!("unsupported operator '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for OrderDirection {
    type Err = TokenServiceError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(TokenServiceError::invalid_request(format!("unsupported order '{}'", other))),
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub key: TokenAccountColumn,
    pub operator: Operator,
    pub value: SqlValue,
}

impl Condition {
    pub fn new(key: TokenAccountColumn, operator: Operator, value: impl Into<SqlValue>) -> Self {
        Self { key, operator, value: value.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InCondition {
    pub key: TokenAccountColumn,
    pub values: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSpec {
    pub column: TokenAccountColumn,
    pub direction: OrderDirection,
}

impl Default for OrderSpec {
    fn default() -> Self {
        Self {
            column: TokenAccountColumn::TokenId,
            direction: OrderDirection::Asc,
        }
    }
}

/// Request for one page of an account's token relationships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRelationshipsQuery {
    pub owner_account_id: EntityId,
    pub conditions: Vec<Condition>,
    pub in_conditions: Vec<InCondition>,
    pub order: OrderSpec,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

fn base_query() -> String {
    let select_list = TOKEN_RELATIONSHIP_COLUMNS
        .iter()
        .map(TokenAccountColumn::full_name)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "select {}\nfrom {} {}\nwhere {} = ${}\nand {} = true",
        select_list,
        TOKEN_ACCOUNT_TABLE,
        TOKEN_ACCOUNT_ALIAS,
        TokenAccountColumn::AccountId.full_name(),
        OWNER_PARAM_INDEX,
        TokenAccountColumn::Associated.full_name(),
    )
}

impl TokenRelationshipsQuery {
    pub fn new(owner_account_id: EntityId, limit: i64) -> Self {
        Self {
            owner_account_id,
            conditions: Vec::new(),
            in_conditions: Vec::new(),
            order: OrderSpec::default(),
            limit,
        }
    }

    /// Assemble the sql text and positional parameters. Nothing is executed.
    pub fn build(&self) -> Result<BuiltQuery> {
        if self.limit <= 0 {
            return Err(TokenServiceError::invalid_request(format!(
                "limit must be positive, got {}",
                self.limit
            )));
        }
        if self.in_conditions.len() > 1 {
            return Err(TokenServiceError::invalid_request(format!(
                "at most one in-list condition is supported, got {}",
                self.in_conditions.len()
            )));
        }

        let mut params = vec![SqlValue::from(self.owner_account_id), SqlValue::Int(self.limit)];
        let mut clauses = vec![base_query()];

        for condition in &self.conditions {
            params.push(condition.value.clone());
            clauses.push(format!(
                "and {} {} ${}",
                condition.key.full_name(),
                condition.operator.as_sql(),
                params.len()
            ));
        }

        if let Some(in_condition) = self.in_conditions.first().filter(|c| !c.values.is_empty()) {
            let values = in_condition
                .values
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            clauses.push(format!("and {} in ({})", in_condition.key.full_name(), values));
        }

        clauses.push(format!(
            "order by {} {}",
            self.order.column.full_name(),
            self.order.direction.as_sql()
        ));
        clauses.push(format!("limit ${}", LIMIT_PARAM_INDEX));

        Ok(BuiltQuery {
            sql: clauses.join("\n"),
            params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn owner() -> EntityId {
        "0.0.100".parse().unwrap()
    }

    #[test]
    fn builds_base_query_without_filters() {
        let built = TokenRelationshipsQuery::new(owner(), 25).build().unwrap();

        assert_eq!(
            built.sql,
            "select ta.automatic_association, ta.balance, ta.created_timestamp, ta.freeze_status, ta.kyc_status, ta.token_id\n\
             from token_account ta\n\
             where ta.account_id = $1\n\
             and ta.associated = true\n\
             order by ta.token_id asc\n\
             limit $2"
        );
        assert_eq!(built.params, vec![SqlValue::Int(100), SqlValue::Int(25)]);
    }

    #[test]
    fn numbers_condition_params_after_fixed_slots() {
        let mut query = TokenRelationshipsQuery::new(owner(), 10);
        query.conditions = vec![
            Condition::new(TokenAccountColumn::Balance, Operator::Gt, 0i64),
            Condition::new(TokenAccountColumn::TokenId, Operator::Lte, 5000i64),
            Condition::new(TokenAccountColumn::AutomaticAssociation, Operator::Eq, true),
        ];

        let built = query.build().unwrap();

        assert!(built.sql.contains("and ta.balance > $3\n"));
        assert!(built.sql.contains("and ta.token_id <= $4\n"));
        assert!(built.sql.contains("and ta.automatic_association = $5\n"));
        assert_eq!(built.params.len(), 2 + query.conditions.len());
        assert_eq!(built.params[1], SqlValue::Int(10));
        assert_eq!(
            built.params[2..],
            [SqlValue::Int(0), SqlValue::Int(5000), SqlValue::Bool(true)]
        );
    }

    #[test]
    fn in_list_is_inlined_after_conditions() {
        let mut query = TokenRelationshipsQuery::new(owner(), 25);
        query.conditions = vec![Condition::new(TokenAccountColumn::Balance, Operator::Ne, 0i64)];
        query.in_conditions = vec![InCondition {
            key: TokenAccountColumn::TokenId,
            values: vec![10, 20],
        }];
        query.order.direction = OrderDirection::Desc;

        let built = query.build().unwrap();

        assert!(built.sql.ends_with(
            "and ta.balance != $3\nand ta.token_id in (10,20)\norder by ta.token_id desc\nlimit $2"
        ));
        assert_eq!(built.params.len(), 3);
    }

    #[test]
    fn empty_in_list_emits_no_clause() {
        let mut query = TokenRelationshipsQuery::new(owner(), 25);
        query.in_conditions = vec![InCondition {
            key: TokenAccountColumn::TokenId,
            values: vec![],
        }];

        let built = query.build().unwrap();

        assert!(!built.sql.contains(" in ("));
        assert_eq!(built, TokenRelationshipsQuery::new(owner(), 25).build().unwrap());
    }

    #[test]
    fn multiple_in_conditions_are_rejected() {
        let mut query = TokenRelationshipsQuery::new(owner(), 25);
        query.in_conditions = vec![
            InCondition { key: TokenAccountColumn::TokenId, values: vec![1] },
            InCondition { key: TokenAccountColumn::TokenId, values: vec![2] },
        ];

        let err = query.build().unwrap_err();
        assert!(matches!(err, TokenServiceError::InvalidRequest(_)));
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    #[case(i64::MIN)]
    fn non_positive_limit_is_rejected(#[case] limit: i64) {
        let err = TokenRelationshipsQuery::new(owner(), limit).build().unwrap_err();
        assert!(matches!(err, TokenServiceError::InvalidRequest(_)));
    }

    #[test]
    fn building_twice_is_deterministic() {
        let mut query = TokenRelationshipsQuery::new(owner(), 50);
        query.conditions = vec![
            Condition::new(TokenAccountColumn::CreatedTimestamp, Operator::Gte, 1_600_000_000i64),
            Condition::new(TokenAccountColumn::FreezeStatus, Operator::Eq, 1i64),
        ];
        query.in_conditions = vec![InCondition {
            key: TokenAccountColumn::TokenId,
            values: vec![3, 1, 2],
        }];

        assert_eq!(query.build().unwrap(), query.build().unwrap());
    }

    #[test]
    fn order_column_is_honored() {
        let mut query = TokenRelationshipsQuery::new(owner(), 5);
        query.order = OrderSpec {
            column: TokenAccountColumn::Balance,
            direction: OrderDirection::Desc,
        };

        let built = query.build().unwrap();
        assert!(built.sql.contains("order by ta.balance desc"));
    }

    #[rstest]
    #[case("=", Operator::Eq)]
    #[case("!=", Operator::Ne)]
    #[case(">", Operator::Gt)]
    #[case(">=", Operator::Gte)]
    #[case("<", Operator::Lt)]
    #[case("<=", Operator::Lte)]
    fn parses_supported_operators(#[case] text: &str, #[case] expected: Operator) {
        let operator: Operator = text.parse().unwrap();
        assert_eq!(operator, expected);
        assert_eq!(operator.as_sql(), text);
    }

    #[rstest]
    #[case("like")]
    #[case("==")]
    #[case("<>")]
    #[case("")]
    fn rejects_unsupported_operators(#[case] text: &str) {
        let err = text.parse::<Operator>().unwrap_err();
        assert!(matches!(err, TokenServiceError::InvalidRequest(_)));
    }
}
