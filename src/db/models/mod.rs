pub mod tokens;
pub mod token_accounts;
