use clap::Parser;
use dotenvy::dotenv;
use eyre::Result;
use std::sync::Arc;
use tracing::{error, info};

use token_relationships::config;
use token_relationships::db::connection;
use token_relationships::logging;
use token_relationships::{
    Condition, EntityId, InCondition, Operator, OrderDirection, OrderSpec, TokenAccountColumn,
    TokenDecimalsCache, TokenRelationshipsQuery, TokenService,
};

/// Look up an account's token relationships together with token decimals
#[derive(Debug, Parser)]
#[command(name = "token_relationships")]
struct Args {
    /// Owner account, e.g. 0.0.100
    #[arg(long)]
    account: EntityId,

    /// Restrict results to these tokens (repeatable)
    #[arg(long = "token-id")]
    token_ids: Vec<EntityId>,

    /// Sort order on token id
    #[arg(long, default_value = "asc")]
    order: OrderDirection,

    /// Page size, defaults to and is capped by the configured response limits
    #[arg(long)]
    limit: Option<i64>,

    /// Only return relationships with a balance greater than this
    #[arg(long)]
    balance_gt: Option<i64>,
}

impl Args {
    fn to_query(&self, limit: i64) -> TokenRelationshipsQuery {
        let mut query = TokenRelationshipsQuery::new(self.account, limit);
        query.order = OrderSpec {
            column: TokenAccountColumn::TokenId,
            direction: self.order,
        };
        if let Some(balance) = self.balance_gt {
            query.conditions.push(Condition::new(TokenAccountColumn::Balance, Operator::Gt, balance));
        }
        if !self.token_ids.is_empty() {
            query.in_conditions.push(InCondition {
                key: TokenAccountColumn::TokenId,
                values: self.token_ids.iter().map(EntityId::encoded).collect(),
            });
        }
        query
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME").to_string()) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    let cfg = config::Config::load()?;
    info!(cache_max_size = cfg.token_cache_max_size.get(), "Configuration loaded and logging initialized");

    // Initialize database connection pool
    let pool = connection::create_pool(&cfg).await?;
    info!("Database connection pool created");

    let decimals_cache = Arc::new(TokenDecimalsCache::new(cfg.token_cache_max_size));
    let service = TokenService::new(pool, decimals_cache);

    let query = args.to_query(cfg.effective_limit(args.limit));
    let relationships = match service.get_tokens(&query).await {
        Ok(relationships) => relationships,
        Err(e) => {
            error!(error = ?e, account = %args.account, "Failed to load token relationships");
            return Err(e.into());
        }
    };
    info!(account = %args.account, count = relationships.len(), "Loaded token relationships");

    println!("{}", serde_json::to_string_pretty(&relationships)?);
    Ok(())
}
