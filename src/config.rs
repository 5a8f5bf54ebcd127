//! Server Configuration
//! Mission: Resolve CLI flags and environment into one startup config

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "estate-server")]
#[command(about = "REST backend for the real-estate listing app")]
pub struct Args {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Secret used to sign and verify credentials
    #[arg(long, env = "ACCESS_TOKEN_SECRET", hide_env_values = true)]
    pub access_token_secret: Option<String>,

    /// Full MongoDB connection string (mongodb:// or mongodb+srv://)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// MongoDB user, combined with DB_PASS and DB_HOST when DATABASE_URL is unset
    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    #[arg(long, env = "DB_PASS", hide_env_values = true)]
    pub db_pass: Option<String>,

    /// MongoDB cluster host, e.g. cluster0.example.mongodb.net
    #[arg(long, env = "DB_HOST")]
    pub db_host: Option<String>,

    /// MongoDB database name
    #[arg(long, env = "DB_NAME", default_value = "realEstateDb")]
    pub db_name: String,

    /// SQLite file used when no MongoDB connection is configured
    #[arg(long, env = "DB_PATH", default_value = "real_estate.db")]
    pub db_path: String,
}

/// Where documents live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Sqlite { path: String },
    Mongo { uri: String, database: String },
}

impl StoreConfig {
    pub fn describe(&self) -> String {
        match self {
            StoreConfig::Sqlite { path } => format!("sqlite:{}", path),
            // never log the connection string, it carries credentials
            StoreConfig::Mongo { database, .. } => format!("mongodb database {}", database),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub token_secret: Option<String>,
    pub store: StoreConfig,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self> {
        let store = match (args.database_url, args.db_user, args.db_pass, args.db_host) {
            (Some(url), _, _, _) if url.starts_with("mongodb") => StoreConfig::Mongo {
                uri: url,
                database: args.db_name,
            },
            (Some(_), ..) => {
                anyhow::bail!("DATABASE_URL must be a mongodb:// or mongodb+srv:// connection string")
            }
            (None, Some(user), Some(pass), Some(host)) => StoreConfig::Mongo {
                uri: format!(
                    "mongodb+srv://{}:{}@{}/?retryWrites=true&w=majority",
                    user, pass, host
                ),
                database: args.db_name,
            },
            _ => StoreConfig::Sqlite { path: args.db_path },
        };

        Ok(Self {
            bind_addr: format!("{}:{}", args.host, args.port),
            token_secret: args.access_token_secret.filter(|s| !s.is_empty()),
            store,
        })
    }
}
