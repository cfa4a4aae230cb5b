//! Server configuration.
//!
//! Every setting can be given as a command-line flag or through its
//! environment variable:
//!
//! | Flag                 | Variable                 | Default        |
//! |----------------------|--------------------------|----------------|
//! | `--host`             | `ADMIN_HOST`             | `127.0.0.1`    |
//! | `--port`             | `ADMIN_PORT`             | `5001`         |
//! | `--database-path`    | `ADMIN_DB_PATH`          | `admin.sqlite` |
//! | `--max-upload-bytes` | `ADMIN_MAX_UPLOAD_BYTES` | 10 MiB         |

use clap::Parser;
use std::path::PathBuf;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5001;
const DEFAULT_DATABASE: &str = "admin.sqlite";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Parser, Debug, Clone)]
#[command(name = "backend")]
#[command(about = "Table admin server with CSV import, preview and export")]
#[command(version)]
pub struct AppConfig {
    /// Address to bind
    #[arg(long, env = "ADMIN_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "ADMIN_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite database file
    #[arg(long, env = "ADMIN_DB_PATH", default_value = DEFAULT_DATABASE)]
    pub database_path: PathBuf,

    /// Largest CSV upload accepted by the import and preview endpoints
    #[arg(long, env = "ADMIN_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_path: PathBuf::from(DEFAULT_DATABASE),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
