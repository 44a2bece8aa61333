//! schema-service CLI - MySQL schema mapping and DDL synthesis.

use clap::{Parser, Subcommand};
use schema_service::typemap::{self, referential::action_to_sql};
use schema_service::{
    render_create_table, AddColumnRequest, AddForeignKeyRequest, Config, Conventions,
    CreateTableRequest, DdlSynthesizer, MysqlCatalog, SchemaCatalog, SchemaError, SchemaService,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "schema-service")]
#[command(about = "MySQL schema mapping and DDL synthesis")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a table from a request file (YAML or JSON)
    CreateTable {
        /// Path to the CreateTable request
        request: PathBuf,
    },

    /// Drop a table
    DropTable {
        table: String,
    },

    /// Add a column from a request file (YAML or JSON)
    AddColumn {
        /// Path to the AddColumn request
        request: PathBuf,
    },

    /// Drop a column
    DropColumn {
        table: String,
        column: String,
    },

    /// Add a foreign key column from a request file (YAML or JSON)
    AddForeignKey {
        /// Path to the AddForeignKey request
        request: PathBuf,
    },

    /// Drop a foreign key constraint together with its column
    DropForeignKey {
        table: String,
        column: String,
    },

    /// List tables in the configured database
    ListTables,

    /// List the columns and foreign keys of a table
    ListColumns {
        table: String,
    },

    /// Render a CREATE TABLE statement without connecting to the database
    ///
    /// Only the `conventions` section of the config file is read; the
    /// `database` section may be omitted.
    RenderCreateTable {
        /// Path to the CreateTable request
        request: PathBuf,
    },

    /// Test the database connection
    HealthCheck,
}

/// Outcome of a connectivity check.
#[derive(Debug, Serialize)]
struct HealthCheckResult {
    healthy: bool,
    db_type: String,
    latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), SchemaError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(SchemaError::Config)?;

    // Offline rendering reads only the conventions section
    if let Commands::RenderCreateTable { request } = &cli.command {
        let conventions = Conventions::load(&cli.config)?;
        info!("Loaded conventions from {:?}", cli.config);
        let request: CreateTableRequest = load_request(request)?;
        let synthesizer = DdlSynthesizer::new(conventions)?;
        let sql = render_create_table(&synthesizer, &request)?;
        return print_output(cli.output_json, &sql, || println!("{}", sql));
    }

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    if let Commands::HealthCheck = cli.command {
        return health_check(&config, cli.output_json).await;
    }

    let service = SchemaService::connect(&config).await?;
    let result = dispatch(&service, cli.command, cli.output_json).await;
    service.close().await;
    result
}

async fn dispatch(
    service: &SchemaService,
    command: Commands,
    output_json: bool,
) -> Result<(), SchemaError> {
    match command {
        Commands::RenderCreateTable { .. } | Commands::HealthCheck => unreachable!(), // Handled above

        Commands::CreateTable { request } => {
            let request: CreateTableRequest = load_request(&request)?;
            let sql = service.create_table(&request).await?;
            print_output(output_json, &sql, || {
                println!("Table {} created", request.table_name);
                println!("\n{}", sql);
            })
        }

        Commands::DropTable { table } => {
            let message = service.drop_table(&table).await?;
            print_message(output_json, &message)
        }

        Commands::AddColumn { request } => {
            let request: AddColumnRequest = load_request(&request)?;
            let message = service.add_column(&request).await?;
            print_message(output_json, &message)
        }

        Commands::DropColumn { table, column } => {
            let message = service.drop_column(&table, &column).await?;
            print_message(output_json, &message)
        }

        Commands::AddForeignKey { request } => {
            let request: AddForeignKeyRequest = load_request(&request)?;
            let message = service.add_foreign_key(&request).await?;
            print_message(output_json, &message)
        }

        Commands::DropForeignKey { table, column } => {
            let message = service.drop_foreign_key(&table, &column).await?;
            print_message(output_json, &message)
        }

        Commands::ListTables => {
            let tables = service.list_tables().await?;
            print_output(output_json, &tables, || {
                println!("Tables ({}):", tables.len());
                for table in &tables {
                    println!(
                        "  {} (rows: {}, size: {} bytes){}",
                        table.table_name,
                        table.row_count,
                        table.size_bytes,
                        table
                            .comment
                            .as_deref()
                            .map(|c| format!(" - {}", c))
                            .unwrap_or_default()
                    );
                }
            })
        }

        Commands::ListColumns { table } => {
            let listing = service.list_columns(&table).await?;
            print_output(output_json, &listing, || {
                println!("Columns of {}:", table);
                for column in &listing.columns {
                    let sql_type = typemap::to_sql(column).unwrap_or_else(|_| "?".to_string());
                    println!(
                        "  {} {}{}{}{}",
                        column.name,
                        sql_type,
                        if column.nullable { "" } else { " NOT NULL" },
                        if column.unique { " UNIQUE" } else { "" },
                        if column.primary_key { " PRIMARY KEY" } else { "" }
                    );
                }
                if !listing.foreign_keys.is_empty() {
                    println!("\nForeign keys:");
                    for fk in &listing.foreign_keys {
                        println!(
                            "  {} -> {}({}) ON UPDATE {} ON DELETE {}",
                            fk.column_name,
                            fk.reference_table_name,
                            fk.reference_column_name,
                            action_to_sql(fk.on_update),
                            action_to_sql(fk.on_delete)
                        );
                    }
                }
            })
        }
    }
}

async fn health_check(config: &Config, output_json: bool) -> Result<(), SchemaError> {
    let start = Instant::now();
    let connected = MysqlCatalog::new(&config.database).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let result = match &connected {
        Ok(catalog) => HealthCheckResult {
            healthy: true,
            db_type: catalog.db_type().to_string(),
            latency_ms,
            error: None,
        },
        Err(e) => HealthCheckResult {
            healthy: false,
            db_type: "mysql".to_string(),
            latency_ms,
            error: Some(e.to_string()),
        },
    };

    if output_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Health Check Results:");
        println!(
            "  Database (MySQL {}:{}/{}): {} ({}ms)",
            config.database.host,
            config.database.port,
            config.database.database,
            if result.healthy { "OK" } else { "FAILED" },
            result.latency_ms
        );
        if let Some(ref err) = result.error {
            println!("    Error: {}", err);
        }
    }

    match connected {
        Ok(catalog) => {
            catalog.close().await;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Read a request file, choosing the format by extension (`.json` or YAML).
fn load_request<T: DeserializeOwned>(path: &Path) -> Result<T, SchemaError> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_yaml::from_str(&content)?)
    }
}

fn print_output<T: Serialize + ?Sized>(
    output_json: bool,
    value: &T,
    text: impl FnOnce(),
) -> Result<(), SchemaError> {
    if output_json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text();
    }
    Ok(())
}

fn print_message(output_json: bool, message: &str) -> Result<(), SchemaError> {
    if output_json {
        println!("{}", serde_json::json!({ "message": message }));
    } else {
        println!("{}", message);
    }
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout is reserved for command output
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
