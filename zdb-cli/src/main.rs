mod repl;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use zdb_sql::ast::Value;
use zdb_sql::{QueryResult, Vm};
use zdb_storage::Database;

#[derive(Parser)]
#[command(name = "zdb", version, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive SQL session against a database file.
    Repl(ReplArgs),
    /// Run a single statement and exit.
    Query(QueryArgs),
}

#[derive(Parser)]
struct ReplArgs {
    /// Path to the database file (a sibling WAL is created alongside it).
    #[arg(long)]
    db: PathBuf,
}

#[derive(Parser)]
struct QueryArgs {
    #[arg(long)]
    db: PathBuf,

    /// SQL statement to execute.
    #[arg(long)]
    sql: String,
}

fn run_query(args: QueryArgs) -> Result<(), String> {
    let mut db = Database::open_default(&args.db).map_err(|e| e.to_string())?;
    let statement = zdb_sql::Parser::parse(&args.sql).map_err(|e| e.to_string())?;
    let result = {
        let mut vm = Vm::new(&mut db);
        vm.execute(statement).map_err(|e| e.to_string())?
    };
    match result {
        QueryResult::Inserted { key } => println!("OK (key={key})"),
        QueryResult::Rows(rows) => {
            for row in &rows {
                let fields: Vec<String> = row
                    .iter()
                    .map(|v| match v {
                        Value::Integer(n) => n.to_string(),
                        Value::Text(s) => format!("{s:?}"),
                    })
                    .collect();
                println!("[{}]", fields.join(", "));
            }
        }
    }
    db.close().map_err(|e| e.to_string())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Repl(args) => repl::run_repl(&args.db),
        Commands::Query(args) => run_query(args),
    };

    if let Err(message) = result {
        eprintln!("{message}");
        std::process::exit(1);
    }
}
