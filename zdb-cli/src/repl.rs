use std::path::Path;
use std::time::Instant;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use zdb_sql::ast::Value;
use zdb_sql::{Parser, QueryResult, Vm};
use zdb_storage::Database;

fn print_value(value: &Value) -> String {
    match value {
        Value::Integer(n) => n.to_string(),
        Value::Text(s) => format!("{s:?}"),
    }
}

pub fn run_repl(db_path: &Path) -> Result<(), String> {
    println!("zdb REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type .help for instructions, .exit to quit.\n");

    let mut db = Database::open_default(db_path).map_err(|e| e.to_string())?;

    let mut rl = DefaultEditor::new().map_err(|e| e.to_string())?;
    let history_path = db_path.with_extension("repl_history");
    let _ = rl.load_history(&history_path);

    loop {
        let readline = rl.readline("zdb> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                let _ = rl.add_history_entry(line);

                if line.is_empty() {
                    continue;
                }

                if line.starts_with('.') {
                    match line {
                        ".exit" | ".quit" => {
                            let _ = rl.save_history(&history_path);
                            println!("Bye!");
                            break;
                        }
                        ".help" => {
                            println!("Commands:");
                            println!("  .exit, .quit  Exit the REPL");
                            println!("  .help         Show this help message");
                            println!("  <sql>         Execute INSERT INTO ... / SELECT ...");
                        }
                        _ => println!("Unknown command: {line}"),
                    }
                    continue;
                }

                let start = Instant::now();
                match Parser::parse(line) {
                    Ok(statement) => {
                        let mut vm = Vm::new(&mut db);
                        match vm.execute(statement) {
                            Ok(QueryResult::Inserted { key }) => {
                                println!("OK (key={key})");
                            }
                            Ok(QueryResult::Rows(rows)) => {
                                let mut count = 0;
                                for row in &rows {
                                    count += 1;
                                    let fields: Vec<String> = row.iter().map(print_value).collect();
                                    println!("[{}]", fields.join(", "));
                                }
                                let duration = start.elapsed();
                                println!("({count} rows, {:.4}s)", duration.as_secs_f64());
                            }
                            Err(e) => println!("Error executing statement: {e}"),
                        }
                    }
                    Err(e) => println!("Error parsing statement: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                let _ = rl.save_history(&history_path);
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }

    db.close().map_err(|e| e.to_string())
}
