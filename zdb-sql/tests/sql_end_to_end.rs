//! End-to-end coverage of the SQL surface: parse, execute against a real
//! `Database`, and check the rows the VM hands back.

use tempfile::tempdir;
use zdb_sql::ast::Value;
use zdb_sql::{Parser, QueryResult, Vm};
use zdb_storage::Database;

fn open_db() -> (tempfile::TempDir, Database) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.db");
    let db = Database::open_default(&path).unwrap();
    (dir, db)
}

#[test]
fn insert_then_select_with_where_on_primary_key() {
    let (_dir, mut db) = open_db();
    let mut vm = Vm::new(&mut db);

    let insert = Parser::parse("INSERT INTO t VALUES(1, 'a');").unwrap();
    assert_eq!(vm.execute(insert).unwrap(), QueryResult::Inserted { key: 1 });

    let select = Parser::parse("SELECT * FROM t WHERE col0 = 1;").unwrap();
    let result = vm.execute(select).unwrap();
    assert_eq!(
        result,
        QueryResult::Rows(vec![vec![Value::Integer(1), Value::Text("a".to_string())]])
    );
}

#[test]
fn select_with_and_or_predicate() {
    let (_dir, mut db) = open_db();
    let mut vm = Vm::new(&mut db);
    for (key, label) in [(1, "a"), (2, "b"), (3, "c")] {
        let sql = format!("INSERT INTO t VALUES({key}, '{label}');");
        vm.execute(Parser::parse(&sql).unwrap()).unwrap();
    }

    let select = Parser::parse("SELECT * FROM t WHERE col0 = 1 OR col0 = 3;").unwrap();
    let QueryResult::Rows(rows) = vm.execute(select).unwrap() else {
        panic!("expected rows");
    };
    let keys: Vec<i64> = rows
        .iter()
        .map(|row| match row[0] {
            Value::Integer(n) => n,
            _ => unreachable!(),
        })
        .collect();
    let mut keys = keys;
    keys.sort();
    assert_eq!(keys, vec![1, 3]);
}

#[test]
fn data_survives_reopen_through_the_sql_surface() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.db");

    {
        let mut db = Database::open_default(&path).unwrap();
        let mut vm = Vm::new(&mut db);
        vm.execute(Parser::parse("INSERT INTO t VALUES(7, 'persisted');").unwrap())
            .unwrap();
        db.close().unwrap();
    }

    let mut db = Database::open_default(&path).unwrap();
    let mut vm = Vm::new(&mut db);
    let QueryResult::Rows(rows) = vm.execute(Parser::parse("SELECT * FROM t").unwrap()).unwrap()
    else {
        panic!("expected rows");
    };
    assert_eq!(
        rows,
        vec![vec![Value::Integer(7), Value::Text("persisted".to_string())]]
    );
}

#[test]
fn parser_error_surfaces_without_touching_storage() {
    let err = Parser::parse("SELECT FROM WHERE").unwrap_err();
    assert!(matches!(err, zdb_sql::Error::UnexpectedToken { .. }));
}
