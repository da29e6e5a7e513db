//! Execution engine: runs a parsed `Statement` against an open
//! `Database`. There is no catalog — `table` names are accepted but not
//! validated, since the engine has exactly one implicit keyspace.

use tracing::debug;
use zdb_storage::Database;

use crate::ast::{BinaryOp, Expr, Statement, Value};
use crate::codec;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Inserted { key: i64 },
    Rows(Vec<Vec<Value>>),
}

pub struct Vm<'a> {
    db: &'a mut Database,
}

impl<'a> Vm<'a> {
    pub fn new(db: &'a mut Database) -> Self {
        Vm { db }
    }

    pub fn execute(&mut self, statement: Statement) -> Result<QueryResult> {
        match statement {
            Statement::Insert { table, values } => self.execute_insert(&table, values),
            Statement::Select { table, where_clause } => self.execute_select(&table, where_clause),
        }
    }

    fn execute_insert(&mut self, table: &str, values: Vec<Value>) -> Result<QueryResult> {
        let key = values
            .iter()
            .find_map(|v| match v {
                Value::Integer(n) => Some(*n),
                Value::Text(_) => None,
            })
            .ok_or(Error::ColumnNotFound { index: 0 })?;
        debug!(table, key, "insert");
        let payload = codec::encode(&values);
        self.db.set(key as u64, &payload)?;
        Ok(QueryResult::Inserted { key })
    }

    fn execute_select(&mut self, table: &str, where_clause: Option<Expr>) -> Result<QueryResult> {
        debug!(table, has_where = where_clause.is_some(), "select");
        let mut rows = Vec::new();
        let mut eval_error = None;
        self.db.for_each(|_key, bytes| {
            if eval_error.is_some() {
                return;
            }
            let row = match codec::decode(bytes) {
                Ok(row) => row,
                Err(e) => {
                    eval_error = Some(e);
                    return;
                }
            };
            let matches = match &where_clause {
                None => Ok(true),
                Some(expr) => eval_predicate(expr, &row),
            };
            match matches {
                Ok(true) => rows.push(row),
                Ok(false) => {}
                Err(e) => eval_error = Some(e),
            }
        })?;
        if let Some(e) = eval_error {
            return Err(e);
        }
        Ok(QueryResult::Rows(rows))
    }
}

fn eval_predicate(expr: &Expr, row: &[Value]) -> Result<bool> {
    Ok(match eval_expr(expr, row)? {
        Value::Integer(n) => n != 0,
        Value::Text(s) => !s.is_empty(),
    })
}

fn eval_expr(expr: &Expr, row: &[Value]) -> Result<Value> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Column(name) => {
            let index = column_index(name)?;
            row.get(index).cloned().ok_or(Error::ColumnNotFound { index })
        }
        Expr::Binary { left, op, right } => eval_binary(left, *op, right, row),
    }
}

fn eval_binary(left: &Expr, op: BinaryOp, right: &Expr, row: &[Value]) -> Result<Value> {
    match op {
        BinaryOp::And => {
            let result = eval_predicate(left, row)? && eval_predicate(right, row)?;
            return Ok(Value::Integer(result as i64));
        }
        BinaryOp::Or => {
            let result = eval_predicate(left, row)? || eval_predicate(right, row)?;
            return Ok(Value::Integer(result as i64));
        }
        _ => {}
    }

    let lhs = eval_expr(left, row)?;
    let rhs = eval_expr(right, row)?;
    let ordering = compare(&lhs, &rhs);
    let result = match op {
        BinaryOp::Eq => ordering == Some(std::cmp::Ordering::Equal),
        BinaryOp::NotEq => ordering != Some(std::cmp::Ordering::Equal),
        BinaryOp::Lt => ordering == Some(std::cmp::Ordering::Less),
        BinaryOp::Le => matches!(ordering, Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)),
        BinaryOp::Gt => ordering == Some(std::cmp::Ordering::Greater),
        BinaryOp::Ge => matches!(ordering, Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)),
        BinaryOp::And | BinaryOp::Or => unreachable!(),
    };
    Ok(Value::Integer(result as i64))
}

fn compare(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn column_index(name: &str) -> Result<usize> {
    name.strip_prefix("col")
        .and_then(|suffix| suffix.parse::<usize>().ok())
        .ok_or(Error::ColumnNotFound { index: 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn open_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.db");
        let db = Database::open_default(&path).unwrap();
        (dir, db)
    }

    #[test]
    fn insert_then_select_round_trips() {
        let (_dir, mut db) = open_db();
        let mut vm = Vm::new(&mut db);
        let insert = Parser::parse("INSERT INTO t VALUES(1, 'a');").unwrap();
        vm.execute(insert).unwrap();

        let select = Parser::parse("SELECT * FROM t WHERE col0 = 1;").unwrap();
        let result = vm.execute(select).unwrap();
        assert_eq!(
            result,
            QueryResult::Rows(vec![vec![Value::Integer(1), Value::Text("a".to_string())]])
        );
    }

    #[test]
    fn select_without_where_returns_all_rows() {
        let (_dir, mut db) = open_db();
        let mut vm = Vm::new(&mut db);
        vm.execute(Parser::parse("INSERT INTO t VALUES(1, 'a');").unwrap()).unwrap();
        vm.execute(Parser::parse("INSERT INTO t VALUES(2, 'b');").unwrap()).unwrap();

        let result = vm.execute(Parser::parse("SELECT * FROM t").unwrap()).unwrap();
        match result {
            QueryResult::Rows(rows) => assert_eq!(rows.len(), 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn insert_without_integer_column_is_column_not_found() {
        let (_dir, mut db) = open_db();
        let mut vm = Vm::new(&mut db);
        let insert = Parser::parse("INSERT INTO t VALUES('a');").unwrap();
        assert!(matches!(vm.execute(insert), Err(Error::ColumnNotFound { .. })));
    }

    #[test]
    fn where_on_out_of_range_column_is_column_not_found() {
        let (_dir, mut db) = open_db();
        let mut vm = Vm::new(&mut db);
        vm.execute(Parser::parse("INSERT INTO t VALUES(1);").unwrap()).unwrap();
        let select = Parser::parse("SELECT * FROM t WHERE col5 = 1;").unwrap();
        assert!(matches!(vm.execute(select), Err(Error::ColumnNotFound { .. })));
    }
}
