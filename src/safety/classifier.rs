//! SQL parsing and classification logic.
//!
//! Uses sqlparser-rs with the SQLite dialect to parse SQL and classify
//! statements by how much they can change the database.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

use super::{Classification, SafetyLevel, StatementType};

/// SQL classifier that parses and classifies SQL text.
#[derive(Debug, Default)]
pub struct SqlClassifier {
    dialect: SQLiteDialect,
}

impl SqlClassifier {
    /// Creates a new SQL classifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies a SQL string.
    ///
    /// Text that cannot be parsed, and empty text, is classified as
    /// destructive.
    pub fn classify(&self, sql: &str) -> Classification {
        let statements = match Parser::parse_sql(&self.dialect, sql) {
            Ok(statements) => statements,
            Err(e) => return Classification::unparseable(e.to_string()),
        };

        match statements.as_slice() {
            [] => Classification::unparseable("empty SQL statement"),
            [statement] => {
                let (level, statement_type) = classify_statement(statement);
                Classification::new(level, statement_type)
            }
            _ => {
                // Multiple statements: the most dangerous one decides
                let (level, statement_type) = statements
                    .iter()
                    .map(classify_statement)
                    .reduce(most_dangerous)
                    .unwrap_or((SafetyLevel::Destructive, StatementType::Unknown));
                Classification::new(level, StatementType::Multiple(Box::new(statement_type)))
            }
        }
    }
}

/// Convenience function to classify SQL without creating a classifier instance.
pub fn classify_sql(sql: &str) -> Classification {
    SqlClassifier::new().classify(sql)
}

/// Keeps the more dangerous of two classifications; the first wins ties.
fn most_dangerous(
    current: (SafetyLevel, StatementType),
    candidate: (SafetyLevel, StatementType),
) -> (SafetyLevel, StatementType) {
    if candidate.0 > current.0 {
        candidate
    } else {
        current
    }
}

/// Classifies a single parsed statement.
fn classify_statement(statement: &Statement) -> (SafetyLevel, StatementType) {
    match statement {
        Statement::Query(query) => classify_query(query),
        // SQLite's EXPLAIN only describes the program, it never runs it
        Statement::Explain { .. } | Statement::ExplainTable { .. } => {
            (SafetyLevel::ReadOnly, StatementType::Explain)
        }

        Statement::Insert(_) => (SafetyLevel::Mutating, StatementType::Insert),
        Statement::Update { .. } => (SafetyLevel::Mutating, StatementType::Update),
        Statement::Pragma { .. } => (SafetyLevel::Mutating, StatementType::Pragma),

        Statement::Delete(_) => (SafetyLevel::Destructive, StatementType::Delete),
        Statement::Drop { .. } => (SafetyLevel::Destructive, StatementType::Drop),
        Statement::AlterTable { .. } => (SafetyLevel::Destructive, StatementType::Alter),
        Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. }
        | Statement::CreateVirtualTable { .. } => (SafetyLevel::Destructive, StatementType::Create),

        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

/// Classifies a Query, looking into CTEs for data-modifying bodies.
fn classify_query(query: &Query) -> (SafetyLevel, StatementType) {
    let ctes = query
        .with
        .iter()
        .flat_map(|with| with.cte_tables.iter())
        .map(|cte| classify_query(&cte.query));

    let has_ctes = query.with.is_some();
    let (level, statement_type) = ctes
        .chain(std::iter::once(classify_set_expr(&query.body)))
        .fold((SafetyLevel::ReadOnly, StatementType::Select), most_dangerous);

    if has_ctes && level == SafetyLevel::ReadOnly {
        (level, StatementType::With)
    } else {
        (level, statement_type)
    }
}

/// Classifies a SetExpr, recursing into nested queries.
fn classify_set_expr(set_expr: &SetExpr) -> (SafetyLevel, StatementType) {
    match set_expr {
        SetExpr::Delete(stmt)
        | SetExpr::Update(stmt)
        | SetExpr::Insert(stmt)
        | SetExpr::Merge(stmt) => classify_statement(stmt),
        SetExpr::Query(query) => classify_query(query),
        SetExpr::Select(select) => classify_select(select),
        SetExpr::SetOperation { left, right, .. } => {
            most_dangerous(classify_set_expr(left), classify_set_expr(right))
        }
        SetExpr::Values(_) | SetExpr::Table(_) => (SafetyLevel::ReadOnly, StatementType::Select),
    }
}

/// Classifies a Select by checking its FROM clause for derived tables.
fn classify_select(select: &Select) -> (SafetyLevel, StatementType) {
    select
        .from
        .iter()
        .map(classify_table_with_joins)
        .fold((SafetyLevel::ReadOnly, StatementType::Select), most_dangerous)
}

fn classify_table_with_joins(twj: &TableWithJoins) -> (SafetyLevel, StatementType) {
    std::iter::once(&twj.relation)
        .chain(twj.joins.iter().map(|join| &join.relation))
        .map(classify_table_factor)
        .fold((SafetyLevel::ReadOnly, StatementType::Select), most_dangerous)
}

fn classify_table_factor(factor: &TableFactor) -> (SafetyLevel, StatementType) {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        _ => (SafetyLevel::ReadOnly, StatementType::Select),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_classification(sql: &str, expected_level: SafetyLevel, expected_type: StatementType) {
        let result = classify_sql(sql);
        assert_eq!(
            result.level, expected_level,
            "SQL: '{}' - expected level {:?}, got {:?}",
            sql, expected_level, result.level
        );
        assert_eq!(
            result.statement_type, expected_type,
            "SQL: '{}' - expected type {:?}, got {:?}",
            sql, expected_type, result.statement_type
        );
    }

    #[test]
    fn test_exercise_queries_are_read_only() {
        assert_classification(
            "SELECT name, salary FROM employees WHERE department = 'IT' ORDER BY salary DESC;",
            SafetyLevel::ReadOnly,
            StatementType::Select,
        );
        assert_classification(
            "SELECT e.name AS employee_name, d.name AS department_name, d.budget \
             FROM employees e JOIN departments d ON e.department = d.name",
            SafetyLevel::ReadOnly,
            StatementType::Select,
        );
        assert_classification(
            "SELECT name, salary FROM employees WHERE salary > (SELECT AVG(salary) FROM employees)",
            SafetyLevel::ReadOnly,
            StatementType::Select,
        );
        assert_classification(
            "SELECT name, RANK() OVER (PARTITION BY department ORDER BY salary DESC) AS salary_rank FROM employees",
            SafetyLevel::ReadOnly,
            StatementType::Select,
        );
    }

    #[test]
    fn test_derived_table_and_union_are_read_only() {
        assert_classification(
            "SELECT * FROM (SELECT id FROM books) b UNION SELECT id FROM members",
            SafetyLevel::ReadOnly,
            StatementType::Select,
        );
    }

    #[test]
    fn test_cte_select_is_read_only() {
        assert_classification(
            "WITH it AS (SELECT * FROM employees WHERE department = 'IT') SELECT * FROM it",
            SafetyLevel::ReadOnly,
            StatementType::With,
        );
    }

    #[test]
    fn test_explain_is_read_only() {
        assert_classification(
            "EXPLAIN QUERY PLAN SELECT * FROM employees",
            SafetyLevel::ReadOnly,
            StatementType::Explain,
        );
    }

    #[test]
    fn test_insert_and_update_are_mutating() {
        assert_classification(
            "INSERT INTO members (id, name) VALUES (4, 'Nina Roux')",
            SafetyLevel::Mutating,
            StatementType::Insert,
        );
        assert_classification(
            "UPDATE employees SET salary = salary * 1.1 WHERE department = 'IT'",
            SafetyLevel::Mutating,
            StatementType::Update,
        );
    }

    #[test]
    fn test_delete_drop_create_are_destructive() {
        assert_classification(
            "DELETE FROM loans WHERE return_date IS NULL",
            SafetyLevel::Destructive,
            StatementType::Delete,
        );
        assert_classification(
            "DROP TABLE IF EXISTS loans",
            SafetyLevel::Destructive,
            StatementType::Drop,
        );
        assert_classification(
            "CREATE TABLE scratch (id INTEGER)",
            SafetyLevel::Destructive,
            StatementType::Create,
        );
        assert_classification(
            "ALTER TABLE books ADD COLUMN year INTEGER",
            SafetyLevel::Destructive,
            StatementType::Alter,
        );
    }

    #[test]
    fn test_multi_statement_uses_most_dangerous() {
        assert_classification(
            "SELECT 1; INSERT INTO t VALUES (1); DELETE FROM t",
            SafetyLevel::Destructive,
            StatementType::Multiple(Box::new(StatementType::Delete)),
        );
        assert_classification(
            "SELECT 1; SELECT 2",
            SafetyLevel::ReadOnly,
            StatementType::Multiple(Box::new(StatementType::Select)),
        );
    }

    #[test]
    fn test_parse_failure_is_destructive() {
        let result = classify_sql("SELEC * FROM employees");
        assert_eq!(result.level, SafetyLevel::Destructive);
        assert_eq!(result.statement_type, StatementType::Unknown);
        assert!(result.parse_error.is_some());
    }

    #[test]
    fn test_empty_sql_is_destructive() {
        let result = classify_sql("   ");
        assert_eq!(result.level, SafetyLevel::Destructive);
        assert_eq!(result.parse_error.as_deref(), Some("empty SQL statement"));
    }

    #[test]
    fn test_case_insensitive() {
        assert_classification("select * from books", SafetyLevel::ReadOnly, StatementType::Select);
        assert_classification(
            "delete from books",
            SafetyLevel::Destructive,
            StatementType::Delete,
        );
    }
}
