//! Statement classification with sqlparser.
//!
//! Parses SQL with the generic dialect and classifies each statement by how
//! much damage it can do. `StatementPolicy` rejects anything destructive and
//! anything it cannot parse.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use super::{ClassificationResult, PolicyViolation, QueryPolicy, SafetyLevel, StatementType};

/// SQL classifier that parses and classifies SQL queries.
#[derive(Debug)]
pub struct SqlClassifier {
    dialect: GenericDialect,
}

impl Default for SqlClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlClassifier {
    pub fn new() -> Self {
        Self {
            dialect: GenericDialect {},
        }
    }

    /// Classifies a SQL string.
    ///
    /// Returns `None` if the SQL cannot be parsed or contains no statements.
    pub fn classify(&self, sql: &str) -> Option<ClassificationResult> {
        let statements = Parser::parse_sql(&self.dialect, sql).ok()?;

        match statements.as_slice() {
            [] => None,
            [single] => {
                let (level, stmt_type) = classify_statement(single);
                Some(ClassificationResult::new(level, stmt_type))
            }
            many => {
                let (level, stmt_type) = many
                    .iter()
                    .map(classify_statement)
                    .fold((SafetyLevel::Safe, StatementType::Unknown), max_by_level);
                Some(ClassificationResult::new(
                    level,
                    StatementType::Multiple(Box::new(stmt_type)),
                ))
            }
        }
    }
}

/// Convenience function to classify SQL without creating a classifier instance.
pub fn classify_sql(sql: &str) -> Option<ClassificationResult> {
    SqlClassifier::new().classify(sql)
}

/// Allows safe and mutating statements; rejects destructive or unparseable SQL.
#[derive(Debug, Default)]
pub struct StatementPolicy {
    classifier: SqlClassifier,
}

impl StatementPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueryPolicy for StatementPolicy {
    fn check(&self, sql: &str) -> Result<(), PolicyViolation> {
        match self.classifier.classify(sql) {
            Some(result) if result.level == SafetyLevel::Destructive => {
                Err(PolicyViolation::new(result.statement_type.to_string()))
            }
            Some(_) => Ok(()),
            None => Err(PolicyViolation::new("unparseable SQL")),
        }
    }

    fn name(&self) -> &'static str {
        "statements"
    }
}

fn max_by_level(
    current: (SafetyLevel, StatementType),
    next: (SafetyLevel, StatementType),
) -> (SafetyLevel, StatementType) {
    if next.0.priority() > current.0.priority() {
        next
    } else {
        current
    }
}

/// Classifies a single parsed statement.
fn classify_statement(statement: &Statement) -> (SafetyLevel, StatementType) {
    match statement {
        // Query: may contain data-modifying CTEs, so recurse
        Statement::Query(query) => classify_query(query),
        Statement::Explain {
            analyze, statement, ..
        } => {
            if *analyze {
                // EXPLAIN ANALYZE executes the statement
                let (inner_level, _) = classify_statement(statement);
                (inner_level, StatementType::Explain)
            } else {
                (SafetyLevel::Safe, StatementType::Explain)
            }
        }
        Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowVariable { .. }
        | Statement::ShowCreate { .. } => (SafetyLevel::Safe, StatementType::Show),

        Statement::Insert { .. } => (SafetyLevel::Mutating, StatementType::Insert),
        Statement::Update { .. } => (SafetyLevel::Mutating, StatementType::Update),
        Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. } => (SafetyLevel::Mutating, StatementType::Create),

        Statement::Delete { .. } => (SafetyLevel::Destructive, StatementType::Delete),
        Statement::Drop { .. } => (SafetyLevel::Destructive, StatementType::Drop),
        Statement::Truncate { .. } => (SafetyLevel::Destructive, StatementType::Truncate),
        Statement::AlterTable { .. }
        | Statement::AlterIndex { .. }
        | Statement::AlterView { .. }
        | Statement::AlterRole { .. } => (SafetyLevel::Destructive, StatementType::Alter),

        // Conservative default: treat unknown statements as destructive
        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

/// Classifies a Query by recursively inspecting CTEs and the body.
fn classify_query(query: &Query) -> (SafetyLevel, StatementType) {
    let ctes = query
        .with
        .iter()
        .flat_map(|with| with.cte_tables.iter())
        .map(|cte| classify_query(&cte.query));

    ctes.chain(std::iter::once(classify_set_expr(&query.body)))
        .fold((SafetyLevel::Safe, StatementType::Select), max_by_level)
}

/// Classifies a SetExpr, detecting mutations and recursing into nested queries.
fn classify_set_expr(set_expr: &SetExpr) -> (SafetyLevel, StatementType) {
    match set_expr {
        SetExpr::Insert(stmt) | SetExpr::Update(stmt) => classify_statement(stmt),
        SetExpr::Query(query) => classify_query(query),
        SetExpr::Select(select) => classify_select(select),
        SetExpr::SetOperation { left, right, .. } => {
            max_by_level(classify_set_expr(left), classify_set_expr(right))
        }
        SetExpr::Values(_) | SetExpr::Table(_) => (SafetyLevel::Safe, StatementType::Select),
        #[allow(unreachable_patterns)]
        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

/// Classifies a Select by checking its FROM clause for subqueries.
fn classify_select(select: &Select) -> (SafetyLevel, StatementType) {
    select
        .from
        .iter()
        .map(classify_table_with_joins)
        .fold((SafetyLevel::Safe, StatementType::Select), max_by_level)
}

/// Classifies a TableWithJoins, checking the main relation and all joins.
fn classify_table_with_joins(twj: &TableWithJoins) -> (SafetyLevel, StatementType) {
    std::iter::once(&twj.relation)
        .chain(twj.joins.iter().map(|join| &join.relation))
        .map(classify_table_factor)
        .fold((SafetyLevel::Safe, StatementType::Select), max_by_level)
}

/// Classifies a TableFactor, recursing into derived tables (subqueries).
fn classify_table_factor(factor: &TableFactor) -> (SafetyLevel, StatementType) {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        _ => (SafetyLevel::Safe, StatementType::Select),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_classification(sql: &str, expected_level: SafetyLevel, expected_type: StatementType) {
        let result = classify_sql(sql).expect("SQL should parse");
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
    fn test_select_is_safe() {
        assert_classification(
            "SELECT * FROM users",
            SafetyLevel::Safe,
            StatementType::Select,
        );
    }

    #[test]
    fn test_select_with_join_is_safe() {
        assert_classification(
            "SELECT u.username, p.name FROM users u JOIN products p ON u.id = p.id",
            SafetyLevel::Safe,
            StatementType::Select,
        );
    }

    #[test]
    fn test_insert_is_mutating() {
        assert_classification(
            "INSERT INTO users (username, email) VALUES ('john', 'john@example.com')",
            SafetyLevel::Mutating,
            StatementType::Insert,
        );
    }

    #[test]
    fn test_create_table_is_mutating() {
        assert_classification(
            "CREATE TABLE products (id INT PRIMARY KEY, name VARCHAR(100))",
            SafetyLevel::Mutating,
            StatementType::Create,
        );
    }

    #[test]
    fn test_drop_is_destructive() {
        assert_classification(
            "DROP TABLE users",
            SafetyLevel::Destructive,
            StatementType::Drop,
        );
    }

    #[test]
    fn test_alter_is_destructive() {
        assert_classification(
            "ALTER TABLE products ADD COLUMN price DECIMAL(10,2)",
            SafetyLevel::Destructive,
            StatementType::Alter,
        );
    }

    #[test]
    fn test_multiple_statements_take_most_dangerous() {
        assert_classification(
            "SELECT 1; DELETE FROM users",
            SafetyLevel::Destructive,
            StatementType::Multiple(Box::new(StatementType::Delete)),
        );
    }

    #[test]
    fn test_unparseable_sql_has_no_classification() {
        assert!(classify_sql("SELEC * FORM users").is_none());
        assert!(classify_sql("").is_none());
    }

    #[test]
    fn test_statement_policy_allows_identifiers_the_blocklist_rejects() {
        let policy = StatementPolicy::new();
        assert_eq!(policy.check("SELECT dropped_at FROM orders"), Ok(()));
    }

    #[test]
    fn test_statement_policy_rejects_destructive_and_garbage() {
        let policy = StatementPolicy::new();
        assert_eq!(
            policy.check("DROP TABLE users"),
            Err(PolicyViolation::new("DROP"))
        );
        assert_eq!(
            policy.check("not sql at all"),
            Err(PolicyViolation::new("unparseable SQL"))
        );
    }
}
