//! SQL parser implementation.
//!
//! Converts SQL strings to our internal AST using sqlparser.

use sqlparser::ast as sp;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser as SqlParser;

use super::ast::*;
use super::error::{ParseError, ParseResult};

/// SQL parser for slotdb.
pub struct Parser;

impl Parser {
    /// Parse a SQL string into a statement.
    pub fn parse(sql: &str) -> ParseResult<Statement> {
        let sql = sql.trim().trim_end_matches(';').trim();
        if sql.is_empty() {
            return Err(ParseError::EmptyQuery);
        }

        let dialect = GenericDialect {};
        let statements = SqlParser::parse_sql(&dialect, sql)?;

        match statements.as_slice() {
            [] => Err(ParseError::EmptyQuery),
            [stmt] => Self::convert_statement(stmt),
            _ => Err(ParseError::MultipleStatements),
        }
    }

    fn convert_statement(stmt: &sp::Statement) -> ParseResult<Statement> {
        match stmt {
            sp::Statement::Query(query) => Self::convert_query(query),
            sp::Statement::Insert(_) => Ok(Statement::Unsupported("INSERT")),
            sp::Statement::Update { .. } => Ok(Statement::Unsupported("UPDATE")),
            sp::Statement::Delete(_) => Ok(Statement::Unsupported("DELETE")),
            other => Err(ParseError::UnsupportedStatement(
                other.to_string().split_whitespace().next().unwrap_or_default().to_uppercase(),
            )),
        }
    }

    fn convert_query(query: &sp::Query) -> ParseResult<Statement> {
        let select = match query.body.as_ref() {
            sp::SetExpr::Select(s) => s,
            other => {
                return Err(ParseError::UnsupportedStatement(format!(
                    "unsupported query type: {}",
                    other
                )))
            }
        };

        if query.order_by.is_some() {
            return Err(ParseError::UnsupportedExpression("ORDER BY".into()));
        }
        if query.limit.is_some() || query.offset.is_some() {
            return Err(ParseError::UnsupportedExpression("LIMIT/OFFSET".into()));
        }
        if select.distinct.is_some() {
            return Err(ParseError::UnsupportedExpression("DISTINCT".into()));
        }

        // FROM clause
        let from = match select.from.as_slice() {
            [table] => Self::extract_from_table(table)?,
            _ => {
                return Err(ParseError::UnsupportedStatement(
                    "exactly one table in FROM required".into(),
                ))
            }
        };

        let columns = Self::convert_projection(&select.projection)?;

        let mut conditions = Vec::new();
        if let Some(selection) = &select.selection {
            Self::collect_conditions(selection, &mut conditions)?;
        }

        Ok(Statement::Select(Select {
            columns,
            from,
            conditions,
        }))
    }

    fn convert_projection(items: &[sp::SelectItem]) -> ParseResult<Vec<SelectColumn>> {
        items
            .iter()
            .map(|item| match item {
                sp::SelectItem::Wildcard(_) => Ok(SelectColumn::Wildcard),
                sp::SelectItem::UnnamedExpr(expr) => {
                    Self::column_name(expr).map(SelectColumn::Column).ok_or_else(|| {
                        ParseError::UnsupportedExpression(format!("select item: {}", expr))
                    })
                }
                other => Err(ParseError::UnsupportedExpression(format!(
                    "select item: {}",
                    other
                ))),
            })
            .collect()
    }

    /// Flatten a WHERE clause of ANDed comparisons.
    fn collect_conditions(expr: &sp::Expr, out: &mut Vec<Condition>) -> ParseResult<()> {
        match expr {
            sp::Expr::Nested(inner) => Self::collect_conditions(inner, out),
            sp::Expr::BinaryOp {
                left,
                op: sp::BinaryOperator::And,
                right,
            } => {
                Self::collect_conditions(left, out)?;
                Self::collect_conditions(right, out)
            }
            sp::Expr::BinaryOp { left, op, right } => {
                let op = Self::convert_comparison_op(op)?;
                out.push(Self::convert_comparison(left, op, right)?);
                Ok(())
            }
            other => Err(ParseError::UnsupportedExpression(format!(
                "WHERE expression: {}",
                other
            ))),
        }
    }

    /// `column op literal`, also accepting `literal op column`.
    fn convert_comparison(
        left: &sp::Expr,
        op: ComparisonOp,
        right: &sp::Expr,
    ) -> ParseResult<Condition> {
        if let (Some(column), Some(value)) = (Self::column_name(left), Self::convert_literal(right)?) {
            return Ok(Condition { column, op, value });
        }
        if let (Some(value), Some(column)) = (Self::convert_literal(left)?, Self::plain_column_name(right)) {
            return Ok(Condition {
                column,
                op: Self::flip(op),
                value,
            });
        }
        Err(ParseError::UnsupportedExpression(format!(
            "comparison must be between a column and a literal: {} {} {}",
            left, op, right
        )))
    }

    fn flip(op: ComparisonOp) -> ComparisonOp {
        match op {
            ComparisonOp::Lt => ComparisonOp::Gt,
            ComparisonOp::LtEq => ComparisonOp::GtEq,
            ComparisonOp::Gt => ComparisonOp::Lt,
            ComparisonOp::GtEq => ComparisonOp::LtEq,
            symmetric => symmetric,
        }
    }

    /// Identifier used as a column reference; `table.column` keeps the column.
    fn column_name(expr: &sp::Expr) -> Option<String> {
        match expr {
            sp::Expr::Identifier(id) => Some(id.value.clone()),
            sp::Expr::CompoundIdentifier(parts) => parts.last().map(|p| p.value.clone()),
            _ => None,
        }
    }

    /// Like [`column_name`](Self::column_name), but a double-quoted
    /// identifier is read as a string literal instead. Only used for the
    /// right-hand side of a reversed comparison.
    fn plain_column_name(expr: &sp::Expr) -> Option<String> {
        match expr {
            sp::Expr::Identifier(id) if id.quote_style == Some('"') => None,
            other => Self::column_name(other),
        }
    }

    /// Literal operand of a comparison, or `None` if `expr` is not a literal.
    fn convert_literal(expr: &sp::Expr) -> ParseResult<Option<LiteralValue>> {
        match expr {
            sp::Expr::Value(v) => Self::convert_value(v).map(Some),
            sp::Expr::Identifier(id) if id.quote_style == Some('"') => {
                Ok(Some(LiteralValue::String(id.value.clone())))
            }
            sp::Expr::UnaryOp {
                op: sp::UnaryOperator::Minus,
                expr,
            } => match Self::convert_literal(expr)? {
                Some(LiteralValue::Integer(n)) => Ok(Some(LiteralValue::Integer(-n))),
                _ => Err(ParseError::UnsupportedExpression(format!("-{}", expr))),
            },
            sp::Expr::Nested(inner) => Self::convert_literal(inner),
            _ => Ok(None),
        }
    }

    fn convert_value(v: &sp::ValueWithSpan) -> ParseResult<LiteralValue> {
        match &v.value {
            sp::Value::Boolean(b) => Ok(LiteralValue::Boolean(*b)),
            sp::Value::Number(s, _) => s
                .parse::<i64>()
                .map(LiteralValue::Integer)
                .map_err(|_| ParseError::UnsupportedExpression(format!("invalid integer: {}", s))),
            sp::Value::SingleQuotedString(s) => Ok(LiteralValue::String(s.clone())),
            sp::Value::DoubleQuotedString(s) => Ok(LiteralValue::String(s.clone())),
            other => Err(ParseError::UnsupportedExpression(format!(
                "unsupported value: {}",
                other
            ))),
        }
    }

    fn convert_comparison_op(op: &sp::BinaryOperator) -> ParseResult<ComparisonOp> {
        match op {
            sp::BinaryOperator::Eq => Ok(ComparisonOp::Eq),
            sp::BinaryOperator::NotEq => Ok(ComparisonOp::NotEq),
            sp::BinaryOperator::Lt => Ok(ComparisonOp::Lt),
            sp::BinaryOperator::LtEq => Ok(ComparisonOp::LtEq),
            sp::BinaryOperator::Gt => Ok(ComparisonOp::Gt),
            sp::BinaryOperator::GtEq => Ok(ComparisonOp::GtEq),
            other => Err(ParseError::UnsupportedExpression(format!(
                "unsupported operator: {}",
                other
            ))),
        }
    }

    fn extract_table_name(name: &sp::ObjectName) -> ParseResult<String> {
        // Use just the table name, ignoring schema
        name.0
            .last()
            .map(|i| i.as_ident().map(|id| id.value.clone()).unwrap_or_else(|| i.to_string()))
            .ok_or_else(|| ParseError::InvalidIdentifier("empty table name".into()))
    }

    fn extract_from_table(from: &sp::TableWithJoins) -> ParseResult<String> {
        if !from.joins.is_empty() {
            return Err(ParseError::UnsupportedStatement("JOIN not supported".into()));
        }
        match &from.relation {
            sp::TableFactor::Table { name, .. } => Self::extract_table_name(name),
            other => Err(ParseError::UnsupportedStatement(format!(
                "unsupported FROM clause: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_select(sql: &str) -> Select {
        match Parser::parse(sql).unwrap() {
            Statement::Select(s) => s,
            other => panic!("Expected Select, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_select_all() {
        let s = parse_select("SELECT * FROM users");
        assert_eq!(s.from, "users");
        assert_eq!(s.columns, vec![SelectColumn::Wildcard]);
        assert!(!s.has_where());
    }

    #[test]
    fn test_parse_select_columns() {
        let s = parse_select("select id, email from users;");
        assert_eq!(
            s.columns,
            vec![SelectColumn::Column("id".into()), SelectColumn::Column("email".into())]
        );
    }

    #[test]
    fn test_parse_select_where() {
        let s = parse_select("SELECT email FROM users WHERE user_type = 'driver' AND age = 30");
        assert_eq!(
            s.conditions,
            vec![
                Condition {
                    column: "user_type".into(),
                    op: ComparisonOp::Eq,
                    value: LiteralValue::String("driver".into()),
                },
                Condition {
                    column: "age".into(),
                    op: ComparisonOp::Eq,
                    value: LiteralValue::Integer(30),
                },
            ]
        );
    }

    #[test]
    fn test_double_quoted_literal() {
        let s = parse_select(r#"SELECT email FROM users WHERE user_type = "driver""#);
        assert_eq!(s.conditions[0].column, "user_type");
        assert_eq!(s.conditions[0].value, LiteralValue::String("driver".into()));
    }

    #[test]
    fn test_quoted_column_on_left() {
        let s = parse_select(r#"SELECT email FROM users WHERE "user_type" = 'driver'"#);
        assert_eq!(s.conditions[0].column, "user_type");
        assert_eq!(s.conditions[0].op, ComparisonOp::Eq);
        assert_eq!(s.conditions[0].value, LiteralValue::String("driver".into()));
    }

    #[test]
    fn test_reversed_comparison() {
        let s = parse_select("SELECT id FROM users WHERE 30 < age");
        assert_eq!(s.conditions[0].column, "age");
        assert_eq!(s.conditions[0].op, ComparisonOp::Gt);
        assert_eq!(s.conditions[0].value, LiteralValue::Integer(30));
    }

    #[test]
    fn test_parse_relations_and_literals() {
        let s = parse_select("SELECT id FROM t WHERE a <> -3 AND (b >= 2) AND c = true");
        let ops: Vec<_> = s.conditions.iter().map(|c| c.op).collect();
        assert_eq!(ops, vec![ComparisonOp::NotEq, ComparisonOp::GtEq, ComparisonOp::Eq]);
        assert_eq!(s.conditions[0].value, LiteralValue::Integer(-3));
        assert_eq!(s.conditions[2].value, LiteralValue::Boolean(true));
    }

    #[test]
    fn test_or_is_unsupported() {
        let err = Parser::parse("SELECT id FROM t WHERE a = 1 OR b = 2").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedExpression(_)));
    }

    #[test]
    fn test_column_to_column_is_unsupported() {
        let err = Parser::parse("SELECT id FROM t WHERE a = b").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedExpression(_)));
    }

    #[test]
    fn test_parse_data_modification() {
        let sql = "INSERT INTO users (id, email) VALUES (6, 'x@example.com')";
        assert_eq!(Parser::parse(sql).unwrap(), Statement::Unsupported("INSERT"));
        assert_eq!(
            Parser::parse("DELETE FROM users WHERE id = 1").unwrap(),
            Statement::Unsupported("DELETE")
        );
        assert_eq!(
            Parser::parse("UPDATE users SET age = 1").unwrap().kind(),
            "UPDATE"
        );
    }

    #[test]
    fn test_unsupported_statement() {
        let err = Parser::parse("DROP TABLE users").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedStatement(s) if s == "DROP"));
    }

    #[test]
    fn test_unsupported_clauses() {
        assert!(Parser::parse("SELECT id FROM users ORDER BY id").is_err());
        assert!(Parser::parse("SELECT id FROM users LIMIT 1").is_err());
        assert!(Parser::parse("SELECT id FROM a, b").is_err());
        assert!(Parser::parse("SELECT id + 1 FROM a").is_err());
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(Parser::parse("SELEC id FROM users").unwrap_err(), ParseError::Syntax(_)));
    }

    #[test]
    fn test_multiple_statements() {
        let err = Parser::parse("SELECT id FROM a; SELECT id FROM b").unwrap_err();
        assert!(matches!(err, ParseError::MultipleStatements));
    }

    #[test]
    fn test_empty_query() {
        assert!(matches!(Parser::parse("").unwrap_err(), ParseError::EmptyQuery));
        assert!(matches!(Parser::parse("  ; ").unwrap_err(), ParseError::EmptyQuery));
    }
}
