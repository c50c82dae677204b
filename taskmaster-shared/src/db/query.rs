/// Typed dynamic query construction
///
/// List endpoints combine optional filters and update endpoints touch only the
/// fields a client sent. Both are expressed here as data rather than string
/// concatenation:
///
/// - [`Filter`]: a conjunction of [`Predicate`]s rendered as a `WHERE` clause
/// - [`Changeset`]: column assignments rendered as an `UPDATE ... SET` statement
///
/// Column names are `&'static str` chosen by the calling model, never taken
/// from a request. Every value goes through `QueryBuilder::push_bind`.
///
/// # Example
///
/// ```
/// use sqlx::{Postgres, QueryBuilder};
/// use taskmaster_shared::db::query::{Filter, Predicate};
///
/// let filter = Filter::new()
///     .and(Predicate::eq("status", "completed"))
///     .and(Predicate::any_of(vec![
///         Predicate::contains("title", "foo"),
///         Predicate::contains("description", "foo"),
///     ]));
///
/// let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM tasks");
/// filter.push_where(&mut qb);
/// assert_eq!(
///     qb.sql(),
///     "SELECT * FROM tasks WHERE status = $1 AND (title ILIKE $2 OR description ILIKE $3)"
/// );
/// ```

use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::task::{TaskPriority, TaskStatus};

/// A value that can be bound into a generated statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Uuid(Uuid),
    NullableUuid(Option<Uuid>),
    Text(String),
    NullableText(Option<String>),
    Date(Option<NaiveDate>),
    TaskStatus(TaskStatus),
    TaskPriority(TaskPriority),
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<Option<Uuid>> for SqlValue {
    fn from(v: Option<Uuid>) -> Self {
        SqlValue::NullableUuid(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Option<String>> for SqlValue {
    fn from(v: Option<String>) -> Self {
        SqlValue::NullableText(v)
    }
}

impl From<Option<NaiveDate>> for SqlValue {
    fn from(v: Option<NaiveDate>) -> Self {
        SqlValue::Date(v)
    }
}

impl From<TaskStatus> for SqlValue {
    fn from(v: TaskStatus) -> Self {
        SqlValue::TaskStatus(v)
    }
}

impl From<TaskPriority> for SqlValue {
    fn from(v: TaskPriority) -> Self {
        SqlValue::TaskPriority(v)
    }
}

/// Comparison operator of a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `column = value`
    Eq,

    /// `column ILIKE value` (case-insensitive pattern match)
    ILike,
}

impl Op {
    fn as_sql(&self) -> &'static str {
        match self {
            Op::Eq => " = ",
            Op::ILike => " ILIKE ",
        }
    }
}

/// A single condition, or a disjunction of conditions
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: &'static str,
        op: Op,
        value: SqlValue,
    },
    AnyOf(Vec<Predicate>),
}

impl Predicate {
    /// `column = value`
    pub fn eq(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Predicate::Compare {
            column,
            op: Op::Eq,
            value: value.into(),
        }
    }

    /// Case-insensitive substring match; LIKE wildcards in `term` match literally
    pub fn contains(column: &'static str, term: &str) -> Self {
        Predicate::Compare {
            column,
            op: Op::ILike,
            value: SqlValue::Text(format!("%{}%", escape_like(term))),
        }
    }

    /// At least one of `predicates` holds
    pub fn any_of(predicates: Vec<Predicate>) -> Self {
        Predicate::AnyOf(predicates)
    }

    fn push_to(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Predicate::Compare { column, op, value } => {
                qb.push(*column);
                qb.push(op.as_sql());
                push_value(qb, value.clone());
            }
            Predicate::AnyOf(predicates) if predicates.is_empty() => {
                qb.push("FALSE");
            }
            Predicate::AnyOf(predicates) => {
                qb.push("(");
                for (i, predicate) in predicates.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    predicate.push_to(qb);
                }
                qb.push(")");
            }
        }
    }
}

/// Conjunction of predicates; an empty filter matches every row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate that must hold
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Adds the predicate only when one was supplied
    pub fn and_maybe(self, predicate: Option<Predicate>) -> Self {
        match predicate {
            Some(p) => self.and(p),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Appends ` WHERE p1 AND p2 ...`, or nothing when the filter is empty
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        for (i, predicate) in self.predicates.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            predicate.push_to(qb);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Assignment {
    Value {
        column: &'static str,
        value: SqlValue,
    },
    Expr {
        column: &'static str,
        expr: &'static str,
    },
}

/// Column assignments for a partial update
///
/// `updated_at = NOW()` is always appended when the statement is built, so it
/// never needs to be added by callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    assignments: Vec<Assignment>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a bound value to `column`
    pub fn set(&mut self, column: &'static str, value: impl Into<SqlValue>) -> &mut Self {
        self.assignments.push(Assignment::Value {
            column,
            value: value.into(),
        });
        self
    }

    /// Assigns a fixed SQL expression to `column`
    pub fn set_expr(&mut self, column: &'static str, expr: &'static str) -> &mut Self {
        self.assignments.push(Assignment::Expr { column, expr });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Column names in assignment order
    pub fn columns(&self) -> Vec<&'static str> {
        self.assignments
            .iter()
            .map(|a| match a {
                Assignment::Value { column, .. } | Assignment::Expr { column, .. } => *column,
            })
            .collect()
    }

    /// Builds `UPDATE table SET ..., updated_at = NOW() WHERE id = $n RETURNING ...`
    ///
    /// Returns `None` when nothing was assigned.
    pub fn into_update(
        self,
        table: &'static str,
        id: Uuid,
        returning: &'static str,
    ) -> Option<QueryBuilder<'static, Postgres>> {
        if self.assignments.is_empty() {
            return None;
        }

        let mut qb = QueryBuilder::new("UPDATE ");
        qb.push(table);
        qb.push(" SET ");

        for assignment in self.assignments {
            match assignment {
                Assignment::Value { column, value } => {
                    qb.push(column);
                    qb.push(" = ");
                    push_value(&mut qb, value);
                }
                Assignment::Expr { column, expr } => {
                    qb.push(column);
                    qb.push(" = ");
                    qb.push(expr);
                }
            }
            qb.push(", ");
        }

        qb.push("updated_at = NOW() WHERE id = ");
        qb.push_bind(id);
        qb.push(" RETURNING ");
        qb.push(returning);

        Some(qb)
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: SqlValue) {
    match value {
        SqlValue::Uuid(v) => qb.push_bind(v),
        SqlValue::NullableUuid(v) => qb.push_bind(v),
        SqlValue::Text(v) => qb.push_bind(v),
        SqlValue::NullableText(v) => qb.push_bind(v),
        SqlValue::Date(v) => qb.push_bind(v),
        SqlValue::TaskStatus(v) => qb.push_bind(v),
        SqlValue::TaskPriority(v) => qb.push_bind(v),
    };
}

/// Escapes `\`, `%` and `_` so they match literally inside a LIKE pattern
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
