//! Named queries: precompiled statements looked up by name at execution time.
//!
//! Query text uses `:name` placeholders. Registration rewrites them to
//! positional `?` markers and records the order in which names occur, so
//! binding is a lookup per placeholder. Quoted literals and identifiers,
//! `--` and `/* */` comments, and `::` casts are left alone.

use super::value::{QueryParameters, SqlValue};
use crate::EntityMapping;
use std::collections::{BTreeSet, HashMap};
use strata_core::{PageDescriptor, StrataError, StrataResult};

/// A compiled named query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQuery {
    name: String,
    source: String,
    paged_sql: String,
    placeholders: Vec<String>,
}

impl NamedQuery {
    /// Compiles query text, rejecting malformed placeholders.
    pub fn compile(name: impl Into<String>, source: impl Into<String>) -> StrataResult<Self> {
        let name = name.into();
        let source = source.into();

        let body = source.trim().trim_end_matches(';').trim_end();
        if body.is_empty() {
            return Err(StrataError::configuration(format!(
                "Named query '{}' has no query text",
                name
            )));
        }

        let (sql, placeholders) = rewrite_placeholders(&name, body)?;

        Ok(Self {
            paged_sql: format!("{}\nLIMIT ? OFFSET ?", sql),
            name,
            source,
            placeholders,
        })
    }

    /// The registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The query text as registered.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compiled SQL with positional markers, followed by `LIMIT ? OFFSET ?` on
    /// its own line so a trailing line comment cannot swallow it.
    #[must_use]
    pub fn paged_sql(&self) -> &str {
        &self.paged_sql
    }

    /// Distinct parameter names the query declares.
    #[must_use]
    pub fn parameter_names(&self) -> BTreeSet<&str> {
        self.placeholders.iter().map(String::as_str).collect()
    }

    /// Resolves parameters into positional values.
    ///
    /// Every placeholder must be bound, and every bound name must be a
    /// placeholder of this query.
    pub fn bind(&self, parameters: Option<&QueryParameters>) -> StrataResult<Vec<SqlValue>> {
        if let Some(parameters) = parameters {
            let declared = self.parameter_names();
            let mut undeclared: Vec<&str> = parameters
                .names()
                .filter(|name| !declared.contains(name))
                .collect();
            if !undeclared.is_empty() {
                undeclared.sort_unstable();
                return Err(StrataError::binding(format!(
                    "Named query '{}' does not declare parameter(s): {}",
                    self.name,
                    undeclared.join(", ")
                )));
            }
        }

        self.placeholders
            .iter()
            .map(|placeholder| {
                parameters
                    .and_then(|p| p.get(placeholder))
                    .cloned()
                    .ok_or_else(|| {
                        StrataError::binding(format!(
                            "Named query '{}' requires parameter ':{}' which was not bound",
                            self.name, placeholder
                        ))
                    })
            })
            .collect()
    }
}

/// Lexer state while scanning query text.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

fn rewrite_placeholders(name: &str, body: &str) -> StrataResult<(String, Vec<String>)> {
    let mut sql = String::with_capacity(body.len());
    let mut placeholders = Vec::new();
    let mut state = Scan::Code;
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            Scan::Quoted(q) => {
                sql.push(c);
                if c == q {
                    state = Scan::Code;
                }
                continue;
            }
            Scan::LineComment => {
                sql.push(c);
                if c == '\n' {
                    state = Scan::Code;
                }
                continue;
            }
            Scan::BlockComment => {
                sql.push(c);
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    sql.push('/');
                    state = Scan::Code;
                }
                continue;
            }
            Scan::Code => {}
        }

        match c {
            '\'' | '"' | '`' => {
                state = Scan::Quoted(c);
                sql.push(c);
            }
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                sql.push_str("--");
                state = Scan::LineComment;
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                sql.push_str("/*");
                state = Scan::BlockComment;
            }
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                sql.push_str("::");
            }
            ':' => {
                let mut placeholder = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        placeholder.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if placeholder.is_empty()
                    || !placeholder.starts_with(|ch: char| ch.is_ascii_alphabetic() || ch == '_')
                {
                    return Err(StrataError::configuration(format!(
                        "Named query '{}' has a malformed placeholder ':{}'",
                        name, placeholder
                    )));
                }
                sql.push('?');
                placeholders.push(placeholder);
            }
            '?' => {
                return Err(StrataError::configuration(format!(
                    "Named query '{}' uses a positional parameter; use :name placeholders",
                    name
                )));
            }
            _ => sql.push(c),
        }
    }

    match state {
        Scan::Quoted(q) => Err(StrataError::configuration(format!(
            "Named query '{}' has an unterminated {} quote",
            name, q
        ))),
        Scan::BlockComment => Err(StrataError::configuration(format!(
            "Named query '{}' has an unterminated block comment",
            name
        ))),
        Scan::Code | Scan::LineComment => Ok((sql, placeholders)),
    }
}

/// Named queries available to a repository.
#[derive(Debug, Clone, Default)]
pub struct NamedQueryRegistry {
    queries: HashMap<String, NamedQuery>,
}

impl NamedQueryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles and registers a query. Names are unique.
    pub fn register(&mut self, name: impl Into<String>, sql: impl Into<String>) -> StrataResult<()> {
        let query = NamedQuery::compile(name, sql)?;
        if self.queries.contains_key(query.name()) {
            return Err(StrataError::configuration(format!(
                "Named query '{}' is already registered",
                query.name()
            )));
        }
        self.queries.insert(query.name().to_string(), query);
        Ok(())
    }

    /// Registers every named query an entity declares.
    pub fn register_entity<T: EntityMapping>(&mut self) -> StrataResult<()> {
        for (name, sql) in T::named_queries() {
            self.register(name, sql)?;
        }
        Ok(())
    }

    /// Builder form of [`register_entity`](Self::register_entity).
    pub fn with_entity<T: EntityMapping>(mut self) -> StrataResult<Self> {
        self.register_entity::<T>()?;
        Ok(self)
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_query(mut self, name: impl Into<String>, sql: impl Into<String>) -> StrataResult<Self> {
        self.register(name, sql)?;
        Ok(self)
    }

    /// Looks up a query by name.
    pub fn get(&self, name: &str) -> StrataResult<&NamedQuery> {
        self.queries
            .get(name)
            .ok_or_else(|| StrataError::UnknownQuery(name.to_string()))
    }

    /// Whether a query is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    /// Number of registered queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

/// A request to execute a named query: name, optional parameters and page.
///
/// Omitted values default to no parameters, a full page of
/// [`MAX_PAGE_SIZE`](strata_core::MAX_PAGE_SIZE) rows and offset zero.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedQueryRequest {
    name: String,
    parameters: Option<QueryParameters>,
    page: PageDescriptor,
}

impl NamedQueryRequest {
    /// Creates a request for the named query.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: None,
            page: PageDescriptor::first(),
        }
    }

    /// Binds one parameter.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.parameters
            .get_or_insert_with(QueryParameters::new)
            .insert(name, value);
        self
    }

    /// Replaces all parameters.
    #[must_use]
    pub fn parameters(mut self, parameters: QueryParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Requested page size. Zero or negative means a full page.
    #[must_use]
    pub fn result_limit(mut self, result_limit: i64) -> Self {
        self.page.result_limit = result_limit;
        self
    }

    /// Offset of the first row.
    #[must_use]
    pub fn first_result(mut self, first_result: u64) -> Self {
        self.page.first_result = first_result;
        self
    }

    /// Sets offset and size together.
    #[must_use]
    pub fn page(mut self, page: PageDescriptor) -> Self {
        self.page = page;
        self
    }

    /// The query name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound parameters, if any.
    #[must_use]
    pub fn bound_parameters(&self) -> Option<&QueryParameters> {
        self.parameters.as_ref()
    }

    /// The page descriptor.
    #[must_use]
    pub const fn page_descriptor(&self) -> PageDescriptor {
        self.page
    }
}
