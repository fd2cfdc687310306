//! The shared context handle.
//!
//! An [`Engine`] owns the registered schemas, column maps, configuration and
//! the optional scan pool. It is immutable once built and can be shared
//! across threads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rayon::ThreadPool;
use serde::Serialize;

use crate::ast::{FilterExpression, SortExpression, TypeSchema};
use crate::config::Config;
use crate::error::Error;
use crate::memory::{InMemoryQuery, Scanner};
use crate::paginate::{DataSource, Page, Plan};
use crate::parser::{group_filter, group_sort, parse_filter, parse_order, PropertyResolver};
use crate::schema_cache::{ColumnMap, SchemaCache};
use crate::sql::{QueryBuilder, RenderMode, SqlFragment};

/// Collects schemas and column maps for an [`Engine`].
#[derive(Debug, Default)]
pub struct EngineBuilder {
    config: Config,
    schemas: Vec<TypeSchema>,
    columns: Vec<(String, ColumnMap)>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn register(mut self, schema: TypeSchema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Column map for a registered type. Only the relational compiler needs
    /// one.
    pub fn columns(mut self, type_name: impl Into<String>, map: ColumnMap) -> Self {
        self.columns.push((type_name.into(), map));
        self
    }

    /// Validates the registrations and creates the scan pool.
    ///
    /// # Errors
    ///
    /// `Error::Configuration` when a type or column map is registered twice,
    /// a column map targets an unknown type, a field references an
    /// unregistered object type, or the worker pool cannot be started.
    pub fn build(self) -> Result<Engine, Error> {
        let mut cache = SchemaCache::new();
        for schema in self.schemas {
            cache.register(schema)?;
        }
        for (type_name, map) in self.columns {
            cache.register_columns(&type_name, map)?;
        }
        cache.validate()?;

        let pool = if self.config.scan_parallelism > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.scan_parallelism)
                .thread_name(|index| format!("dfs-scan-{}", index))
                .build()
                .map_err(|e| Error::Configuration(format!("scan pool: {}", e)))?;
            Some(Arc::new(pool))
        } else {
            None
        };

        tracing::debug!(
            types = cache.len(),
            scan_workers = self.config.scan_parallelism,
            "engine built"
        );

        Ok(Engine {
            cache,
            config: self.config,
            pool,
            fallbacks: AtomicU64::new(0),
        })
    }
}

/// Parses and compiles filter and sort strings against registered types.
#[derive(Debug)]
pub struct Engine {
    cache: SchemaCache,
    config: Config,
    pool: Option<Arc<ThreadPool>>,
    fallbacks: AtomicU64,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn schemas(&self) -> &SchemaCache {
        &self.cache
    }

    /// Times a store rejection was answered by local evaluation.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    /// Parses `input` into a grouped filter over `type_name`. Blank input
    /// gives an empty filter, which matches everything.
    pub fn parse_filter(&self, input: &str, type_name: &str) -> Result<FilterExpression, Error> {
        let root = self.cache.schema(type_name)?;
        let delimiters = self.config.delimiters_longest_first();
        let resolver =
            PropertyResolver::new(&self.cache, &delimiters, self.config.default_delimiter());

        let parameters = parse_filter(input, root, &resolver, &delimiters)?;
        let filter = group_filter(&root.name, parameters);

        tracing::debug!(
            type_name = %root.name,
            terms = filter.parameters.len(),
            primary = filter.primary.terms().len(),
            secondary = filter.secondary.terms().len(),
            "parsed filter"
        );
        Ok(filter)
    }

    /// Parses `input` into a sort over `type_name`.
    pub fn parse_sort(&self, input: &str, type_name: &str) -> Result<SortExpression, Error> {
        let root = self.cache.schema(type_name)?;
        let delimiters = self.config.delimiters_longest_first();
        let resolver =
            PropertyResolver::new(&self.cache, &delimiters, self.config.default_delimiter());

        let parameters = parse_order(input, root, &resolver, &delimiters)?;
        let sort = group_sort(&root.name, parameters);

        tracing::debug!(
            type_name = %root.name,
            keys = sort.parameters.len(),
            secondary = sort.secondary.len(),
            "parsed sort"
        );
        Ok(sort)
    }

    pub fn compile_in_memory(
        &self,
        filter: &FilterExpression,
        sort: &SortExpression,
    ) -> Result<InMemoryQuery, Error> {
        InMemoryQuery::compile(filter, sort)
    }

    /// Renders a PostgreSQL fragment using the column map of the filter's
    /// type. With `parameterized` unset, values are inlined as literals.
    pub fn compile_relational(
        &self,
        filter: &FilterExpression,
        sort: &SortExpression,
        alias: Option<&str>,
        parameterized: bool,
    ) -> Result<SqlFragment, Error> {
        let columns = self.cache.columns(&filter.type_name)?;
        let mode = if parameterized {
            RenderMode::Parameterized(self.config.placeholder)
        } else {
            RenderMode::Literal
        };

        let fragment = QueryBuilder::new(columns)
            .with_alias(alias)
            .with_mode(mode)
            .build(filter, sort)?;

        tracing::debug!(
            type_name = %filter.type_name,
            where_clause = %fragment.where_clause,
            order_by = %fragment.order_by,
            params = fragment.params.len(),
            "compiled relational fragment"
        );
        Ok(fragment)
    }

    /// Scanner for the secondary key reduction, parallel when a pool exists.
    pub fn scanner(&self) -> Scanner<'_> {
        match &self.pool {
            Some(pool) => Scanner::parallel(pool, self.config.parallel_threshold),
            None => Scanner::sequential(),
        }
    }

    /// Filters, sorts and pages rows of `source`.
    ///
    /// The store-evaluable halves go to [`DataSource::fetch`] as one
    /// parameterized fragment. Traversal terms and keys are then applied to
    /// the returned rows. Without any, the page itself is pushed down as
    /// LIMIT and OFFSET and the total comes from [`DataSource::count`]. A [`SourceError::Rejected`](crate::SourceError)
    /// answer is retried locally over [`DataSource::load_all`] when
    /// `allow_local_fallback` is set.
    pub fn paginate<S: DataSource>(
        &self,
        source: &S,
        type_name: &str,
        filter: &str,
        sort: &str,
        offset: usize,
        count: usize,
    ) -> Result<Page<S::Item>, Error> {
        let filter = self.parse_filter(filter, type_name)?;
        let sort = self.parse_sort(sort, type_name)?;

        let plan = Plan {
            query: self.compile_in_memory(&filter, &sort)?,
            fragment: self.compile_relational(
                &filter.primary_only(),
                &sort.primary_only(),
                None,
                true,
            )?,
            scanner: self.scanner(),
            allow_fallback: self.config.allow_local_fallback,
        };

        plan.execute(source, offset, count, &self.fallbacks)
    }

    /// Filters, sorts and pages an in-memory collection.
    pub fn paginate_slice<T: Serialize + Clone>(
        &self,
        items: &[T],
        type_name: &str,
        filter: &str,
        sort: &str,
        offset: usize,
        count: usize,
    ) -> Result<Page<T>, Error> {
        let filter = self.parse_filter(filter, type_name)?;
        let sort = self.parse_sort(sort, type_name)?;
        let ordered = self
            .compile_in_memory(&filter, &sort)?
            .apply(items, &self.scanner())?;
        Ok(Page::from_ordered(ordered, offset, count))
    }
}
