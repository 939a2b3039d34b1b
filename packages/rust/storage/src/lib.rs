//! Turso Embedded / libSQL storage layer for discovered tools.
//!
//! The [`Storage`] struct wraps a libSQL database holding the `ai_tools`
//! table. The pipeline talks to it through the [`ToolStore`] trait so the
//! core can be exercised against in-memory doubles.
//!
//! **Access rules:**
//! - Scanner CLI: read-write (sole writer) via [`Storage::open`]
//! - Dashboard readers: read-only via [`Storage::open_readonly`]
//!
//! Values cross the storage boundary as primitives: timestamps are RFC 3339
//! strings, list fields are JSON text, URLs are plain strings.

mod migrations;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::params::Params;
use libsql::{Connection, Database, Value, params};
use serde::Serialize;
use uuid::Uuid;

use aitracker_shared::{NewTool, PersistedTool, Pricing, Result, SourceTag, ToolUpdate, TrackerError};

/// Column list shared by every tool query, in [`row_to_tool`] order.
const TOOL_COLUMNS: &str = "id, name, description, url, source, summary, use_cases_json, \
     category, pricing, hype_score, stars, today_stars, likes, downloads, upvotes, tags_json, \
     pipeline_tag, sdk, discovered_date, created_at, updated_at";

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// Equality filters for [`ToolStore::list`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ToolFilter {
    pub category: Option<String>,
    pub pricing: Option<Pricing>,
    pub source: Option<SourceTag>,
    /// Only tools first discovered at or after this instant.
    pub discovered_since: Option<DateTime<Utc>>,
}

/// Sort order for [`ToolStore::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolOrder {
    /// Highest hype score first.
    #[default]
    Hype,
    /// Most recently discovered first.
    Newest,
    /// Alphabetical by name.
    Name,
}

impl ToolOrder {
    fn sql(&self) -> &'static str {
        match self {
            Self::Hype => " ORDER BY hype_score DESC, name ASC",
            Self::Newest => " ORDER BY discovered_date DESC, name ASC",
            Self::Name => " ORDER BY name ASC",
        }
    }
}

impl std::str::FromStr for ToolOrder {
    type Err = TrackerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "hype" => Ok(Self::Hype),
            "newest" => Ok(Self::Newest),
            "name" => Ok(Self::Name),
            other => Err(TrackerError::validation(format!(
                "unknown order '{other}': expected hype, newest or name"
            ))),
        }
    }
}

/// Dashboard summary numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolStats {
    pub total_tools: u64,
    pub new_today: u64,
    /// Mean hype score, rounded to one decimal.
    pub avg_hype_score: f64,
    /// Most frequent category, `"N/A"` when there are no tools.
    pub top_category: String,
}

/// Number of tools in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: u64,
}

// ---------------------------------------------------------------------------
// ToolStore
// ---------------------------------------------------------------------------

/// Persistence capability consumed by the ingestion pipeline.
///
/// Identity is `url`; `name` is a secondary lookup only.
#[async_trait]
pub trait ToolStore: Send + Sync {
    /// Exact-match lookup by canonical URL.
    async fn find_by_url(&self, url: &str) -> Result<Option<PersistedTool>>;

    /// Oldest tool with exactly this name, if any.
    async fn find_by_name(&self, name: &str) -> Result<Option<PersistedTool>>;

    /// Oldest tool with exactly this name that came from `source`.
    async fn find_by_name_and_source(
        &self,
        name: &str,
        source: SourceTag,
    ) -> Result<Option<PersistedTool>>;

    /// Insert a tool seen for the first time; storage assigns the id.
    async fn insert(&self, tool: &NewTool) -> Result<PersistedTool>;

    /// Apply a partial update and return the refreshed row.
    async fn update(&self, id: &str, update: &ToolUpdate) -> Result<PersistedTool>;

    /// Filtered, ordered listing.
    async fn list(
        &self,
        filter: &ToolFilter,
        order: ToolOrder,
        limit: u32,
    ) -> Result<Vec<PersistedTool>>;
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TrackerError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(db_err)?;

        let conn = db.connect().map_err(db_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Migrated database that lives only as long as the handle. Nothing touches disk.
    pub async fn open_in_memory() -> Result<Self> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(db_err)?;

        let conn = db.connect().map_err(db_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open a database at `path` in read-only mode (for dashboard readers).
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(db_err)?;

        let conn = db.connect().map_err(db_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        TrackerError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(TrackerError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    /// Fetch a tool by its storage id.
    pub async fn get_tool(&self, id: &str) -> Result<Option<PersistedTool>> {
        self.query_one(
            &format!("SELECT {TOOL_COLUMNS} FROM ai_tools WHERE id = ?1"),
            Params::Positional(vec![Value::Text(id.to_string())]),
        )
        .await
    }

    /// Summary numbers for the dashboard. `today_start` bounds "new today".
    pub async fn stats(&self, today_start: DateTime<Utc>) -> Result<ToolStats> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN discovered_date >= ?1 THEN 1 ELSE 0 END), 0),
                        AVG(hype_score)
                 FROM ai_tools",
                params![timestamp(&today_start)],
            )
            .await
            .map_err(db_err)?;

        let (total_tools, new_today, avg) = match rows.next().await.map_err(db_err)? {
            Some(row) => (
                row.get::<i64>(0).map_err(db_err)?,
                row.get::<i64>(1).map_err(db_err)?,
                row.get::<f64>(2).unwrap_or(0.0),
            ),
            None => (0, 0, 0.0),
        };

        let top_category = self
            .category_counts()
            .await?
            .into_iter()
            .find(|c| c.name != UNCATEGORIZED)
            .map(|c| c.name)
            .unwrap_or_else(|| "N/A".to_string());

        Ok(ToolStats {
            total_tools: total_tools as u64,
            new_today: new_today as u64,
            avg_hype_score: (avg * 10.0).round() / 10.0,
            top_category,
        })
    }

    /// Tool counts per category, most populated first.
    pub async fn category_counts(&self) -> Result<Vec<CategoryCount>> {
        let mut rows = self
            .conn
            .query(
                "SELECT COALESCE(category, ?1) AS cat, COUNT(*) AS n
                 FROM ai_tools
                 GROUP BY cat
                 ORDER BY n DESC, cat ASC",
                params![UNCATEGORIZED],
            )
            .await
            .map_err(db_err)?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(CategoryCount {
                name: row.get::<String>(0).map_err(db_err)?,
                count: row.get::<i64>(1).map_err(db_err)? as u64,
            });
        }
        Ok(results)
    }

    async fn query_one(&self, sql: &str, params: Params) -> Result<Option<PersistedTool>> {
        let mut rows = self.conn.query(sql, params).await.map_err(db_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_tool(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(db_err(e)),
        }
    }
}

/// Category label used for tools that have none yet.
const UNCATEGORIZED: &str = "Uncategorized";

#[async_trait]
impl ToolStore for Storage {
    async fn find_by_url(&self, url: &str) -> Result<Option<PersistedTool>> {
        self.query_one(
            &format!("SELECT {TOOL_COLUMNS} FROM ai_tools WHERE url = ?1"),
            Params::Positional(vec![Value::Text(url.to_string())]),
        )
        .await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<PersistedTool>> {
        self.query_one(
            &format!(
                "SELECT {TOOL_COLUMNS} FROM ai_tools WHERE name = ?1 ORDER BY created_at ASC LIMIT 1"
            ),
            Params::Positional(vec![Value::Text(name.to_string())]),
        )
        .await
    }

    async fn find_by_name_and_source(
        &self,
        name: &str,
        source: SourceTag,
    ) -> Result<Option<PersistedTool>> {
        self.query_one(
            &format!(
                "SELECT {TOOL_COLUMNS} FROM ai_tools WHERE name = ?1 AND source = ?2 \
                 ORDER BY created_at ASC LIMIT 1"
            ),
            Params::Positional(vec![
                Value::Text(name.to_string()),
                Value::Text(source.as_str().to_string()),
            ]),
        )
        .await
    }

    async fn insert(&self, tool: &NewTool) -> Result<PersistedTool> {
        self.check_writable()?;
        let id = Uuid::now_v7().to_string();
        let now = timestamp(&Utc::now());

        let values = vec![
            Value::Text(id.clone()),
            Value::Text(tool.name.clone()),
            Value::Text(tool.description.clone()),
            Value::Text(tool.url.clone()),
            Value::Text(tool.source.as_str().to_string()),
            Value::Text(tool.summary.clone()),
            Value::Text(to_json(&tool.use_cases)?),
            Value::Text(tool.category.clone()),
            Value::Text(tool.pricing.as_str().to_string()),
            Value::Integer(i64::from(tool.hype_score)),
            opt_int(tool.stars),
            opt_int(tool.today_stars),
            opt_int(tool.likes),
            opt_int(tool.downloads),
            opt_int(tool.upvotes),
            Value::Text(to_json(&tool.tags)?),
            opt_text(tool.pipeline_tag.as_deref()),
            opt_text(tool.sdk.as_deref()),
            Value::Text(timestamp(&tool.discovered_date)),
            Value::Text(now.clone()),
            Value::Text(now),
        ];

        self.conn
            .execute(
                &format!(
                    "INSERT INTO ai_tools ({TOOL_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                             ?16, ?17, ?18, ?19, ?20, ?21)"
                ),
                Params::Positional(values),
            )
            .await
            .map_err(db_err)?;

        tracing::debug!(%id, name = %tool.name, url = %tool.url, "tool inserted");

        self.get_tool(&id)
            .await?
            .ok_or_else(|| TrackerError::Storage(format!("inserted tool {id} not found")))
    }

    async fn update(&self, id: &str, update: &ToolUpdate) -> Result<PersistedTool> {
        self.check_writable()?;

        let mut sets = vec!["updated_at = ?1".to_string()];
        let mut values = vec![Value::Text(timestamp(&update.updated_at))];
        let mut push = |column: &str, value: Value| {
            values.push(value);
            sets.push(format!("{column} = ?{}", values.len()));
        };

        if let Some(description) = &update.description {
            push("description", Value::Text(description.clone()));
        }
        if let Some(score) = update.hype_score {
            push("hype_score", Value::Integer(i64::from(score)));
        }
        if let Some(summary) = &update.summary {
            push("summary", Value::Text(summary.clone()));
        }
        if let Some(use_cases) = &update.use_cases {
            push("use_cases_json", Value::Text(to_json(use_cases)?));
        }
        if let Some(category) = &update.category {
            push("category", Value::Text(category.clone()));
        }
        if let Some(pricing) = update.pricing {
            push("pricing", Value::Text(pricing.as_str().to_string()));
        }

        values.push(Value::Text(id.to_string()));
        let sql = format!(
            "UPDATE ai_tools SET {} WHERE id = ?{}",
            sets.join(", "),
            values.len()
        );

        let changed = self
            .conn
            .execute(&sql, Params::Positional(values))
            .await
            .map_err(db_err)?;

        if changed == 0 {
            return Err(TrackerError::Storage(format!("tool {id} not found")));
        }

        self.get_tool(id)
            .await?
            .ok_or_else(|| TrackerError::Storage(format!("tool {id} not found")))
    }

    async fn list(
        &self,
        filter: &ToolFilter,
        order: ToolOrder,
        limit: u32,
    ) -> Result<Vec<PersistedTool>> {
        let mut sql = format!("SELECT {TOOL_COLUMNS} FROM ai_tools WHERE 1 = 1");
        let mut values: Vec<Value> = Vec::new();
        let mut push = |clause: &str, value: Value| {
            values.push(value);
            sql.push_str(&format!(" AND {clause} ?{}", values.len()));
        };

        if let Some(category) = &filter.category {
            push("category =", Value::Text(category.clone()));
        }
        if let Some(pricing) = filter.pricing {
            push("pricing =", Value::Text(pricing.as_str().to_string()));
        }
        if let Some(source) = filter.source {
            push("source =", Value::Text(source.as_str().to_string()));
        }
        if let Some(since) = &filter.discovered_since {
            push("discovered_date >=", Value::Text(timestamp(since)));
        }

        sql.push_str(order.sql());
        values.push(Value::Integer(i64::from(limit)));
        sql.push_str(&format!(" LIMIT ?{}", values.len()));

        let mut rows = self
            .conn
            .query(&sql, Params::Positional(values))
            .await
            .map_err(db_err)?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_tool(&row)?);
        }
        Ok(results)
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

fn db_err(e: libsql::Error) -> TrackerError {
    TrackerError::Storage(e.to_string())
}

/// Fixed-width UTC timestamp so stored dates compare lexicographically.
fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TrackerError::Storage(format!("invalid date '{s}': {e}")))
}

fn to_json(list: &[String]) -> Result<String> {
    serde_json::to_string(list).map_err(|e| TrackerError::Storage(e.to_string()))
}

fn from_json(s: &str) -> Result<Vec<String>> {
    serde_json::from_str(s).map_err(|e| TrackerError::Storage(format!("invalid list column: {e}")))
}

fn opt_int(v: Option<u64>) -> Value {
    match v {
        Some(n) => Value::Integer(n as i64),
        None => Value::Null,
    }
}

fn opt_text(v: Option<&str>) -> Value {
    match v {
        Some(s) => Value::Text(s.to_string()),
        None => Value::Null,
    }
}

fn opt_u64(row: &libsql::Row, idx: i32) -> Option<u64> {
    row.get::<i64>(idx).ok().map(|v| v.max(0) as u64)
}

/// Convert a database row to a [`PersistedTool`].
fn row_to_tool(row: &libsql::Row) -> Result<PersistedTool> {
    let text = |idx: i32| row.get::<String>(idx).map_err(db_err);

    let source: SourceTag = text(4)?
        .parse()
        .map_err(|e: TrackerError| TrackerError::Storage(e.to_string()))?;
    let pricing = match row.get::<String>(8).ok() {
        Some(p) => Some(
            p.parse::<Pricing>()
                .map_err(|e| TrackerError::Storage(e.to_string()))?,
        ),
        None => None,
    };

    Ok(PersistedTool {
        id: text(0)?,
        name: text(1)?,
        description: text(2)?,
        url: text(3)?,
        source,
        summary: row.get::<String>(5).ok(),
        use_cases: from_json(&text(6)?)?,
        category: row.get::<String>(7).ok(),
        pricing,
        hype_score: row.get::<i64>(9).ok().map(|v| v.clamp(0, 100) as u8),
        stars: opt_u64(row, 10),
        today_stars: opt_u64(row, 11),
        likes: opt_u64(row, 12),
        downloads: opt_u64(row, 13),
        upvotes: opt_u64(row, 14),
        tags: from_json(&text(15)?)?,
        pipeline_tag: row.get::<String>(16).ok(),
        sdk: row.get::<String>(17).ok(),
        discovered_date: parse_timestamp(&text(18)?)?,
        created_at: parse_timestamp(&text(19)?)?,
        updated_at: parse_timestamp(&text(20)?)?,
    })
}
