//! Bulk export: stream a cube table row by row as delimited text.
//!
//! The table is read in fixed-size LIMIT/OFFSET windows with an explicit
//! offset cursor (a plain loop, so arbitrarily large tables cannot grow the
//! call stack). Values are individually quoted with internal quotes doubled;
//! NULL renders as an empty field.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::cube::CubeSchema;
use crate::engine::{AggregationEngine, CubeExecutor};
use crate::error::EngineResult;
use crate::sql::{QueryBuilder, SortDir};

/// Field separator for the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
}

impl Delimiter {
    fn as_char(&self) -> char {
        match self {
            Self::Comma => ',',
            Self::Tab => '\t',
        }
    }
}

impl<E: CubeExecutor> AggregationEngine<E> {
    /// Stream every row of the cube table into `sink`.
    ///
    /// Emits a header line of column names, then one line per row with the
    /// columns in schema order. Returns the number of data rows written.
    pub async fn export(
        &self,
        schema: &CubeSchema,
        delimiter: Delimiter,
        page_size: u64,
        sink: &mut (impl AsyncWrite + Unpin),
    ) -> EngineResult<u64> {
        let sep = delimiter.as_char();
        let columns: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();

        let header: Vec<String> = columns.iter().map(|c| quote_field(c)).collect();
        sink.write_all(join_line(&header, sep).as_bytes()).await?;

        let mut offset = 0u64;
        let mut written = 0u64;
        loop {
            let page = self.fetch_page(schema, &columns, page_size, offset).await?;
            let page_len = page.len() as u64;

            for row in &page {
                let fields: Vec<String> = columns
                    .iter()
                    .map(|name| render_field(row.get(*name)))
                    .collect();
                sink.write_all(join_line(&fields, sep).as_bytes()).await?;
            }
            written += page_len;

            if page_len < page_size {
                break;
            }
            offset += page_size;
        }

        sink.flush().await?;
        debug!(table = %schema.table, rows = written, "export complete");
        Ok(written)
    }

    async fn fetch_page(
        &self,
        schema: &CubeSchema,
        columns: &[&str],
        page_size: u64,
        offset: u64,
    ) -> EngineResult<Vec<crate::shape::Row>> {
        // Order by every column so the window positions are deterministic
        // across pages; cube tables carry no row id.
        let mut builder = QueryBuilder::new(&schema.table).columns(columns);
        for column in columns {
            builder = builder.order(column, SortDir::Asc);
        }
        let query = builder.limit(page_size).offset(offset).compile();
        self.fetch_with_deadline(&query).await
    }
}

/// Render one field: NULL becomes an empty field, everything else is quoted.
fn render_field(value: Option<&serde_json::Value>) -> String {
    use serde_json::Value;
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => quote_field(s),
        Some(other) => quote_field(&other.to_string()),
    }
}

fn quote_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn join_line(fields: &[String], sep: char) -> String {
    let mut line = fields.join(&sep.to_string());
    line.push('\n');
    line
}
