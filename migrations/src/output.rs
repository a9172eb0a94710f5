//! Rendering an ordered action list as SQL, JSON records or readable lines

use crate::ddl::SchemaAction;
use crate::error::Error;
use crate::traits::QueryType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output projection for a migration plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Statements separated by blank lines
    #[default]
    Sql,
    /// Pretty-printed array of plan records
    Json,
    /// One human-readable line per action
    Ast,
}

impl OutputFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Json => "json",
            Self::Ast => "ast",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sql" => Ok(Self::Sql),
            "json" => Ok(Self::Json),
            "ast" => Ok(Self::Ast),
            other => Err(format!("unknown output format: {other} (expected sql, json or ast)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plan record used by the `json` projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonRecord<'a> {
    pub query_text: &'a str,
    pub object_name: Option<&'a str>,
    pub query_type: QueryType,
    pub dependencies: &'a [String],
    pub query_hash: &'a str,
    pub schema: Option<&'a str>,
}

impl<'a> From<&'a SchemaAction> for JsonRecord<'a> {
    fn from(action: &'a SchemaAction) -> Self {
        Self {
            query_text: &action.command,
            object_name: action.object_name.as_deref(),
            query_type: action.query_type,
            dependencies: &action.dependencies,
            query_hash: &action.content_hash,
            schema: action.schema.as_deref(),
        }
    }
}

/// Each command, joined by a blank line
pub fn to_sql<'a, I>(actions: I) -> String
where
    I: IntoIterator<Item = &'a SchemaAction>,
{
    actions
        .into_iter()
        .map(|action| action.command.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Full records with every action field
pub fn to_records<'a, I>(actions: I) -> Result<Vec<serde_json::Value>, Error>
where
    I: IntoIterator<Item = &'a SchemaAction>,
{
    actions
        .into_iter()
        .map(|action| serde_json::to_value(action).map_err(Error::from))
        .collect()
}

pub fn render<'a, I>(actions: I, format: OutputFormat) -> Result<String, Error>
where
    I: IntoIterator<Item = &'a SchemaAction>,
{
    match format {
        OutputFormat::Sql => Ok(to_sql(actions)),
        OutputFormat::Json => {
            let records: Vec<JsonRecord<'_>> = actions.into_iter().map(JsonRecord::from).collect();
            Ok(serde_json::to_string_pretty(&records)?)
        }
        OutputFormat::Ast => Ok(actions
            .into_iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}
