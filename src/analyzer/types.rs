//! Typed summaries returned across the analyzer boundary.

use serde::{Deserialize, Serialize};

/// A database table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
}

/// A column of a database table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub is_nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// A database index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
}

/// Coarse database health numbers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub table_count: usize,
    pub index_count: usize,
    pub connected: bool,
}

/// An API route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub method: String,
    pub path: String,
    pub handler: String,
}

/// A request handler function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerInfo {
    pub name: String,
    pub file: String,
}

/// A backend service definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub file: String,
    pub methods: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
}

/// A data model (struct/record) discovered in the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataModel {
    pub name: String,
    pub file: String,
    pub fields: Vec<Field>,
}

/// One field of a data model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

/// An interface/trait and its methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceDefinition {
    pub name: String,
    pub file: String,
    pub methods: Vec<String>,
}

/// A type implementing an interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Implementation {
    pub type_name: String,
    pub interface_name: String,
    pub file: String,
}

/// A function and its outgoing calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallGraphNode {
    pub function_name: String,
    pub file: String,
    pub calls: Vec<String>,
}

/// A field of the application configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sub_fields: Vec<ConfigField>,
}

/// A middleware registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareInfo {
    pub name: String,
    pub file: String,
    pub line: usize,
}

/// An environment variable referenced by the code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub file: String,
    pub line: usize,
}

/// One code search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub file: String,
    pub line: usize,
    pub content: String,
}

/// A node of the package/module tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<PackageNode>,
}

/// A project dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
}

/// One scripted or client-requested UI action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiAction {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Timeout in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}
