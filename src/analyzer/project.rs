//! Best-effort filesystem analyzer.
//!
//! The full schema/route/model extractors belong to the attached
//! backend tooling; this shipped implementation answers what can be
//! read directly from the project tree (package layout, manifest
//! dependencies, text search, env-var references) and reports empty
//! summaries for the rest.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::types::*;
use super::CodeAnalyzer;

const SOURCE_EXTENSIONS: &[&str] = &["rs", "go", "ts", "tsx", "js", "jsx", "py", "sql", "toml"];
const SKIP_DIRS: &[&str] = &["target", "node_modules", ".git", "dist", "vendor"];
const MAX_WALK_DEPTH: usize = 5;
const MAX_SEARCH_HITS: usize = 50;
const MAX_FILE_BYTES: u64 = 512 * 1024;

/// Filesystem-backed [`CodeAnalyzer`].
pub struct ProjectAnalyzer {
    root: PathBuf,
}

impl ProjectAnalyzer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn walk_source_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        collect_files(&self.root, 0, &mut files);
        files
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

fn collect_files(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > MAX_WALK_DEPTH {
        return;
    }
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if path.is_dir() {
            if !SKIP_DIRS.contains(&name.as_str()) && !name.starts_with('.') {
                collect_files(&path, depth + 1, out);
            }
        } else if is_source_file(&path) {
            out.push(path);
        }
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SOURCE_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

fn read_small_file(path: &Path) -> Option<String> {
    let meta = std::fs::metadata(path).ok()?;
    if meta.len() > MAX_FILE_BYTES {
        return None;
    }
    std::fs::read_to_string(path).ok()
}

/// Pull the quoted name following `pattern` out of `line`.
fn quoted_after<'a>(line: &'a str, pattern: &str) -> Option<&'a str> {
    let start = line.find(pattern)? + pattern.len();
    let rest = &line[start..];
    let open = rest.find('"')? + 1;
    let close = rest[open..].find('"')? + open;
    Some(&rest[open..close])
}

fn build_tree(dir: &Path, root: &Path, depth: usize) -> Vec<PackageNode> {
    if depth > MAX_WALK_DEPTH {
        return Vec::new();
    }
    let mut nodes = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return nodes,
    };
    let mut sorted: Vec<_> = entries.flatten().collect();
    sorted.sort_by_key(|e| e.file_name());
    for entry in sorted {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        let rel = path.strip_prefix(root).unwrap_or(&path).display().to_string();
        if path.is_dir() {
            if SKIP_DIRS.contains(&name.as_str()) || name.starts_with('.') {
                continue;
            }
            nodes.push(PackageNode {
                name,
                path: rel,
                node_type: "directory".to_string(),
                children: build_tree(&path, root, depth + 1),
            });
        } else if is_source_file(&path) {
            nodes.push(PackageNode {
                name,
                path: rel,
                node_type: "file".to_string(),
                children: Vec::new(),
            });
        }
    }
    nodes
}

/// Naive line parse of a Cargo.toml dependency table.
fn cargo_dependencies(manifest: &str) -> Vec<Dependency> {
    let mut deps = Vec::new();
    let mut in_deps = false;
    for line in manifest.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
            continue;
        }
        if !in_deps || line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((name, spec)) = line.split_once('=') {
            let version = quoted_after(spec, "version")
                .or_else(|| {
                    let spec = spec.trim();
                    spec.starts_with('"').then(|| spec.trim_matches('"'))
                })
                .unwrap_or("*");
            deps.push(Dependency {
                name: name.trim().to_string(),
                version: version.to_string(),
            });
        }
    }
    deps
}

fn gomod_dependencies(gomod: &str) -> Vec<Dependency> {
    let mut deps = Vec::new();
    let mut in_require = false;
    for line in gomod.lines() {
        let line = line.trim();
        if line.starts_with("require (") {
            in_require = true;
            continue;
        }
        if in_require && line == ")" {
            in_require = false;
            continue;
        }
        let candidate = line.strip_prefix("require ").unwrap_or(line);
        if (in_require || line.starts_with("require ")) || candidate != line {
            let mut parts = candidate.split_whitespace();
            if let (Some(name), Some(version)) = (parts.next(), parts.next()) {
                deps.push(Dependency {
                    name: name.to_string(),
                    version: version.to_string(),
                });
            }
        }
    }
    deps
}

#[async_trait]
impl CodeAnalyzer for ProjectAnalyzer {
    async fn database_schema(&self) -> Vec<Table> {
        Vec::new()
    }

    async fn database_stats(&self) -> DatabaseStats {
        DatabaseStats::default()
    }

    async fn api_routes(&self) -> Vec<Route> {
        Vec::new()
    }

    async fn data_models(&self) -> Vec<DataModel> {
        Vec::new()
    }

    async fn request_handlers(&self) -> Vec<HandlerInfo> {
        Vec::new()
    }

    async fn services(&self) -> Vec<Service> {
        Vec::new()
    }

    async fn interfaces(&self) -> Vec<InterfaceDefinition> {
        Vec::new()
    }

    async fn implementations_of(&self, _interface: &str) -> Vec<Implementation> {
        Vec::new()
    }

    async fn call_graph(&self, _root: &str) -> Vec<CallGraphNode> {
        Vec::new()
    }

    async fn config_fields(&self) -> Vec<ConfigField> {
        Vec::new()
    }

    async fn middleware_list(&self) -> Vec<MiddlewareInfo> {
        Vec::new()
    }

    async fn env_vars(&self) -> Vec<EnvVar> {
        let mut vars = Vec::new();
        for path in self.walk_source_files() {
            let Some(content) = read_small_file(&path) else {
                continue;
            };
            for (idx, line) in content.lines().enumerate() {
                let name = quoted_after(line, "env::var(")
                    .or_else(|| quoted_after(line, "os.Getenv("))
                    .or_else(|| quoted_after(line, "os.environ["));
                if let Some(name) = name {
                    vars.push(EnvVar {
                        name: name.to_string(),
                        file: self.relative(&path),
                        line: idx + 1,
                    });
                }
            }
        }
        vars
    }

    async fn search(&self, query: &str) -> Vec<SearchResult> {
        let mut hits = Vec::new();
        if query.is_empty() {
            return hits;
        }
        for path in self.walk_source_files() {
            let Some(content) = read_small_file(&path) else {
                continue;
            };
            for (idx, line) in content.lines().enumerate() {
                if line.contains(query) {
                    hits.push(SearchResult {
                        file: self.relative(&path),
                        line: idx + 1,
                        content: line.trim().to_string(),
                    });
                    if hits.len() >= MAX_SEARCH_HITS {
                        return hits;
                    }
                }
            }
        }
        hits
    }

    async fn package_structure(&self) -> Vec<PackageNode> {
        build_tree(&self.root, &self.root, 0)
    }

    async fn dependencies(&self) -> Vec<Dependency> {
        let cargo = self.root.join("Cargo.toml");
        if let Some(manifest) = read_small_file(&cargo) {
            return cargo_dependencies(&manifest);
        }
        let gomod = self.root.join("go.mod");
        if let Some(manifest) = read_small_file(&gomod) {
            return gomod_dependencies(&manifest);
        }
        Vec::new()
    }
}
