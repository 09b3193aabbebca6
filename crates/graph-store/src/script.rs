//! Multi-statement scripts

use crate::client::GraphStore;
use crate::record::Params;
use crate::QueryError;
use tracing::{debug, info};

/// Split a script into statements on `;`.
///
/// Blank lines and lines starting with `//` are dropped; a trailing statement
/// without `;` is kept.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in script.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with("//") {
            continue;
        }

        current.push(line.to_string());
        if !line.contains(';') {
            continue;
        }

        let joined = current.join("\n");
        let mut parts: Vec<&str> = joined.split(';').collect();
        let tail = parts.pop().unwrap_or_default();

        statements.extend(
            parts
                .into_iter()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        );

        current = if tail.trim().is_empty() {
            Vec::new()
        } else {
            vec![tail.to_string()]
        };
    }

    let tail = current.join("\n");
    if !tail.trim().is_empty() {
        statements.push(tail.trim().to_string());
    }

    statements
}

/// Execute every statement of `script` in order, stopping at the first error.
///
/// Returns the number of statements executed.
pub async fn run_script<S: GraphStore + ?Sized>(store: &S, script: &str) -> Result<usize, QueryError> {
    let statements = split_statements(script);
    info!("Running graph script with {} statements", statements.len());

    for (i, statement) in statements.iter().enumerate() {
        debug!("Script statement {}: {}", i + 1, statement);
        store.execute(statement, Params::new()).await?;
    }

    Ok(statements.len())
}
