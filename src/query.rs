//! Ad-hoc querying with results grouped by source file.

use anyhow::Result;
use serde_json::Value;

use crate::models::QueryHit;
use crate::store::VectorStore;

/// Run one query and print grouped results to stdout.
pub async fn run_query(store: &dyn VectorStore, query: &str, n_results: usize) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let hits = store.query(query, n_results).await?;
    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    print!("{}", format_grouped(&hits));
    Ok(())
}

/// Render hits grouped by source file: a banner introduces each file the
/// first time it appears, further passages from the same file follow under
/// a `...` marker.
pub fn format_grouped(hits: &[QueryHit]) -> String {
    let mut out = String::new();
    let mut current_file = String::new();

    for hit in hits {
        let file_name = hit
            .metadata
            .get("file_name")
            .and_then(Value::as_str)
            .unwrap_or("unknown");

        if file_name != current_file {
            current_file = file_name.to_string();
            let bar = "=".repeat(file_name.len());
            out.push_str(&bar);
            out.push('\n');
            out.push_str(file_name);
            out.push('\n');
            out.push_str(&bar);
            out.push('\n');
        } else {
            out.push_str("...\n");
        }
        out.push_str(&hit.document);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn hit(file_name: &str, document: &str) -> QueryHit {
        let mut metadata = Map::new();
        metadata.insert(
            "file_name".to_string(),
            Value::String(file_name.to_string()),
        );
        QueryHit {
            document: document.to_string(),
            metadata,
        }
    }

    #[test]
    fn banner_appears_once_per_file() {
        let hits = vec![
            hit("a.md", "first passage"),
            hit("a.md", "second passage"),
            hit("b.md", "other passage"),
        ];
        let out = format_grouped(&hits);
        assert_eq!(out.matches("a.md").count(), 1);
        assert_eq!(out.matches("b.md").count(), 1);
        assert_eq!(out.matches("...").count(), 1);
        assert!(out.contains("====\na.md\n===="));
        assert!(out.contains("first passage\n...\nsecond passage"));
    }

    #[test]
    fn missing_file_name_falls_back() {
        let hits = vec![QueryHit {
            document: "loose passage".to_string(),
            metadata: Map::new(),
        }];
        let out = format_grouped(&hits);
        assert!(out.contains("unknown"));
        assert!(out.contains("loose passage"));
    }
}
