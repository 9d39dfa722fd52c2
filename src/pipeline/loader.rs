use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use super::types::{DocFormat, Document};

/// Loads every `.txt` and `.md` file directly under `data_dir`, in
/// sorted file-name order.
///
/// A file that fails to read is skipped and logged; a missing
/// directory or an empty one yields an empty Vec, which downstream
/// components treat as the "no documents" state rather than an error.
pub fn load_documents(data_dir: &Path) -> Vec<Document> {
    let mut documents = Vec::new();

    if !data_dir.is_dir() {
        tracing::warn!("Data directory {} not found", data_dir.display());
        return documents;
    }

    for entry in WalkDir::new(data_dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }

        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some("txt") => DocFormat::Text,
            Some("md") => DocFormat::Markdown,
            _ => continue,
        };

        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        match fs::read_to_string(path) {
            Ok(content) => {
                documents.push(Document {
                    name,
                    path: path.to_path_buf(),
                    content,
                    format,
                });
            }
            Err(err) => {
                tracing::warn!("Error loading {}: {}", path.display(), err);
            }
        }
    }

    tracing::info!(
        "Loaded {} documents from {}",
        documents.len(),
        data_dir.display()
    );
    documents
}
