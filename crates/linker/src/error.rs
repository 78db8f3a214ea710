use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("module '{name}' not found (imported from {importer})")]
    UnknownModule { name: String, importer: String },

    #[error("module '{module}' has no item '{item}' (imported from {importer})")]
    UnknownItem {
        module: String,
        item: String,
        importer: String,
    },

    #[error("import cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("failed to read module '{module}' from {path}")]
    Unreadable {
        module: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed import in module '{module}' at line {line}: {text}")]
    MalformedImport {
        module: String,
        line: usize,
        text: String,
    },
}
