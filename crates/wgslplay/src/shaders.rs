use anyhow::{Context, Result};
use linker::{DirectorySource, LinkedShader, Linker, MemorySource};

use crate::config::ShaderOrigin;

const MAIN_WGSL: &str = include_str!("../shaders/main.wgsl");
const UTIL_WGSL: &str = include_str!("../shaders/util.wgsl");

/// The demo modules compiled into the binary.
pub fn builtin_source() -> MemorySource {
    MemorySource::new()
        .with_module("main", MAIN_WGSL)
        .with_module("util", UTIL_WGSL)
}

pub fn load(origin: &ShaderOrigin, root: &str) -> Result<LinkedShader> {
    let linked = match origin {
        ShaderOrigin::Builtin => Linker::new(builtin_source())
            .link(root)
            .with_context(|| format!("failed to link built-in shader '{root}'"))?,
        ShaderOrigin::Directory(dir) => Linker::new(DirectorySource::new(dir))
            .link(root)
            .with_context(|| {
                format!("failed to link shader '{root}' from {}", dir.display())
            })?,
    };
    tracing::info!(
        root,
        modules = ?linked.order,
        "linked shader modules"
    );
    Ok(linked)
}
