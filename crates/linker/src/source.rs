use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::LinkError;

/// Somewhere the linker can fetch module sources by name.
///
/// `Ok(None)` means the module does not exist; the linker turns that into
/// [`LinkError::UnknownModule`] with the importing module attached.
pub trait ModuleSource {
    fn load(&self, module: &str) -> Result<Option<String>, LinkError>;
}

impl<T: ModuleSource + ?Sized> ModuleSource for &T {
    fn load(&self, module: &str) -> Result<Option<String>, LinkError> {
        (**self).load(module)
    }
}

/// Modules stored as `<root>/<a>/<b>.wgsl` for a module named `a::b`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn module_path(&self, module: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in module.split("::") {
            path.push(segment);
        }
        path.set_extension("wgsl");
        path
    }
}

impl ModuleSource for DirectorySource {
    fn load(&self, module: &str) -> Result<Option<String>, LinkError> {
        let path = self.module_path(module);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LinkError::Unreadable {
                module: module.to_string(),
                path,
                source,
            }),
        }
    }
}

/// In-memory modules, used for the embedded demo shaders and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    modules: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.modules.insert(name.into(), source.into());
    }
}

impl ModuleSource for MemorySource {
    fn load(&self, module: &str) -> Result<Option<String>, LinkError> {
        Ok(self.modules.get(module).cloned())
    }
}
