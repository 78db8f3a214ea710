//! Links WGSL modules that reference each other through `import` directives.
//!
//! WGSL itself has no module system, so shaders are split across files and
//! stitched back together before compilation. Starting at a root module the
//! linker loads every transitively imported module from a [`ModuleSource`],
//! strips the import lines, and concatenates the bodies so that each module
//! appears once and after everything it depends on.
//!
//! ```text
//! import package::util::palette;      // module `util`, item `palette`
//! import noise::simplex::{s2, s3};    // module `noise::simplex`
//! import util;                        // whole module `util`
//! ```

mod error;
mod import;
mod source;

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

pub use error::LinkError;
pub use import::Import;
pub use source::{DirectorySource, MemorySource, ModuleSource};

use import::{declared_items, is_import_line, parse_import};

/// Output of a successful link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedShader {
    /// Original text of every module that took part, keyed by module name.
    pub modules: BTreeMap<String, String>,
    /// Module names in emission order, dependencies first.
    pub order: Vec<String>,
    /// The single WGSL program handed to the compiler.
    pub linked: String,
}

pub struct Linker<S> {
    source: S,
}

impl<S: ModuleSource> Linker<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn link(&self, root: &str) -> Result<LinkedShader, LinkError> {
        let mut walk = Walk::default();
        self.visit(root, "<root>", &mut walk)?;

        let mut linked = String::new();
        for name in &walk.order {
            let body = walk.bodies.get(name).map(String::as_str).unwrap_or_default();
            if !linked.is_empty() {
                linked.push('\n');
            }
            linked.push_str("// module: ");
            linked.push_str(name);
            linked.push('\n');
            linked.push_str(body.trim_matches('\n'));
            linked.push('\n');
        }

        debug!(root, modules = walk.order.len(), bytes = linked.len(), "linked shader");
        Ok(LinkedShader {
            modules: walk.sources,
            order: walk.order,
            linked,
        })
    }

    fn visit(&self, name: &str, importer: &str, walk: &mut Walk) -> Result<(), LinkError> {
        if walk.done.contains(name) {
            return Ok(());
        }
        if let Some(start) = walk.stack.iter().position(|entry| entry == name) {
            let mut chain = walk.stack[start..].to_vec();
            chain.push(name.to_string());
            return Err(LinkError::Cycle(chain));
        }

        let text = self
            .source
            .load(name)?
            .ok_or_else(|| LinkError::UnknownModule {
                name: name.to_string(),
                importer: importer.to_string(),
            })?;

        let mut imports = Vec::new();
        let mut body = String::with_capacity(text.len());
        for (index, line) in text.lines().enumerate() {
            if is_import_line(line) {
                imports.push(parse_import(name, index + 1, line)?);
            } else {
                body.push_str(line);
                body.push('\n');
            }
        }

        walk.stack.push(name.to_string());
        for import in &imports {
            self.visit(&import.module, name, walk)?;
            check_items(import, name, walk)?;
        }
        walk.stack.pop();

        walk.done.insert(name.to_string());
        walk.order.push(name.to_string());
        walk.bodies.insert(name.to_string(), body);
        walk.sources.insert(name.to_string(), text);
        Ok(())
    }
}

/// Every item an import names must be declared by the imported module.
fn check_items(import: &Import, importer: &str, walk: &Walk) -> Result<(), LinkError> {
    if import.items.is_empty() {
        return Ok(());
    }
    let body = walk
        .bodies
        .get(&import.module)
        .map(String::as_str)
        .unwrap_or_default();
    let declared = declared_items(body);
    match import.items.iter().find(|item| !declared.contains(*item)) {
        Some(item) => Err(LinkError::UnknownItem {
            module: import.module.clone(),
            item: item.clone(),
            importer: importer.to_string(),
        }),
        None => Ok(()),
    }
}

#[derive(Default)]
struct Walk {
    stack: Vec<String>,
    done: HashSet<String>,
    order: Vec<String>,
    bodies: BTreeMap<String, String>,
    sources: BTreeMap<String, String>,
}
