use std::collections::HashMap;
use std::path::Path;

use crate::error::LoadError;

/// One script module: a name, its source text, and the modules it imports.
#[derive(Debug, Clone)]
pub struct ModuleSource {
    pub name: String,
    pub source: String,
    pub imports: Vec<String>,
}

/// The set of modules making up one script context. Names are file stems;
/// the import graph is scanned from the source text at insertion.
#[derive(Default)]
pub struct ModuleSet {
    modules: HashMap<String, ModuleSource>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        let name = name.into();
        let source = source.into();
        let imports = scan_imports(&source);
        self.modules.insert(name.clone(), ModuleSource { name, source, imports });
    }

    /// Loads every `*.rhai` file in a directory, keyed by file stem.
    pub fn from_dir(dir: &Path) -> Result<Self, LoadError> {
        let mut set = Self::new();
        let entries = std::fs::read_dir(dir).map_err(|e| LoadError::Io {
            module: dir.display().to_string(),
            message: e.to_string(),
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| LoadError::Io {
                module: dir.display().to_string(),
                message: e.to_string(),
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("rhai") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let source = std::fs::read_to_string(&path).map_err(|e| LoadError::Io {
                module: stem.to_string(),
                message: e.to_string(),
            })?;
            set.insert(stem, source);
        }
        Ok(set)
    }

    pub fn get(&self, name: &str) -> Option<&ModuleSource> {
        self.modules.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Dependency-first evaluation order for the graph rooted at `entry`.
    /// The entry module comes last; cycles and missing imports are errors.
    pub fn load_order(&self, entry: &str) -> Result<Vec<&ModuleSource>, LoadError> {
        if !self.modules.contains_key(entry) {
            return Err(LoadError::MissingEntry(entry.to_string()));
        }
        let mut order = Vec::new();
        let mut done = HashMap::new();
        let mut path = Vec::new();
        self.visit(entry, &mut done, &mut path, &mut order)?;
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &str,
        done: &mut HashMap<String, bool>,
        path: &mut Vec<String>,
        order: &mut Vec<&'a ModuleSource>,
    ) -> Result<(), LoadError> {
        match done.get(name) {
            Some(true) => return Ok(()),
            Some(false) => {
                let mut cycle = path.clone();
                cycle.push(name.to_string());
                return Err(LoadError::CyclicDependency(cycle));
            }
            None => {}
        }
        done.insert(name.to_string(), false);
        path.push(name.to_string());

        let module = &self.modules[name];
        for import in &module.imports {
            if !self.modules.contains_key(import) {
                return Err(LoadError::MissingImport {
                    module: name.to_string(),
                    import: import.clone(),
                });
            }
            self.visit(import, done, path, order)?;
        }

        path.pop();
        done.insert(name.to_string(), true);
        order.push(module);
        Ok(())
    }
}

/// Finds `import "name"` statements. Only whole-line imports are recognized,
/// matching how the scripts in this project are written.
pub fn scan_imports(source: &str) -> Vec<String> {
    let mut imports = Vec::new();
    for line in source.lines() {
        let trimmed = line.trim_start();
        let Some(rest) = trimmed.strip_prefix("import") else {
            continue;
        };
        if !rest.starts_with([' ', '\t', '"']) {
            continue;
        }
        let mut quoted = rest.split('"');
        if quoted.next().is_some() {
            if let Some(name) = quoted.next() {
                if !name.is_empty() {
                    imports.push(name.to_string());
                }
            }
        }
    }
    imports
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imports_are_scanned_from_source() {
        let source = r#"
            import "util" as util;
            import "commands";
            // import "disabled"
            let x = 1;
        "#;
        assert_eq!(scan_imports(source), vec!["util".to_string(), "commands".to_string()]);
    }

    #[test]
    fn load_order_is_dependency_first() {
        let mut set = ModuleSet::new();
        set.insert("main", r#"import "a"; import "b";"#);
        set.insert("a", r#"import "b";"#);
        set.insert("b", "let x = 1;");
        let order: Vec<_> =
            set.load_order("main").expect("acyclic graph").iter().map(|m| m.name.clone()).collect();
        assert_eq!(order, vec!["b".to_string(), "a".to_string(), "main".to_string()]);
    }

    #[test]
    fn cycles_and_missing_imports_are_errors() {
        let mut set = ModuleSet::new();
        set.insert("main", r#"import "a";"#);
        set.insert("a", r#"import "main";"#);
        assert!(matches!(set.load_order("main"), Err(LoadError::CyclicDependency(_))));

        let mut set = ModuleSet::new();
        set.insert("main", r#"import "ghost";"#);
        assert!(matches!(
            set.load_order("main"),
            Err(LoadError::MissingImport { import, .. }) if import == "ghost"
        ));
        assert!(matches!(set.load_order("absent"), Err(LoadError::MissingEntry(_))));
    }
}
