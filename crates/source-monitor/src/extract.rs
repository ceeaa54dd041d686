//! Rust implementation of `cdc_core::extractor::PublicApiExtractor`
//! (§4.3 step 4, §9's "AST extraction is deliberately restricted to one
//! language in v1"). Walks the parsed AST for top-level public items and
//! public inherent-impl methods; names starting with `_` are excluded.

use std::fs;
use std::path::Path;

use syn::visit::{self, Visit};
use syn::{ImplItem, Item, Visibility};

use cdc_core::extractor::{ExtractError, PublicApiExtractor, Signature, SymbolKind};

pub struct RustExtractor;

impl PublicApiExtractor for RustExtractor {
    fn supports(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some("rs")
    }

    fn extract(&self, path: &Path) -> Result<Vec<Signature>, ExtractError> {
        let text = fs::read_to_string(path).map_err(|source| ExtractError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file = syn::parse_file(&text).map_err(|e| ExtractError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut collector = SignatureCollector::default();
        collector.visit_file(&file);
        Ok(collector.signatures)
    }
}

#[derive(Default)]
struct SignatureCollector {
    signatures: Vec<Signature>,
}

fn is_public(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_))
}

fn keep(name: &str) -> bool {
    !name.starts_with('_')
}

impl<'ast> Visit<'ast> for SignatureCollector {
    fn visit_item(&mut self, item: &'ast Item) {
        match item {
            Item::Fn(f) if is_public(&f.vis) && keep(&f.sig.ident.to_string()) => {
                self.signatures.push(Signature {
                    kind: SymbolKind::Function,
                    name: f.sig.ident.to_string(),
                    line: format!("fn {}(..)", f.sig.ident),
                });
            }
            Item::Struct(s) if is_public(&s.vis) && keep(&s.ident.to_string()) => {
                self.signatures.push(Signature {
                    kind: SymbolKind::Type,
                    name: s.ident.to_string(),
                    line: format!("struct {}", s.ident),
                });
            }
            Item::Enum(e) if is_public(&e.vis) && keep(&e.ident.to_string()) => {
                self.signatures.push(Signature {
                    kind: SymbolKind::Type,
                    name: e.ident.to_string(),
                    line: format!("enum {}", e.ident),
                });
            }
            Item::Trait(t) if is_public(&t.vis) && keep(&t.ident.to_string()) => {
                self.signatures.push(Signature {
                    kind: SymbolKind::Type,
                    name: t.ident.to_string(),
                    line: format!("trait {}", t.ident),
                });
            }
            _ => {}
        }
        visit::visit_item(self, item);
    }

    fn visit_impl_item(&mut self, item: &'ast ImplItem) {
        if let ImplItem::Fn(m) = item {
            if is_public(&m.vis) && keep(&m.sig.ident.to_string()) {
                self.signatures.push(Signature {
                    kind: SymbolKind::Method,
                    name: m.sig.ident.to_string(),
                    line: format!("fn {}(..)", m.sig.ident),
                });
            }
        }
        visit::visit_impl_item(self, item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_source(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn extracts_public_function_and_struct() {
        let (_dir, path) = write_source(
            r#"
            pub fn do_thing() {}
            fn hidden() {}
            pub struct Widget;
            "#,
        );
        let sigs = RustExtractor.extract(&path).unwrap();
        let names: Vec<_> = sigs.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"do_thing"));
        assert!(names.contains(&"Widget"));
        assert!(!names.contains(&"hidden"));
    }

    #[test]
    fn excludes_underscore_prefixed_names() {
        let (_dir, path) = write_source("pub fn _internal_helper() {}");
        let sigs = RustExtractor.extract(&path).unwrap();
        assert!(sigs.is_empty());
    }

    #[test]
    fn extracts_public_impl_methods() {
        let (_dir, path) = write_source(
            r#"
            pub struct Widget;
            impl Widget {
                pub fn render(&self) {}
                fn internal(&self) {}
            }
            "#,
        );
        let sigs = RustExtractor.extract(&path).unwrap();
        let methods: Vec<_> = sigs
            .iter()
            .filter(|s| s.kind == SymbolKind::Method)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(methods, vec!["render"]);
    }

    #[test]
    fn supports_checks_rs_extension() {
        assert!(RustExtractor.supports(Path::new("a/b.rs")));
        assert!(!RustExtractor.supports(Path::new("a/b.py")));
    }
}
