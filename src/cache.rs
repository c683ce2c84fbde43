//! Process-wide cache of generated per-class accessors.
//!
//! Keyed by `(class, annotation kind)`. An entry is computed at most once:
//! the vacant entry keeps its shard locked while the generator runs, so
//! concurrent callers for the same key wait and then read the stored value.
//! Failures are handed back to the caller and never stored.
use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use serde::Serialize;
use tracing::trace;

use crate::analysis::Direction;
use crate::field::AnnotationKind;
use crate::ty::TypeName;

/// One field's emitted code for one direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldStatement {
    pub field: String,
    pub key: String,
    pub code: String,
}

/// Generated save and restore bodies for one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedAccessor {
    pub class: TypeName,
    pub kind: AnnotationKind,
    pub save: Vec<FieldStatement>,
    pub restore: Vec<FieldStatement>,
}

impl GeneratedAccessor {
    pub fn new(class: TypeName, kind: AnnotationKind) -> Self {
        Self { class, kind, save: Vec::new(), restore: Vec::new() }
    }

    pub fn push(&mut self, direction: Direction, statement: FieldStatement) {
        match direction {
            Direction::Save => self.save.push(statement),
            Direction::Restore => self.restore.push(statement),
        }
    }

    pub fn statements(&self, direction: Direction) -> &[FieldStatement] {
        match direction {
            Direction::Save => &self.save,
            Direction::Restore => &self.restore,
        }
    }

    /// Plain-text listing: a header line, then one indented block per direction.
    pub fn render(&self) -> String {
        let mut lines = vec![format!("// {} ({})", self.class, self.kind)];
        for direction in [Direction::Save, Direction::Restore] {
            lines.push(format!("{direction} {{"));
            lines.extend(
                self.statements(direction)
                    .iter()
                    .flat_map(|statement| statement.code.lines())
                    .map(|line| format!("    {line}")),
            );
            lines.push("}".to_string());
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

// ------------------------------- Cache ------------------------------------ //

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub class: TypeName,
    pub kind: AnnotationKind,
}

#[derive(Debug, Default)]
pub struct AccessorCache {
    entries: DashMap<CacheKey, Arc<GeneratedAccessor>>,
}

impl AccessorCache {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, class: &TypeName, kind: AnnotationKind) -> Option<Arc<GeneratedAccessor>> {
        let key = CacheKey { class: class.clone(), kind };
        self.entries.get(&key).map(|entry| entry.value().clone())
    }

    /// Returns the cached accessor, computing it with `generate` on a miss.
    pub fn get_or_try_insert_with<E>(
        &self,
        class: &TypeName,
        kind: AnnotationKind,
        generate: impl FnOnce() -> Result<GeneratedAccessor, E>,
    ) -> Result<Arc<GeneratedAccessor>, E> {
        match self.entries.entry(CacheKey { class: class.clone(), kind }) {
            Entry::Occupied(entry) => {
                trace!(%class, %kind, "accessor cache hit");
                Ok(entry.get().clone())
            }
            Entry::Vacant(entry) => {
                let accessor = Arc::new(generate()?);
                entry.insert(accessor.clone());
                Ok(accessor)
            }
        }
    }

    pub fn invalidate(&self, class: &TypeName, kind: AnnotationKind) -> bool {
        self.entries.remove(&CacheKey { class: class.clone(), kind }).is_some()
    }

    /// Drops every kind cached for `class`.
    pub fn invalidate_class(&self, class: &TypeName) {
        self.entries.retain(|key, _| &key.class != class);
    }

    pub fn clear(&self) { self.entries.clear() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    fn accessor(class: &TypeName) -> GeneratedAccessor {
        let mut out = GeneratedAccessor::new(class.clone(), AnnotationKind::Retained);
        out.push(Direction::Save, FieldStatement { field: "a".into(), key: "a".into(), code: "store.putInt(\"a\", source.a);".into() });
        out.push(Direction::Restore, FieldStatement { field: "a".into(), key: "a".into(), code: "source.a = store.getInt(\"a\");".into() });
        out
    }

    #[test]
    fn computes_once_per_key() {
        let cache = AccessorCache::new();
        let class = TypeName::from("com.example.A");
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let got = cache
                .get_or_try_insert_with(&class, AnnotationKind::Retained, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(accessor(&class))
                })
                .unwrap();
            assert_eq!(got.class, class);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.get(&class, AnnotationKind::Argument).is_none());
    }

    #[test]
    fn racing_callers_share_one_computation() {
        let cache = AccessorCache::new();
        let class = TypeName::from("com.example.A");
        let calls = AtomicUsize::new(0);
        let start = Barrier::new(16);

        let results: Vec<Arc<GeneratedAccessor>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    s.spawn(|| {
                        start.wait();
                        cache
                            .get_or_try_insert_with(&class, AnnotationKind::Retained, || {
                                calls.fetch_add(1, Ordering::SeqCst);
                                std::thread::sleep(Duration::from_millis(20));
                                Ok::<_, ()>(accessor(&class))
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = AccessorCache::new();
        let class = TypeName::from("com.example.A");
        let err = cache.get_or_try_insert_with(&class, AnnotationKind::Retained, || Err("boom"));
        assert_eq!(err.unwrap_err(), "boom");
        assert!(cache.is_empty());
        assert!(cache.get_or_try_insert_with(&class, AnnotationKind::Retained, || Ok::<_, &str>(accessor(&class))).is_ok());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidation() {
        let cache = AccessorCache::new();
        let a = TypeName::from("com.example.A");
        let b = TypeName::from("com.example.B");
        for (class, kind) in [(&a, AnnotationKind::Retained), (&a, AnnotationKind::Argument), (&b, AnnotationKind::Retained)] {
            cache.get_or_try_insert_with(class, kind, || Ok::<_, ()>(accessor(class))).unwrap();
        }
        assert!(cache.invalidate(&b, AnnotationKind::Retained));
        assert!(!cache.invalidate(&b, AnnotationKind::Retained));
        cache.invalidate_class(&a);
        assert!(cache.is_empty());
    }

    #[test]
    fn render_indents_multi_line_statements() {
        let mut out = accessor(&TypeName::from("com.example.A"));
        out.push(Direction::Restore, FieldStatement { field: "b".into(), key: "b".into(), code: "// b\nsource.b = null;".into() });
        assert_eq!(
            out.render(),
            "// com.example.A (retained)\nsave {\n    store.putInt(\"a\", source.a);\n}\nrestore {\n    source.a = store.getInt(\"a\");\n    // b\n    source.b = null;\n}\n"
        );
    }
}
