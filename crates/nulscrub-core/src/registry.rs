//! Schema registry
//!
//! Process-wide memoization of [`Schema`]s keyed by concrete `TypeId`.
//! The first walk to reach a type builds its schema under the shard write
//! lock, so concurrent walks racing on the same type still run the builder
//! exactly once; every later lookup is a shared-lock read returning the
//! same `Arc`.
//!
//! Keys come from upcasting `&dyn Scrub` to `&dyn Any` before calling
//! `type_id`, which resolves to the concrete erased type rather than the
//! trait object itself.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::schema::Schema;
use crate::Scrub;

static REGISTRY: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::default);

#[derive(Default)]
struct TypeRegistry {
    schemas: DashMap<TypeId, Arc<Schema>>,
}

impl TypeRegistry {
    fn schema_of(&self, node: &dyn Scrub) -> Arc<Schema> {
        let any: &dyn Any = node;
        let key = any.type_id();
        if let Some(found) = self.schemas.get(&key) {
            return Arc::clone(found.value());
        }
        // Builder runs under the shard lock: at most one effective write
        // per key. Schema construction must not start another walk.
        self.schemas
            .entry(key)
            .or_insert_with(|| Arc::new(node.schema()))
            .value()
            .clone()
    }
}

/// Look up (building on first use) the schema for `node`'s concrete type.
pub(crate) fn schema_of(node: &dyn Scrub) -> Arc<Schema> {
    REGISTRY.schema_of(node)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    use super::*;

    #[test]
    fn test_schema_built_once_across_threads() {
        static BUILD_CALLS: AtomicUsize = AtomicUsize::new(0);

        struct Gauge {
            mark: char,
        }

        impl Scrub for Gauge {
            fn schema(&self) -> Schema {
                BUILD_CALLS.fetch_add(1, Ordering::SeqCst);
                Schema::branch("Gauge").char_field("mark", |p: &mut Self| &mut p.mark)
            }
        }

        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let gauge = Gauge { mark: 'g' };
                    barrier.wait();
                    schema_of(&gauge)
                })
            })
            .collect();

        let schemas: Vec<Arc<Schema>> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(BUILD_CALLS.load(Ordering::SeqCst), 1);
        for schema in &schemas[1..] {
            assert!(Arc::ptr_eq(&schemas[0], schema));
        }
        assert_eq!(schemas[0].type_name(), "Gauge");
    }

    #[test]
    fn test_repeat_lookups_share_one_schema() {
        struct Stamp {
            mark: char,
        }

        impl Scrub for Stamp {
            fn schema(&self) -> Schema {
                Schema::branch("Stamp").char_field("mark", |s: &mut Self| &mut s.mark)
            }
        }

        let first = Stamp { mark: 'a' };
        let second = Stamp { mark: 'b' };
        let one = schema_of(&first);
        let two = schema_of(&second);
        assert!(Arc::ptr_eq(&one, &two));
    }

    #[test]
    fn test_keys_are_concrete_types_not_the_trait_object() {
        struct Left;
        struct Right;

        impl Scrub for Left {
            fn schema(&self) -> Schema {
                Schema::leaf("Left")
            }
        }
        impl Scrub for Right {
            fn schema(&self) -> Schema {
                Schema::leaf("Right")
            }
        }

        let left: &dyn Scrub = &Left;
        let right: &dyn Scrub = &Right;
        assert_eq!(schema_of(left).type_name(), "Left");
        assert_eq!(schema_of(right).type_name(), "Right");
    }
}
