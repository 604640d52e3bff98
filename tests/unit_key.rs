/// Unit tests for Key and CacheKey

use ferrous_resolver::{key_of_trait, key_of_type, CacheKey, Category, Key};
use std::any::TypeId;
use std::collections::HashMap;

trait Logger {}

#[test]
fn test_key_display_name_type() {
    let key = Key::Type(TypeId::of::<String>(), "alloc::string::String");
    assert_eq!(key.display_name(), "alloc::string::String");
    assert_eq!(key.discriminator(), None);
}

#[test]
fn test_key_display_name_named() {
    let key = Key::TypeNamed(TypeId::of::<u32>(), "u32", "database_port");
    assert_eq!(key.display_name(), "u32");
    assert_eq!(key.discriminator(), Some("database_port"));

    let key = key_of_trait::<dyn Logger>().named("console");
    assert!(key.display_name().contains("Logger"));
    assert_eq!(key.discriminator(), Some("console"));
}

#[test]
fn test_key_named_replaces_previous_name() {
    let first = key_of_type::<u32>().named("a");
    let second = first.named("b");
    assert_eq!(second.discriminator(), Some("b"));
    assert_eq!(second, key_of_type::<u32>().named("b"));
    assert_ne!(first, second);
}

#[test]
fn test_key_type_id() {
    assert_eq!(key_of_type::<u64>().type_id(), TypeId::of::<u64>());
    assert_eq!(key_of_trait::<dyn Logger>().type_id(), TypeId::of::<dyn Logger>());
    assert_eq!(key_of_type::<u64>().named("x").type_id(), TypeId::of::<u64>());
}

#[test]
fn test_key_as_map_key() {
    let mut map = HashMap::new();
    map.insert(key_of_type::<u8>(), "plain");
    map.insert(key_of_type::<u8>().named("n"), "named");
    map.insert(key_of_trait::<dyn Logger>(), "trait");

    assert_eq!(map.len(), 3);
    assert_eq!(map[&Key::Type(TypeId::of::<u8>(), "any label")], "plain");
    assert_eq!(map[&key_of_type::<u8>().named("n")], "named");
}

#[test]
fn test_cache_key_scope_and_category() {
    let key = key_of_type::<u8>();
    let unscoped = CacheKey::new(key, Category::Singleton, None);
    let scoped = CacheKey::new(key, Category::Singleton, Some("level"));

    assert_ne!(unscoped, scoped);
    assert_eq!(scoped, CacheKey::new(key, Category::Singleton, Some("level")));
    assert_ne!(unscoped, CacheKey::new(key, Category::Transient, None));
    assert_eq!(scoped.scope.as_deref(), Some("level"));
}
