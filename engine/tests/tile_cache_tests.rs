//! Tile Cache Tests - LRU Eviction and DEM Mapping
//!
//! Tests for the elevation tile cache: eviction order, touch-on-get,
//! replacement, and the mapping from visible tiles to coarser DEM tiles.

use seabed_terrain_engine::tile::{ElevationTileCache, ElevationTileEntry, TileKey, tile_position_matrix};

fn key(x: u32) -> TileKey {
    TileKey::new(10, x, 400)
}

fn entry(x: u32) -> ElevationTileEntry<u32> {
    ElevationTileEntry::new(key(x), x, 514)
}

fn filled(capacity: usize) -> ElevationTileCache<u32> {
    let mut cache = ElevationTileCache::new(capacity);
    for x in 0..capacity as u32 {
        cache.put(key(x), entry(x));
    }
    cache
}

// ============================================================================
// Eviction Tests
// ============================================================================

#[test]
fn test_overflow_evicts_first_inserted() {
    let capacity = 4;
    let mut cache = filled(capacity);
    cache.put(key(99), entry(99));

    assert_eq!(cache.len(), capacity);
    assert!(!cache.contains(&key(0)));
    for x in 1..capacity as u32 {
        assert!(cache.contains(&key(x)), "key {x} should still be resident");
    }
    assert!(cache.contains(&key(99)));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn test_get_protects_oldest_from_eviction() {
    let mut cache = filled(3);

    // touch the oldest, then insert one new key
    assert!(cache.get(&key(0)).is_some());
    cache.put(key(7), entry(7));

    assert!(cache.contains(&key(0)), "touched key must survive");
    assert!(!cache.contains(&key(1)), "second-oldest must be evicted");
    assert!(cache.contains(&key(2)));
    assert!(cache.contains(&key(7)));
}

#[test]
fn test_put_existing_key_refreshes_recency() {
    let mut cache = filled(3);
    cache.put(key(0), entry(0));
    cache.put(key(5), entry(5));

    assert!(cache.contains(&key(0)));
    assert!(!cache.contains(&key(1)));
}

#[test]
fn test_lru_order_reports_least_recent_first() {
    let mut cache = filled(3);
    cache.get(&key(1));
    let order: Vec<u32> = cache.keys_lru_order().map(|k| k.x).collect();
    assert_eq!(order, vec![0, 2, 1]);
}

#[test]
fn test_contains_does_not_touch() {
    let mut cache = filled(2);
    assert!(cache.contains(&key(0)));
    cache.put(key(9), entry(9));
    assert!(!cache.contains(&key(0)));
}

#[test]
fn test_miss_and_hit_counters() {
    let mut cache = filled(2);
    assert!(cache.get(&key(42)).is_none());
    assert!(cache.get(&key(1)).is_some());
    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[test]
fn test_clear_empties_cache() {
    let mut cache = filled(3);
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.keys_lru_order().count(), 0);
}

// ============================================================================
// DEM Mapping Tests
// ============================================================================

#[test]
fn test_two_levels_coarser_dem_maps_sixteenth() {
    let tile = TileKey::new(12, 7, 5);
    let dem = TileKey::new(10, 1, 1);
    let mapping = tile.dem_mapping(&dem);

    assert_eq!(mapping.scale, 0.25);
    assert_eq!(mapping.top_left, [0.75, 0.25]);
}

#[test]
fn test_free_position_matrix_matches_method() {
    let tile = TileKey::new(5, 17, 9).with_wrap(-1);
    let world_size = 512.0 * 32.0;
    assert_eq!(tile_position_matrix(&tile, world_size), tile.position_matrix(world_size));
}
