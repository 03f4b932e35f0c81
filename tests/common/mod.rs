//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Once;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use frame_cache::{dataframe_checksum, Cache, DataFrame, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static TRACING: Once = Once::new();

/// Installs a test subscriber once; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "frame_cache=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

fn int_map(pairs: &[(i64, i64)]) -> Value {
    let map: BTreeMap<String, Value> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::Int(*v)))
        .collect();
    Value::Map(map)
}

/// Two mixed-type rows (ints, floats, strings, timestamps, lists, maps)
/// stacked 100 times.
pub fn sample_frame() -> DataFrame {
    let rows = vec![
        vec![
            Value::Int(1),
            Value::Float(1.2),
            Value::from("string"),
            Value::Timestamp(Utc::now()),
            Value::from(vec![1, 2, 3]),
            int_map(&[(1, 3)]),
        ],
        vec![
            Value::Int(2),
            Value::Float(3.2),
            Value::from("other"),
            Value::Timestamp(Utc.with_ymd_and_hms(2011, 12, 30, 0, 0, 0).unwrap()),
            Value::from(vec![3]),
            int_map(&[(11, 23), (2, 3)]),
        ],
    ];
    DataFrame::from_rows(&["a", "b", "c", "d", "e", "f"], rows)
        .unwrap()
        .repeat(100)
}

/// Redis endpoint for live tests, if one is configured.
pub fn redis_url() -> Option<String> {
    std::env::var("CACHE_TEST_REDIS_URL")
        .ok()
        .filter(|v| !v.is_empty())
}

// == Contract ==
/// Save, load, delete, then overflow a cache of size 2.
pub fn run_contract<C: Cache>(cache: &mut C) -> Result<()> {
    let df = sample_frame();
    let name = dataframe_checksum(&df)?;

    cache.set(&name, &df)?;
    let loaded = cache.get(&name)?.expect("frame should be cached");
    assert_eq!(dataframe_checksum(&loaded)?, name);
    assert_eq!(loaded.column_names(), df.column_names());

    cache.delete(&name)?;
    assert!(cache.get(&name)?.is_none());

    // 2 (max_size) + 6 more inserts
    cache.set("first", &df)?;
    for i in 0..7 {
        cache.set(&i.to_string(), &df)?;
    }

    assert!(cache.get("first")?.is_none());
    assert!(cache.get("5")?.is_some());
    assert!(cache.get("6")?.is_some());
    assert!(cache.get("4")?.is_none());
    assert_eq!(cache.len()?, 2);
    Ok(())
}

/// Overwriting a resident key keeps its eviction slot.
pub fn run_overwrite_policy<C: Cache>(cache: &mut C) -> Result<()> {
    let one = DataFrame::new().with_column("v", vec![Value::Int(1)])?;
    let two = DataFrame::new().with_column("v", vec![Value::Int(2)])?;

    cache.set("a", &one)?;
    cache.set("b", &one)?;
    cache.set("a", &two)?;
    assert_eq!(cache.get("a")?, Some(two));

    cache.set("c", &one)?;
    assert!(cache.get("a")?.is_none(), "overwritten key keeps its slot");
    assert!(cache.get("b")?.is_some());
    assert!(cache.get("c")?.is_some());
    Ok(())
}

pub fn run_missing_and_idempotent<C: Cache>(cache: &mut C) -> Result<()> {
    assert!(cache.get("never-set")?.is_none());
    cache.delete("never-set")?;
    cache.delete("never-set")?;
    assert!(cache.is_empty()?);
    Ok(())
}
