use std::path::Path;

use subwrap_types::{Catalog, TestCase};

use crate::Error;

/// Each identity is evaluated at `gid.x == 0` against the constant `1000u`,
/// where a naive `a - b` rewrite would wrap to a value near `u32::MAX`.
pub fn builtin() -> Catalog {
    Catalog {
        cases: vec![
            TestCase::new("select", "buffer = select(0u, gid.x - 1000u, gid.x > 1000u);", 0),
            TestCase::new("add_sub_min", "buffer = (zero + gid.x) - min(gid.x, 1000u);", 0),
            TestCase::new("x_sub_min", "buffer = gid.x - min(1000u, gid.x);", 0),
            TestCase::new("c_sub_max", "buffer = 1000u - max(gid.x, 1000u);", 0),
            TestCase::new("min_sub_x", "buffer = min(1000u, gid.x) - gid.x;", 0),
            TestCase::new("max_sub_c", "buffer = max(gid.x, 1000u) - 1000u;", 0),
        ],
    }
}

pub fn load(path: &Path) -> Result<Catalog, Error> {
    let text = std::fs::read_to_string(path)?;
    let catalog: Catalog = serde_json::from_str(&text)?;
    Ok(catalog)
}
