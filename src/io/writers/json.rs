use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::Result;

#[derive(Serialize)]
struct Sidecar<'a, T: Serialize> {
    generated_at: DateTime<Utc>,
    generator: &'static str,
    #[serde(flatten)]
    body: &'a T,
}

/// Write `body` as pretty JSON to `path`, stamped with the generation time.
pub fn write_json_report<T: Serialize>(body: &T, path: &Path) -> Result<()> {
    let sidecar = Sidecar {
        generated_at: Utc::now(),
        generator: concat!("qytools ", env!("CARGO_PKG_VERSION")),
        body,
    };
    let json_string = serde_json::to_string_pretty(&sidecar)?;
    std::fs::write(path, json_string)?;
    info!("Wrote JSON report: {:?}", path);
    Ok(())
}

/// Write a `.json` sidecar next to `output_path`; returns the sidecar path.
pub fn create_sidecar<T: Serialize>(output_path: &Path, body: &T) -> Result<PathBuf> {
    let sidecar_path = output_path.with_extension("json");
    write_json_report(body, &sidecar_path)?;
    Ok(sidecar_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Body {
        count: usize,
    }

    #[test]
    fn sidecar_sits_next_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("grid.png");
        let sidecar = create_sidecar(&output, &Body { count: 4 }).unwrap();
        assert_eq!(sidecar, dir.path().join("grid.json"));

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&sidecar).unwrap()).unwrap();
        assert_eq!(value["count"], 4);
        assert!(value["generated_at"].is_string());
        assert!(value["generator"].as_str().unwrap().starts_with("qytools"));
    }
}
