//! `aurora parse-version`

use aurora_topology::capability::{AURORA_MIN_MAJOR_VERSION, parse_server_version};
use serde_json::{Value as JsonValue, json};

pub fn run_parse_version(line: &str) -> JsonValue {
    let version = parse_server_version(line);
    json!({
        "engineName": version.engine_name,
        "majorVersion": version.major_version,
        "fullVersion": version.full_version,
        "targetEngine": version.is_target_engine(),
        "meetsAuroraMinimum": version.major_version >= AURORA_MIN_MAJOR_VERSION,
    })
}
