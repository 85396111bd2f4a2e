//! `aurora resolve-az`

use aurora_core::PluginConfig;
use aurora_topology::{AzAdvisor, az_from_hostname};
use serde_json::{Value as JsonValue, json};

pub fn run_resolve_az(
    mut config: PluginConfig,
    host: &str,
    host_az_map: Option<String>,
    preferred_az: Option<String>,
) -> JsonValue {
    if host_az_map.is_some() {
        config.host_az_map = host_az_map;
    }
    if preferred_az.is_some() {
        config.preferred_az = preferred_az;
    }

    let advisor = AzAdvisor::new(config.az_config());
    let az = advisor.resolve(host);
    let preference = advisor.log_preference(host, az.as_deref());

    json!({
        "host": host,
        "availabilityZone": az,
        "heuristic": az_from_hostname(host),
        "preference": preference,
    })
}
