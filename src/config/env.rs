use std::collections::HashMap;

use tracing::debug;

use super::{ConfigError, PropertyBag};

const JSON_PARAMS_VARS: [&str; 2] = ["SONAR_SCANNER_JSON_PARAMS", "SONARQUBE_SCANNER_PARAMS"];
const GENERIC_PREFIX: &str = "SONAR_SCANNER_";

const WELL_KNOWN_VARS: [(&str, &str); 4] = [
    ("SONAR_TOKEN", "sonar.token"),
    ("SONAR_HOST_URL", "sonar.host.url"),
    ("SONAR_USER_HOME", "sonar.userHome"),
    ("SONAR_REGION", "sonar.region"),
];

/// Collects scanner properties from environment variables.
///
/// JSON parameters come first, then well-known and `SONAR_SCANNER_*`
/// variables, which override them.
pub fn environment_properties(env: &HashMap<String, String>) -> Result<PropertyBag, ConfigError> {
    let mut props = PropertyBag::new();

    if let Some((var, json)) = JSON_PARAMS_VARS
        .iter()
        .find_map(|var| env.get(*var).map(|value| (*var, value)))
    {
        let params: HashMap<String, String> =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidJsonParams {
                var: var.to_string(),
                source: e,
            })?;
        let mut params: Vec<_> = params.into_iter().collect();
        params.sort();
        props.extend(params);
    }

    for (var, key) in WELL_KNOWN_VARS {
        if let Some(value) = env.get(var) {
            props.insert(key, value.as_str());
        }
    }

    let mut generic: Vec<_> = env
        .iter()
        .filter(|(var, _)| !JSON_PARAMS_VARS.contains(&var.as_str()))
        .filter_map(|(var, value)| {
            let rest = var.strip_prefix(GENERIC_PREFIX)?;
            let suffix = to_camel_case(rest)?;
            Some((format!("sonar.scanner.{suffix}"), value.clone()))
        })
        .collect();
    generic.sort();
    props.extend(generic);

    debug!("Collected {} properties from the environment", props.len());
    Ok(props)
}

fn to_camel_case(s: &str) -> Option<String> {
    let mut parts = s.split('_').filter(|p| !p.is_empty());
    let mut out = parts.next()?.to_lowercase();
    for part in parts {
        let lower = part.to_lowercase();
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    Some(out)
}
