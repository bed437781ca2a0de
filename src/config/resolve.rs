//! Placeholder substitution for property values.
//!
//! Values may reference other properties using `${some.key}` syntax, or
//! environment variables using `${env.NAME}`. Undefined references expand
//! to an empty string. Use `$${...}` to produce a literal `${...}`.

use std::collections::HashMap;

use super::{ConfigError, PropertyBag};

const ENV_PREFIX: &str = "env.";

/// Returns a copy of `props` with every placeholder expanded.
///
/// Referenced values are themselves expanded, so chains of references work.
/// Returns an error if a value ends up referencing itself.
pub fn resolve_placeholders(
    props: &PropertyBag,
    env: &HashMap<String, String>,
) -> Result<PropertyBag, ConfigError> {
    let resolver = Resolver { props, env };
    let mut resolved = PropertyBag::new();

    for (key, value) in props.iter() {
        let mut stack = vec![key.to_string()];
        resolved.insert(key, resolver.resolve_str(value, &mut stack)?);
    }

    Ok(resolved)
}

struct Resolver<'a> {
    props: &'a PropertyBag,
    env: &'a HashMap<String, String>,
}

impl Resolver<'_> {
    fn lookup(&self, name: &str) -> Option<&str> {
        match name.strip_prefix(ENV_PREFIX) {
            Some(var) => self.env.get(var).map(String::as_str),
            None => self.props.get(name),
        }
    }

    /// Expands all placeholders in `s`. `stack` holds the names being
    /// expanded on the current path.
    fn resolve_str(&self, s: &str, stack: &mut Vec<String>) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(s.len());
        let mut rest = s;

        while let Some(pos) = rest.find('$') {
            result.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if tail.starts_with("$${") {
                // Escape sequence: $${ -> ${
                result.push_str("${");
                rest = &tail[3..];
                continue;
            }

            match placeholder_name(tail) {
                Some(name) => {
                    if stack.iter().any(|n| n == name) {
                        return Err(ConfigError::CircularReference(name.to_string()));
                    }
                    let raw = self.lookup(name).unwrap_or_default();
                    stack.push(name.to_string());
                    let expanded = self.resolve_str(raw, stack)?;
                    stack.pop();
                    result.push_str(&expanded);
                    rest = &tail[name.len() + 3..];
                }
                None => {
                    // Just a lone $
                    result.push('$');
                    rest = &tail[1..];
                }
            }
        }

        result.push_str(rest);
        Ok(result)
    }
}

/// Extracts `name` from a string starting with `${name}`.
fn placeholder_name(s: &str) -> Option<&str> {
    let body = s.strip_prefix("${")?;
    let end = body.find('}')?;
    let name = &body[..end];
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    valid.then_some(name)
}
