use std::fmt;

use super::PropertyBag;

/// Where a layer of properties came from, ordered from lowest to highest precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigSource {
    GlobalFile,
    ProjectFile,
    ModuleFile,
    SystemProperties,
    Environment,
    CommandLine,
}

impl ConfigSource {
    pub fn display_name(&self) -> &'static str {
        match self {
            ConfigSource::GlobalFile => "global settings file",
            ConfigSource::ProjectFile => "project settings file",
            ConfigSource::ModuleFile => "module settings file",
            ConfigSource::SystemProperties => "system properties",
            ConfigSource::Environment => "environment",
            ConfigSource::CommandLine => "command line",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One bag of properties tagged with its source.
#[derive(Debug, Clone)]
pub struct Layer {
    pub source: ConfigSource,
    pub properties: PropertyBag,
}

impl Layer {
    pub fn new(source: ConfigSource, properties: PropertyBag) -> Self {
        Self { source, properties }
    }
}

/// Merges bags in the given order; on key collision the later bag wins.
pub fn merge<'a, I>(bags: I) -> PropertyBag
where
    I: IntoIterator<Item = &'a PropertyBag>,
{
    let mut merged = PropertyBag::new();
    for bag in bags {
        merged.merge_from(bag);
    }
    merged
}

/// Merges layers in the order given, which must already be lowest precedence first.
pub fn merge_layers(layers: &[Layer]) -> PropertyBag {
    debug_assert!(
        layers.windows(2).all(|w| w[0].source <= w[1].source),
        "layers must be ordered by precedence"
    );
    merge(layers.iter().map(|layer| &layer.properties))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bag(entries: &[(&str, &str)]) -> PropertyBag {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_precedence_order() {
        assert!(ConfigSource::GlobalFile < ConfigSource::ProjectFile);
        assert!(ConfigSource::ProjectFile < ConfigSource::SystemProperties);
        assert!(ConfigSource::SystemProperties < ConfigSource::Environment);
        assert!(ConfigSource::Environment < ConfigSource::CommandLine);
    }

    #[test]
    fn test_merge_layers_later_wins() {
        let layers = vec![
            Layer::new(ConfigSource::GlobalFile, bag(&[("sonar.host.url", "global"), ("a", "1")])),
            Layer::new(ConfigSource::ProjectFile, bag(&[("sonar.host.url", "project")])),
            Layer::new(ConfigSource::Environment, bag(&[("b", "2")])),
            Layer::new(ConfigSource::CommandLine, bag(&[("sonar.host.url", "cli")])),
        ];

        let merged = merge_layers(&layers);
        assert_eq!(merged.get("sonar.host.url"), Some("cli"));
        assert_eq!(merged.get("a"), Some("1"));
        assert_eq!(merged.get("b"), Some("2"));
        let keys: Vec<_> = merged.keys().collect();
        assert_eq!(keys, vec!["sonar.host.url", "a", "b"]);
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge(std::iter::empty()).is_empty());
    }

    proptest! {
        #[test]
        fn later_bag_wins(
            a in proptest::collection::vec(("[a-c]{1,2}", "[0-9]{1,3}"), 0..8),
            b in proptest::collection::vec(("[a-c]{1,2}", "[0-9]{1,3}"), 0..8),
        ) {
            let first: PropertyBag = a.into_iter().collect();
            let second: PropertyBag = b.into_iter().collect();
            let merged = merge([&first, &second]);

            for (key, value) in second.iter() {
                prop_assert_eq!(merged.get(key), Some(value));
            }
            for (key, value) in first.iter() {
                if !second.contains_key(key) {
                    prop_assert_eq!(merged.get(key), Some(value));
                }
            }
            prop_assert!(merged.len() <= first.len() + second.len());
        }
    }
}
