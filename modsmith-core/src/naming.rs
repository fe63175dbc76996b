//! Naming conventions
//!
//! Every artifact a component owns is derived from its snake_case name:
//! `ruby_gem` becomes the class `RubyGem`, the namespaced id
//! `testmod:ruby_gem`, and resource files named `ruby_gem.json`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RefactorError;

/// Convert a snake_case (or already PascalCase) name to a class name.
pub fn to_class_name(name: &str) -> String {
    name.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

/// Convert a class name (or an existing snake_case name) to snake_case.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c == '-' || c.is_whitespace() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() && !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Uppercase the first character, leave the rest untouched.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Suffix used for a loader's registration class (`RubyGemNeoForge`).
pub fn loader_class_name(loader: &str) -> String {
    match loader {
        "neoforge" => "NeoForge".to_string(),
        other => capitalize(other),
    }
}

/// Whether `c` can be part of an identifier in code or a resource id.
#[inline]
pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A validated component name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentName {
    snake: String,
    class_name: String,
}

impl ComponentName {
    /// Parse a snake_case name. Segments must start with a lowercase letter
    /// and contain only lowercase letters and digits.
    pub fn parse(raw: &str) -> Result<Self, RefactorError> {
        if !is_valid_snake(raw) {
            return Err(RefactorError::InvalidName(raw.to_string()));
        }
        Ok(Self {
            snake: raw.to_string(),
            class_name: to_class_name(raw),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.snake
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// `<namespace>:<name>`
    pub fn namespaced_id(&self, namespace: &str) -> String {
        format!("{}:{}", namespace, self.snake)
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.snake)
    }
}

/// `com.example.mymod`: dot-separated lowercase Java identifiers
pub fn is_valid_package(raw: &str) -> bool {
    !raw.is_empty()
        && raw.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        })
}

/// Mod ids: 2 to 64 chars of `a-z`, `0-9`, `_` and `-`, starting with a letter
pub fn is_valid_mod_id(raw: &str) -> bool {
    (2..=64).contains(&raw.len())
        && raw.starts_with(|c: char| c.is_ascii_lowercase())
        && raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// `com.<id>` with `-` and `_` dropped, the package a mod id implies
pub fn default_package(mod_id: &str) -> String {
    format!("com.{}", mod_id.replace(&['-', '_'][..], ""))
}

fn is_valid_snake(raw: &str) -> bool {
    !raw.is_empty()
        && raw.split('_').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

/// Component types known to the project layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Item,
    Block,
    Entity,
    Recipe,
    Tag,
    Enchantment,
    Biome,
}

impl ComponentType {
    /// Directory under the package root holding this type's common class.
    pub fn code_dir(self) -> Option<&'static str> {
        match self {
            ComponentType::Item => Some("items"),
            ComponentType::Block => Some("blocks"),
            ComponentType::Entity => Some("entities"),
            ComponentType::Enchantment => Some("enchantments"),
            ComponentType::Biome => Some("biomes"),
            ComponentType::Recipe | ComponentType::Tag => None,
        }
    }

    /// Resource directory segment used in `<ns>:<segment>/<name>` paths.
    pub fn resource_segment(self) -> Option<&'static str> {
        match self {
            ComponentType::Item => Some("item"),
            ComponentType::Block => Some("block"),
            ComponentType::Entity => Some("entity"),
            ComponentType::Enchantment => Some("enchantment"),
            ComponentType::Biome => Some("biome"),
            ComponentType::Recipe | ComponentType::Tag => None,
        }
    }

    pub fn has_code(self) -> bool {
        self.code_dir().is_some()
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComponentType::Item => "item",
            ComponentType::Block => "block",
            ComponentType::Entity => "entity",
            ComponentType::Recipe => "recipe",
            ComponentType::Tag => "tag",
            ComponentType::Enchantment => "enchantment",
            ComponentType::Biome => "biome",
        };
        f.write_str(s)
    }
}

impl FromStr for ComponentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "item" | "items" => Ok(ComponentType::Item),
            "block" | "blocks" => Ok(ComponentType::Block),
            "entity" | "entities" => Ok(ComponentType::Entity),
            "recipe" | "recipes" => Ok(ComponentType::Recipe),
            "tag" | "tags" => Ok(ComponentType::Tag),
            "enchantment" | "enchantments" => Ok(ComponentType::Enchantment),
            "biome" | "biomes" => Ok(ComponentType::Biome),
            other => Err(format!(
                "unknown component type '{}' (expected item, block, entity, recipe, tag, enchantment or biome)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_class_name() {
        assert_eq!(to_class_name("ruby_gem"), "RubyGem");
        assert_eq!(to_class_name("stone"), "Stone");
        assert_eq!(to_class_name("gem2_block"), "Gem2Block");
        assert_eq!(to_class_name("RubyGem"), "RubyGem");
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("RubyGem"), "ruby_gem");
        assert_eq!(to_snake_case("ruby_gem"), "ruby_gem");
        assert_eq!(to_snake_case("Gem2Block"), "gem2_block");
        assert_eq!(to_snake_case("ruby-gem"), "ruby_gem");
    }

    #[test]
    fn test_round_trip() {
        for name in ["ruby_gem", "a", "copper_ore_block", "gem2", "x1_y2_z3"] {
            assert_eq!(to_snake_case(&to_class_name(name)), name);
            assert_eq!(
                to_class_name(&to_snake_case(name)),
                to_class_name(name),
                "class round trip for {}",
                name
            );
        }
        for class in ["RubyGem", "Stone", "CopperOreBlock"] {
            assert_eq!(to_class_name(&to_snake_case(class)), class);
        }
    }

    #[test]
    fn test_loader_class_name() {
        assert_eq!(loader_class_name("fabric"), "Fabric");
        assert_eq!(loader_class_name("forge"), "Forge");
        assert_eq!(loader_class_name("neoforge"), "NeoForge");
    }

    #[test]
    fn test_component_name_parse() {
        let name = ComponentName::parse("ruby_gem").unwrap();
        assert_eq!(name.class_name(), "RubyGem");
        assert_eq!(name.namespaced_id("testmod"), "testmod:ruby_gem");

        assert!(ComponentName::parse("").is_err());
        assert!(ComponentName::parse("RubyGem").is_err());
        assert!(ComponentName::parse("ruby__gem").is_err());
        assert!(ComponentName::parse("_ruby").is_err());
        assert!(ComponentName::parse("ruby_2").is_err());
        assert!(ComponentName::parse("ruby gem").is_err());
    }

    #[test]
    fn test_component_type_from_str() {
        assert_eq!("item".parse::<ComponentType>().unwrap(), ComponentType::Item);
        assert_eq!("Blocks".parse::<ComponentType>().unwrap(), ComponentType::Block);
        assert!("fluid".parse::<ComponentType>().is_err());
    }

    #[test]
    fn test_enchantment_and_biome_layout() {
        assert_eq!("enchantments".parse::<ComponentType>().unwrap(), ComponentType::Enchantment);
        assert_eq!(ComponentType::Enchantment.code_dir(), Some("enchantments"));
        assert_eq!(ComponentType::Biome.code_dir(), Some("biomes"));
        assert_eq!(ComponentType::Biome.resource_segment(), Some("biome"));
        assert_eq!(ComponentType::Biome.to_string(), "biome");
    }

    #[test]
    fn test_package_and_mod_id_validation() {
        assert!(is_valid_package("com.testmod"));
        assert!(is_valid_package("dev.my_mod.core"));
        assert!(!is_valid_package("com..testmod"));
        assert!(!is_valid_package("Com.TestMod"));
        assert!(!is_valid_package("com.1mod"));

        assert!(is_valid_mod_id("testmod"));
        assert!(is_valid_mod_id("my-mod_2"));
        assert!(!is_valid_mod_id("x"));
        assert!(!is_valid_mod_id("2mod"));
        assert!(!is_valid_mod_id("My_Mod"));

        assert_eq!(default_package("my-cool_mod"), "com.mycoolmod");
    }
}
