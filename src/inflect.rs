// Naming conventions for tables, record types and association targets.
use std::sync::Once;

use heck::{ToSnakeCase, ToUpperCamelCase};

static RULES: Once = Once::new();

// pluralizer counts "pokemon" as uncountable; tables here are "pokemons"
fn rules() {
    RULES.call_once(|| pluralizer::add_irregular_rule("pokemon".to_owned(), "pokemons".to_owned()));
}

// Only the last underscore-separated word is inflected: gym_leader -> gym_leaders.
fn inflect(word: &str, count: isize) -> String {
    rules();
    let (head, last) = match word.rfind('_') {
        Some(i) => word.split_at(i + 1),
        None => ("", word),
    };
    if last.is_empty() {
        return word.to_owned();
    }
    format!("{head}{}", pluralizer::pluralize(last, count, false))
}

pub fn pluralize(word: &str) -> String {
    inflect(word, 2)
}

pub fn singularize(word: &str) -> String {
    inflect(word, 1)
}

/// `GymLeader` -> `gym_leader`
pub fn underscore(name: &str) -> String {
    name.to_snake_case()
}

/// `gym_leader` -> `GymLeader`; already camel-cased names pass through.
pub fn camelize(name: &str) -> String {
    name.to_upper_camel_case()
}

/// Default table for a record type: `GymLeader` -> `gym_leaders`.
pub fn tableize(type_name: &str) -> String {
    pluralize(&underscore(type_name))
}
