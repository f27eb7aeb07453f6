//! Collection naming rules.

use heck::ToSnakeCase;

/// Derive the default collection name for a model type name.
///
/// A trailing `Model` is dropped, the rest is snake-cased and pluralized:
/// `BlogPostModel` becomes `blog_posts`.
pub fn default_collection_name(type_name: &str) -> String {
    let base = type_name
        .strip_suffix("Model")
        .filter(|rest| !rest.is_empty())
        .unwrap_or(type_name);
    pluralize(&base.to_snake_case())
}

/// Naive English pluralization.
pub fn pluralize(word: &str) -> String {
    let word = word.trim();
    if let Some(stem) = word.strip_suffix('y') {
        format!("{stem}ies")
    } else if word.ends_with('s') {
        format!("{word}es")
    } else if word.is_empty() {
        String::new()
    } else {
        format!("{word}s")
    }
}
