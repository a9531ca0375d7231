/// Lowercase `value`, drop anything that is not alphanumeric, `_`, `-` or whitespace, and join
/// the remaining words with single hyphens.
pub fn slugify(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .flat_map(char::to_lowercase)
        .collect();

    cleaned
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
