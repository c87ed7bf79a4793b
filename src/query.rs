/// Query used when no term is given, surfacing popular repositories.
pub const DISCOVERY_QUERY: &str = "stars:>5000";

/// Builds the provider query string from a free-text term and a language filter.
///
/// ```
/// use github_repo_search::build_search_query;
///
/// assert_eq!(build_search_query("react", "TypeScript"), "react in:name language:TypeScript");
/// assert_eq!(build_search_query("", "Python"), "stars:>5000 language:Python");
/// ```
pub fn build_search_query(term: &str, language: &str) -> String {
    let term = term.trim();
    let mut query = if term.is_empty() {
        DISCOVERY_QUERY.to_string()
    } else {
        format!("{} in:name", term)
    };

    let language = language.trim();
    if !language.is_empty() {
        query.push_str(" language:");
        query.push_str(language);
    }
    query
}
