use crate::model::Client;

/// Characters that delimit a client name inside a task title.
const CLIENT_NAME_BOUNDARIES: &[char] = &[
    ' ', '\t', '\n', '.', ',', ';', ':', '!', '?', '-', '_', '/', '\\', '(', ')', '[', ']', '{',
    '}', '"', '\'', '+', '&', '|', '#', '@',
];

/// Byte offsets of every case-insensitive occurrence of `needle` in `haystack`,
/// with both sides already lower-cased.
fn occurrences<'a>(haystack: &'a str, needle: &'a str) -> impl Iterator<Item = usize> + 'a {
    haystack.match_indices(needle).map(|(i, _)| i)
}

fn bounded(haystack: &str, start: usize, len: usize, is_boundary: impl Fn(char) -> bool) -> bool {
    let before = haystack[..start].chars().next_back();
    let after = haystack[start + len..].chars().next();
    before.map_or(true, &is_boundary) && after.map_or(true, &is_boundary)
}

/// Word-boundary, case-insensitive match of the client name inside free text.
pub fn mentions_name(text: &str, name: &str) -> bool {
    let text = text.to_lowercase();
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return false;
    }
    let found = occurrences(&text, &name)
        .any(|i| bounded(&text, i, name.len(), |c| !c.is_alphanumeric()));
    found
}

/// Whole-word match against the explicit boundary set used for task titles.
/// Compound words such as "Acmeprojekt" do not match "Acme".
pub fn title_mentions_name(title: &str, name: &str) -> bool {
    let title = title.to_lowercase();
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return false;
    }
    let found = occurrences(&title, &name)
        .any(|i| bounded(&title, i, name.len(), |c| CLIENT_NAME_BOUNDARIES.contains(&c)));
    found
}

/// First active client mentioned in `text`. No ranking: list order wins.
pub fn match_client<'a>(text: &str, clients: &'a [Client]) -> Option<&'a Client> {
    clients
        .iter()
        .filter(|c| c.is_active)
        .find(|c| mentions_name(text, &c.name))
}
