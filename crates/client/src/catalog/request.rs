//! Catalog function request types and validation.

use roost_core::{RecordId, SearchQuery};
use serde::Serialize;

use super::ClientError;

/// Longest accepted search phrase, in characters.
pub const MAX_PHRASE_CHARS: usize = 400;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Validate a search query before sending it.
pub fn validate_search(query: &SearchQuery) -> Result<(), ClientError> {
    if query.search_phrase.is_empty() {
        return Err(ClientError::InvalidRequest("search phrase cannot be empty".to_string()));
    }

    let chars = query.search_phrase.chars().count();
    if chars > MAX_PHRASE_CHARS {
        return Err(ClientError::InvalidRequest(format!(
            "search phrase too long: {chars} chars (max {MAX_PHRASE_CHARS})"
        )));
    }

    if query.page_number == 0 {
        return Err(ClientError::InvalidRequest("page number starts at 1".to_string()));
    }

    if query.page_size == 0 || query.page_size > MAX_PAGE_SIZE {
        return Err(ClientError::InvalidRequest(format!("page size must be 1-{MAX_PAGE_SIZE}")));
    }

    Ok(())
}

/// Body of a record-fetch call.
#[derive(Debug, Clone, Serialize)]
pub struct FetchRequest<'a> {
    pub ids: &'a [RecordId],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_query() {
        assert!(validate_search(&SearchQuery::first_page("loft", 20)).is_ok());
    }

    #[test]
    fn test_empty_phrase() {
        let result = validate_search(&SearchQuery::first_page("", 20));
        assert!(matches!(result, Err(ClientError::InvalidRequest(_))));
    }

    #[test]
    fn test_phrase_too_long() {
        let result = validate_search(&SearchQuery::first_page("a".repeat(401), 20));
        assert!(matches!(result, Err(ClientError::InvalidRequest(msg)) if msg.contains("401")));
        assert!(validate_search(&SearchQuery::first_page("é".repeat(400), 20)).is_ok());
    }

    #[test]
    fn test_page_bounds() {
        let zero_page = SearchQuery { search_phrase: "loft".into(), page_number: 0, page_size: 20 };
        assert!(validate_search(&zero_page).is_err());
        assert!(validate_search(&SearchQuery::first_page("loft", 0)).is_err());
        assert!(validate_search(&SearchQuery::first_page("loft", 101)).is_err());
        assert!(validate_search(&SearchQuery::first_page("loft", 100)).is_ok());
    }

    #[test]
    fn test_fetch_request_body() {
        let ids = vec![RecordId::from("1"), RecordId::from("2")];
        let body = serde_json::to_value(FetchRequest { ids: &ids }).unwrap();
        assert_eq!(body, serde_json::json!({ "ids": ["1", "2"] }));
    }
}
