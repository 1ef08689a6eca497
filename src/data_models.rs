use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchRequest {
    pub query: String,
    pub timerange: String,
    pub region: String,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> SearchRequest {
        SearchRequest {
            query: query.into(),
            timerange: "".to_string(),
            region: "".to_string(),
        }
    }
}

/// Unified result every search source is normalized into.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResult {
    pub title: String,
    pub body: String,
    pub url: String,
}

impl SearchResult {
    pub fn new(title: String, body: String, url: String) -> SearchResult {
        SearchResult { title, body, url }
    }
}

// =============================================================================
// Retrieval API wire types
// =============================================================================

#[derive(Serialize, Debug, Clone)]
pub struct QueryRequest {
    pub queries: Vec<Query>,
}

#[derive(Serialize, Debug, Clone)]
pub struct Query {
    pub query: String,
}

impl QueryRequest {
    pub fn single(query: &str) -> QueryRequest {
        QueryRequest {
            queries: vec![Query {
                query: query.to_string(),
            }],
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct QueryResponse {
    pub results: Vec<QueryResult>,
}

/// One result set per submitted query.
#[derive(Deserialize, Debug, Clone)]
pub struct QueryResult {
    pub results: Vec<DocumentChunk>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DocumentChunk {
    pub metadata: ChunkMetadata,
    pub text: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ChunkMetadata {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<DocumentChunk> for SearchResult {
    fn from(chunk: DocumentChunk) -> SearchResult {
        SearchResult {
            title: chunk.metadata.title,
            body: chunk.text,
            url: chunk.metadata.url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_shape() {
        let body = serde_json::to_value(QueryRequest::single("rust async")).unwrap();
        assert_eq!(body, serde_json::json!({"queries": [{"query": "rust async"}]}));
    }

    #[test]
    fn test_chunk_metadata_tolerates_missing_and_null() {
        let chunk: DocumentChunk =
            serde_json::from_str(r#"{"metadata": {"title": null}, "text": "hello"}"#).unwrap();
        let result = SearchResult::from(chunk);
        assert_eq!(result.title, "");
        assert_eq!(result.url, "");
        assert_eq!(result.body, "hello");
    }

    #[test]
    fn test_chunk_requires_text() {
        let res = serde_json::from_str::<DocumentChunk>(r#"{"metadata": {}}"#);
        assert!(res.is_err());
    }
}
