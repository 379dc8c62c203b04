use crate::config::EnvConfig;
use crate::model::{Note, Notebook, NoteSummary};
use crate::path;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    /// Transport failure before any HTTP status was received.
    Network,
    /// Non-2xx response.
    Http,
    /// 2xx response whose body did not match the expected shape.
    Parse,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub status: Option<u16>,
    pub body: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ApiErrorKind::Network => write!(f, "network error: {}", self.body),
            ApiErrorKind::Http => {
                write!(f, "{} : {}", self.status.unwrap_or_default(), self.body)
            }
            ApiErrorKind::Parse => write!(f, "invalid response: {}", self.body),
        }
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            status: None,
            body: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            status: None,
            body: e.to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            status: Some(status.as_u16()),
            body,
        }
    }

    #[cfg(test)]
    pub(crate) fn not_found(body: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            status: Some(404),
            body: body.to_string(),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Wire shape of `GET /n/{path}` and of the `PUT /n/{path}` response.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct NoteData {
    pub title: String,
    pub html: String,
    #[serde(default)]
    pub raw: String,
    pub path: String,
    /// Parent notebook path, used for cross-reference resolution.
    pub nburl: String,
}

/// Wire shape of `GET /nb/{path}` and of a `POST /search` response.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct NotebookData {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub notes: Vec<NoteSummaryData>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct NoteSummaryData {
    pub title: String,
    pub url: String,
}

#[derive(Serialize, Clone, Debug)]
struct SearchRequest {
    query: String,
}

#[derive(Serialize, Clone, Debug)]
struct SaveNoteRequest {
    text: String,
}

impl From<NoteData> for Note {
    fn from(d: NoteData) -> Self {
        Note {
            title: d.title,
            html: d.html,
            raw: d.raw,
            path: d.path,
        }
    }
}

impl From<NotebookData> for Notebook {
    fn from(d: NotebookData) -> Self {
        Notebook {
            name: Some(d.name),
            url: d.url,
            notes: d
                .notes
                .into_iter()
                .map(|n| NoteSummary {
                    title: n.title,
                    url: n.url,
                })
                .collect(),
        }
    }
}

/// The fetch seam. The navigation engine talks to the server only through
/// this trait, so tests can drive it with a scripted store.
pub(crate) trait NoteStore {
    async fn fetch_note(&self, path: &str) -> ApiResult<NoteData>;
    async fn fetch_notebook(&self, path: &str) -> ApiResult<NotebookData>;
    async fn search(&self, query: &str) -> ApiResult<NotebookData>;
}

/// One network request per operation, no retries, no state: failures are
/// surfaced to the caller and the content model is never touched here.
///
/// Paths handed in are expected to already carry exactly one level of
/// percent-encoding (see `path::normalize`); they are used on the wire
/// as-is.
#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }

    pub fn from_env() -> Self {
        Self::new(EnvConfig::new().api_url)
    }

    /// The codec is the single source of truth for which endpoint a path
    /// belongs to: notebook-shaped paths (trailing `/`, or empty) go to
    /// `/nb/`, everything else to `/n/`.
    pub(crate) fn url_for(&self, path: &str) -> String {
        let (_, endpoint) = path::endpoint(path);
        format!("{}{}", self.base_url, endpoint)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(res: reqwest::Response) -> ApiResult<T> {
        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body))
        }
    }

    /// Persist edited note text. Consumed by the inline editor, not by the
    /// navigation engine; the returned record is the server's authoritative
    /// version of the note.
    pub async fn save_note(&self, path: &str, text: &str) -> ApiResult<NoteData> {
        let res = reqwest::Client::new()
            .put(self.url_for(path))
            .json(&SaveNoteRequest {
                text: text.to_string(),
            })
            .send()
            .await
            .map_err(ApiError::network)?;
        Self::read_json(res).await
    }
}

impl NoteStore for ApiClient {
    async fn fetch_note(&self, path: &str) -> ApiResult<NoteData> {
        let res = reqwest::Client::new()
            .get(self.url_for(path))
            .send()
            .await
            .map_err(ApiError::network)?;
        Self::read_json(res).await
    }

    async fn fetch_notebook(&self, path: &str) -> ApiResult<NotebookData> {
        let res = reqwest::Client::new()
            .get(self.url_for(path))
            .send()
            .await
            .map_err(ApiError::network)?;
        Self::read_json(res).await
    }

    async fn search(&self, query: &str) -> ApiResult<NotebookData> {
        let res = reqwest::Client::new()
            .post(format!("{}/search", self.base_url))
            .json(&SearchRequest {
                query: query.to_string(),
            })
            .send()
            .await
            .map_err(ApiError::network)?;
        Self::read_json(res).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_contract_deserialize() {
        let json = r#"{
            "title": "Today",
            "html": "<p>hello</p>",
            "raw": "hello",
            "path": "journal/today.md",
            "nburl": "journal/"
        }"#;
        let parsed: NoteData = serde_json::from_str(json).expect("note should parse");
        assert_eq!(parsed.title, "Today");
        assert_eq!(parsed.nburl, "journal/");
    }

    #[test]
    fn test_note_contract_raw_is_optional() {
        let json = r#"{"title": "t", "html": "", "path": "t.md", "nburl": ""}"#;
        let parsed: NoteData = serde_json::from_str(json).expect("note should parse");
        assert_eq!(parsed.raw, "");
    }

    #[test]
    fn test_notebook_contract_deserialize() {
        let json = r#"{
            "name": "journal",
            "url": "journal/",
            "notes": [
                {"title": "Today", "url": "journal/today.md"},
                {"title": "Yesterday", "url": "journal/yesterday.md"}
            ]
        }"#;
        let parsed: NotebookData = serde_json::from_str(json).expect("notebook should parse");
        assert_eq!(parsed.name, "journal");
        assert_eq!(parsed.notes.len(), 2);
        assert_eq!(parsed.notes[0].url, "journal/today.md");
    }

    #[test]
    fn test_notebook_contract_notes_default_empty() {
        // A search response with no matches may omit the list entirely.
        let json = r#"{"name": "search results"}"#;
        let parsed: NotebookData = serde_json::from_str(json).expect("notebook should parse");
        assert!(parsed.notes.is_empty());
        assert_eq!(parsed.url, "");
    }

    #[test]
    fn test_notebook_into_model_sets_resolved_name() {
        let data = NotebookData {
            name: "journal".to_string(),
            url: "journal/".to_string(),
            notes: vec![],
        };
        let nb: Notebook = data.into();
        assert_eq!(nb.name.as_deref(), Some("journal"));
    }

    #[test]
    fn test_search_request_serialization() {
        let v = serde_json::to_value(SearchRequest {
            query: "rust wasm".to_string(),
        })
        .expect("should serialize");
        assert_eq!(v["query"], "rust wasm");
    }

    #[test]
    fn test_save_request_serialization() {
        let v = serde_json::to_value(SaveNoteRequest {
            text: "# edited".to_string(),
        })
        .expect("should serialize");
        assert_eq!(v["text"], "# edited");
    }

    #[test]
    fn test_url_building_uses_encoded_path_verbatim() {
        let client = ApiClient::new(String::new());
        assert_eq!(client.url_for("a%20b.md"), "/n/a%20b.md");
        assert_eq!(client.url_for("journal/"), "/nb/journal/");
        assert_eq!(client.url_for(""), "/nb/");

        let remote = ApiClient::new("http://localhost:6789".to_string());
        assert_eq!(remote.url_for("t.md"), "http://localhost:6789/n/t.md");
    }

    #[test]
    fn test_error_display_includes_status_and_body() {
        let e = ApiError::not_found("Not found.");
        assert_eq!(e.to_string(), "404 : Not found.");
        assert_eq!(e.kind, ApiErrorKind::Http);
    }
}
