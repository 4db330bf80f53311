//! Firestore Store Implementation
//!
//! REST-backed implementation of DocumentStore.
//! Field values travel in Firestore's typed encoding (`stringValue`, `mapValue`, ...).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Map, Value};

use crate::domain::{Document, FieldFilter, Fields, StoreError, StoreResult};
use super::traits::DocumentStore;

/// Public Firestore REST endpoint
pub const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1";

const PAGE_SIZE: &str = "300";

/// Firestore REST implementation of DocumentStore
pub struct FirestoreStore {
    client: Client,
    documents_url: String,
    api_key: Option<String>,
    id_token: Option<String>,
}

impl FirestoreStore {
    /// Store for the `(default)` database of a project
    pub fn new(project_id: &str, api_key: Option<String>) -> Self {
        Self::with_endpoint(FIRESTORE_API, project_id, "(default)", api_key)
    }

    /// Store against an explicit endpoint and database (emulators, named databases)
    pub fn with_endpoint(endpoint: &str, project_id: &str, database: &str, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            documents_url: format!(
                "{}/projects/{}/databases/{}/documents",
                endpoint.trim_end_matches('/'),
                project_id,
                database
            ),
            api_key,
            id_token: None,
        }
    }

    /// Authenticate requests as a signed-in user
    pub fn with_id_token(mut self, id_token: impl Into<String>) -> Self {
        self.id_token = Some(id_token.into());
        self
    }

    pub fn documents_url(&self) -> &str {
        &self.documents_url
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.documents_url, collection)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_url, collection, id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        };
        match &self.id_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn json_body(response: Response) -> StoreResult<Value> {
        response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Unavailable(format!("invalid response body: {}", e)))
    }

    async fn merge_write(&self, collection: &str, id: &str, partial: Fields, must_exist: bool) -> StoreResult<()> {
        // a PATCH without updateMask replaces the whole document
        if partial.is_empty() {
            log::debug!("firestore merge write {}/{} skipped, no fields", collection, id);
            if must_exist && self.get(collection, id).await?.is_none() {
                return Err(StoreError::not_found(collection, id));
            }
            return Ok(());
        }

        log::debug!("firestore merge write {}/{} ({} fields)", collection, id, partial.len());
        let request = self
            .client
            .patch(self.document_url(collection, id))
            .query(&merge_query(&partial, must_exist))
            .json(&json!({ "fields": encode_fields(partial) }));
        let response = self.send(request).await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND if must_exist => Err(StoreError::not_found(collection, id)),
            status => Err(write_error(status, response).await),
        }
    }
}

/// Query of a merge write: one mask path per supplied field, plus the
/// existence precondition for updates
fn merge_query(partial: &Fields, must_exist: bool) -> Vec<(&'static str, String)> {
    let mut query: Vec<(&'static str, String)> = partial
        .keys()
        .map(|field| ("updateMask.fieldPaths", field.clone()))
        .collect();
    if must_exist {
        query.push(("currentDocument.exists", "true".to_string()));
    }
    query
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn fetch_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            log::debug!("firestore list {} (page token: {:?})", collection, page_token);
            let request = self.client.get(self.collection_url(collection)).query(&query);
            let response = self.send(request).await?;
            if !response.status().is_success() {
                return Err(read_error(response).await);
            }

            let body = Self::json_body(response).await?;
            if let Some(docs) = body.get("documents").and_then(Value::as_array) {
                for doc in docs {
                    documents.push(decode_document(doc)?);
                }
            }

            page_token = body
                .get("nextPageToken")
                .and_then(Value::as_str)
                .map(str::to_string);
            if page_token.is_none() {
                return Ok(documents);
            }
        }
    }

    async fn fetch_by_filter(&self, collection: &str, filter: &FieldFilter) -> StoreResult<Vec<Document>> {
        log::debug!("firestore query {} where {} == {}", collection, filter.field, filter.value);
        let request = self
            .client
            .post(format!("{}:runQuery", self.documents_url))
            .json(&structured_query(collection, filter));
        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(read_error(response).await);
        }

        let body = Self::json_body(response).await?;
        let rows = body.as_array().cloned().unwrap_or_default();
        rows.iter()
            .filter_map(|row| row.get("document"))
            .map(decode_document)
            .collect()
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        log::debug!("firestore get {}/{}", collection, id);
        let response = self.send(self.client.get(self.document_url(collection, id))).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = Self::json_body(response).await?;
                decode_document(&body).map(Some)
            }
            _ => Err(read_error(response).await),
        }
    }

    async fn create(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        log::debug!("firestore create in {} ({} fields)", collection, fields.len());
        let request = self
            .client
            .post(self.collection_url(collection))
            .json(&json!({ "fields": encode_fields(fields) }));
        let response = self.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(write_error(status, response).await);
        }

        let body = Self::json_body(response).await?;
        body.get("name")
            .and_then(Value::as_str)
            .and_then(document_id)
            .map(str::to_string)
            .ok_or_else(|| StoreError::Unavailable("create response without document name".to_string()))
    }

    async fn update(&self, collection: &str, id: &str, partial: Fields) -> StoreResult<()> {
        self.merge_write(collection, id, partial, true).await
    }

    async fn upsert(&self, collection: &str, id: &str, partial: Fields) -> StoreResult<()> {
        self.merge_write(collection, id, partial, false).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        log::debug!("firestore delete {}/{}", collection, id);
        let response = self.send(self.client.delete(self.document_url(collection, id))).await?;
        match response.status() {
            status if status.is_success() || status == StatusCode::NOT_FOUND => Ok(()),
            _ => Err(read_error(response).await),
        }
    }
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    format!("{}: {}", status, message)
}

async fn read_error(response: Response) -> StoreError {
    StoreError::Unavailable(error_message(response).await)
}

async fn write_error(status: StatusCode, response: Response) -> StoreError {
    let message = error_message(response).await;
    if status == StatusCode::BAD_REQUEST {
        StoreError::WriteRejected(message)
    } else {
        StoreError::Unavailable(message)
    }
}

/// Last path segment of a resource name (`projects/.../documents/pets/<id>`)
fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty())
}

fn structured_query(collection: &str, filter: &FieldFilter) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": filter.field },
                    "op": "EQUAL",
                    "value": encode_value(filter.value.clone()),
                }
            }
        }
    })
}

/// Decode a REST document resource
pub(crate) fn decode_document(resource: &Value) -> StoreResult<Document> {
    let id = resource
        .get("name")
        .and_then(Value::as_str)
        .and_then(document_id)
        .ok_or_else(|| StoreError::Unavailable("document without name".to_string()))?;

    let fields = match resource.get("fields") {
        Some(Value::Object(fields)) => decode_fields(fields),
        _ => Map::new(),
    };
    Ok(Document::new(id, fields))
}

pub(crate) fn encode_fields(fields: Fields) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key, encode_value(value)))
            .collect(),
    )
}

pub(crate) fn decode_fields(fields: &Map<String, Value>) -> Fields {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

/// JSON value to Firestore typed value
pub(crate) fn encode_value(value: Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // 64-bit integers are sent as strings
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.into_iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Firestore typed value to JSON value
pub(crate) fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|obj| obj.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "booleanValue" => inner.clone(),
        "integerValue" => match inner {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            other => other.clone(),
        },
        "doubleValue" => inner.clone(),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_scalar_encoding() {
        assert_eq!(encode_value(json!("Rex")), json!({ "stringValue": "Rex" }));
        assert_eq!(encode_value(json!(true)), json!({ "booleanValue": true }));
        assert_eq!(encode_value(json!(3)), json!({ "integerValue": "3" }));
        assert_eq!(encode_value(json!(1.5)), json!({ "doubleValue": 1.5 }));
        assert_eq!(encode_value(Value::Null), json!({ "nullValue": null }));
    }

    #[test]
    fn test_nested_values_survive_codec() {
        let value = json!({ "tags": ["calm", "small"], "owner": { "name": "Ana", "age": 31 } });
        assert_eq!(decode_value(&encode_value(value.clone())), value);
    }

    #[test]
    fn test_decode_document_resource() {
        let resource = json!({
            "name": "projects/demo/databases/(default)/documents/pets/abc123",
            "fields": {
                "name": { "stringValue": "Thor" },
                "favorited": { "booleanValue": false },
                "createdAt": { "timestampValue": "2024-05-01T10:00:00Z" }
            }
        });
        let doc = decode_document(&resource).unwrap();
        assert_eq!(doc.id, "abc123");
        assert_eq!(doc.fields.get("name"), Some(&json!("Thor")));
        assert_eq!(doc.fields.get("favorited"), Some(&json!(false)));
        assert_eq!(doc.fields.get("createdAt"), Some(&json!("2024-05-01T10:00:00Z")));
    }

    #[test]
    fn test_decode_document_without_fields() {
        let doc = decode_document(&json!({ "name": "projects/p/databases/d/documents/users/u1" })).unwrap();
        assert_eq!(doc.id, "u1");
        assert!(doc.fields.is_empty());
    }

    #[test]
    fn test_decode_document_requires_name() {
        assert!(matches!(
            decode_document(&json!({ "fields": {} })),
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn test_unknown_value_kind_decodes_to_null() {
        assert_eq!(decode_value(&json!({ "futureValue": 1 })), Value::Null);
        assert_eq!(decode_value(&json!("bare")), Value::Null);
    }

    #[test]
    fn test_urls() {
        let store = FirestoreStore::new("adoteme", Some("key".into()));
        assert_eq!(
            store.documents_url(),
            "https://firestore.googleapis.com/v1/projects/adoteme/databases/(default)/documents"
        );
        assert_eq!(
            store.document_url("pets", "p1"),
            "https://firestore.googleapis.com/v1/projects/adoteme/databases/(default)/documents/pets/p1"
        );

        let emulator = FirestoreStore::with_endpoint("http://localhost:8080/v1/", "demo", "(default)", None);
        assert_eq!(emulator.collection_url("users"), "http://localhost:8080/v1/projects/demo/databases/(default)/documents/users");
    }

    #[test]
    fn test_merge_query_masks_every_field() {
        let partial: Fields = serde_json::from_value(json!({ "name": "Ana", "phone": "" })).unwrap();

        let upsert = merge_query(&partial, false);
        assert_eq!(
            upsert,
            vec![
                ("updateMask.fieldPaths", "name".to_string()),
                ("updateMask.fieldPaths", "phone".to_string()),
            ]
        );

        let update = merge_query(&partial, true);
        assert_eq!(update.last(), Some(&("currentDocument.exists", "true".to_string())));
    }

    /// Answer one HTTP request with `status` and hand back the request head
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/v1", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let head_end = received.windows(4).position(|w| w == b"\r\n\r\n");
                if let Some(end) = head_end {
                    let head = String::from_utf8_lossy(&received[..end]).to_lowercase();
                    let length = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if received.len() >= end + 4 + length {
                        break;
                    }
                }
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&received).into_owned()
        });
        (endpoint, handle)
    }

    #[tokio::test]
    async fn test_empty_upsert_sends_nothing() {
        // nothing listens here; any request would fail as Unavailable
        let store = FirestoreStore::with_endpoint("http://127.0.0.1:9/v1", "p", "(default)", None);
        store.upsert("users", "ana", Fields::new()).await.expect("empty merge is a no-op");
    }

    #[tokio::test]
    async fn test_empty_update_checks_existence_only() {
        let (endpoint, request) = serve_once("404 Not Found", "").await;
        let store = FirestoreStore::with_endpoint(&endpoint, "p", "(default)", None);

        let err = store.update("users", "ghost", Fields::new()).await.unwrap_err();
        assert_eq!(err, StoreError::not_found("users", "ghost"));

        let head = request.await.unwrap();
        assert!(head.starts_with("GET /v1/projects/p/databases/(default)/documents/users/ghost"));
    }

    #[tokio::test]
    async fn test_merge_write_sends_update_mask() {
        let (endpoint, request) = serve_once("200 OK", "{}").await;
        let store = FirestoreStore::with_endpoint(&endpoint, "p", "(default)", None);

        let partial: Fields = serde_json::from_value(json!({ "phone": "555" })).unwrap();
        store.upsert("users", "ana", partial).await.unwrap();

        let head = request.await.unwrap();
        let line = head.lines().next().unwrap();
        assert!(line.starts_with("PATCH "));
        assert!(line.contains("updateMask.fieldPaths=phone"));
        assert!(!line.contains("currentDocument.exists"));
    }

    #[test]
    fn test_structured_query_shape() {
        let query = structured_query("pets", &FieldFilter::eq("uid", "owner-7"));
        assert_eq!(query.pointer("/structuredQuery/from/0/collectionId"), Some(&json!("pets")));
        assert_eq!(
            query.pointer("/structuredQuery/where/fieldFilter/value"),
            Some(&json!({ "stringValue": "owner-7" }))
        );
        assert_eq!(query.pointer("/structuredQuery/where/fieldFilter/op"), Some(&json!("EQUAL")));
    }
}
