//! Result cursor for `select`
//!
//! A cursor holds the handle the node returned when the query was opened and
//! pulls one record per `db_next` call. Once the node answers with an empty
//! result the cursor is exhausted and makes no further requests.

use ebakusdb_core::error::to_query_error;
use ebakusdb_core::{EbakusDbError, Record, Result};
use futures_util::stream::{self, Stream};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::connection::Connection;

/// Forward-only iterator over query results
#[derive(Debug)]
pub struct Cursor<'a> {
    connection: &'a Connection,
    handle: Value,
    done: bool,
}

/// Whether a `db_next` answer marks the end of the results
fn is_end(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(connection: &'a Connection, handle: Value) -> Self {
        Self {
            connection,
            handle,
            done: false,
        }
    }

    /// Whether the cursor has been exhausted
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Next record, `None` once the results are exhausted
    pub async fn next(&mut self) -> Result<Option<Record>> {
        if self.done {
            return Ok(None);
        }

        let value = self.connection.db_next(&self.handle).await.map_err(|e| {
            EbakusDbError::Query(format!("Failed to read next entry in table: {}", e))
        })?;

        if is_end(&value) {
            debug!("Cursor {} exhausted", self.handle);
            self.done = true;
            return Ok(None);
        }

        match value {
            Value::Object(record) => Ok(Some(record)),
            other => Err(EbakusDbError::Query(format!(
                "Failed to read next entry in table: unexpected entry {}",
                other
            ))),
        }
    }

    /// Next record decoded into a caller type
    pub async fn next_as<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        match self.next().await? {
            Some(record) => serde_json::from_value(Value::Object(record))
                .map(Some)
                .map_err(to_query_error),
            None => Ok(None),
        }
    }

    /// Consume the cursor as a stream of records
    pub fn into_stream(self) -> impl Stream<Item = Result<Record>> + 'a {
        stream::try_unfold(self, |mut cursor| async move {
            Ok(cursor.next().await?.map(|record| (record, cursor)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{mock_rpc, remote_client, rpc_result};
    use futures_util::TryStreamExt;
    use mockito::{Matcher, Server};
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_test::assert_ok;

    const HANDLE: &str = "0x5";

    async fn mock_select(server: &mut mockito::ServerGuard) {
        mock_rpc(server, "db_select", json!(HANDLE)).await;
    }

    /// Serve `count` records from `db_next`, then an empty answer
    async fn mock_records(server: &mut mockito::ServerGuard, count: usize) -> mockito::Mock {
        let served = Arc::new(AtomicUsize::new(0));
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "method": "db_next", "params": [HANDLE] })))
            .with_header("content-type", "application/json")
            .with_body_from_request(move |_| {
                let n = served.fetch_add(1, Ordering::SeqCst);
                let result = if n < count {
                    json!({ "Id": n, "Name": format!("user{}", n) })
                } else {
                    Value::Null
                };
                rpc_result(result).into_bytes()
            })
            .expect(count + 1)
            .create_async()
            .await
    }

    #[test]
    fn test_end_marker() {
        assert!(is_end(&Value::Null));
        assert!(is_end(&json!(false)));
        assert!(is_end(&json!(0)));
        assert!(is_end(&json!("")));
        assert!(!is_end(&json!({ "Id": 0 })));
        assert!(!is_end(&json!(1)));
    }

    #[tokio::test]
    async fn test_empty_result_ends_immediately() {
        let mut server = Server::new_async().await;
        mock_select(&mut server).await;
        let next = mock_records(&mut server, 0).await;

        let client = remote_client(&server);
        let mut cursor = client.select("Users", "", "", None).await.unwrap();

        assert!(cursor.next().await.unwrap().is_none());
        assert!(cursor.is_done());
        // Exhausted cursors do not hit the node again
        assert!(cursor.next().await.unwrap().is_none());
        next.assert_async().await;
    }

    #[tokio::test]
    async fn test_yields_every_record() {
        let mut server = Server::new_async().await;
        mock_select(&mut server).await;
        let next = mock_records(&mut server, 3).await;

        let client = remote_client(&server);
        let mut cursor = assert_ok!(client.select("Users", "Id >= 0", "Id ASC", None).await);

        let mut names = Vec::new();
        while let Some(record) = cursor.next().await.unwrap() {
            names.push(record["Name"].as_str().unwrap().to_string());
        }

        assert_eq!(names, vec!["user0", "user1", "user2"]);
        next.assert_async().await;
    }

    #[tokio::test]
    async fn test_next_as_and_stream() {
        #[derive(Debug, Deserialize, PartialEq)]
        #[serde(rename_all = "PascalCase")]
        struct Entry {
            id: u64,
            name: String,
        }

        let mut server = Server::new_async().await;
        mock_select(&mut server).await;
        mock_records(&mut server, 2).await;

        let client = remote_client(&server);
        let mut cursor = client.select("Users", "", "", None).await.unwrap();
        let first: Option<Entry> = cursor.next_as().await.unwrap();
        assert_eq!(
            first,
            Some(Entry {
                id: 0,
                name: "user0".to_string()
            })
        );

        let rest: Vec<Record> = cursor.into_stream().try_collect().await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0]["Id"], json!(1));
    }

    #[tokio::test]
    async fn test_advance_failure_is_query_error() {
        let mut server = Server::new_async().await;
        mock_select(&mut server).await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "method": "db_next" })))
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "error": { "code": -32000, "message": "iterator released" },
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = remote_client(&server);
        let mut cursor = client.select("Users", "", "", None).await.unwrap();
        let err = cursor.next().await.unwrap_err();

        match err {
            EbakusDbError::Query(msg) => {
                assert!(msg.starts_with("Failed to read next entry in table"));
            }
            other => panic!("Expected Query error, got {:?}", other),
        }
    }
}
