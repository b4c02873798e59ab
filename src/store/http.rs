use super::ObjectStore;
use crate::error::StoreError;
use crate::types::ObjectDescriptor;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, Event};
use quick_xml::reader::Reader;
use reqwest::StatusCode;
use tracing::debug;

/// Characters left as-is in a key segment (RFC 3986 unreserved).
const KEY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Upper bound on the buffer reserved up front from a `Content-Length` header.
const MAX_INITIAL_CAPACITY: u64 = 8 << 20;

/// Unauthenticated access to a public S3-compatible endpoint.
///
/// Uses path-style URLs: the bucket is listed at `{endpoint}/{bucket}` with
/// the ListObjectsV2 query API and objects are fetched from
/// `{endpoint}/{bucket}/{key}`.
pub struct HttpStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self { client, endpoint }
    }

    fn bucket_url(&self, bucket: &str) -> String {
        format!("{}/{}", self.endpoint, bucket)
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        let encoded = key
            .split('/')
            .map(|segment| utf8_percent_encode(segment, KEY_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}/{}", self.endpoint, bucket, encoded)
    }
}

#[async_trait::async_trait]
impl ObjectStore for HttpStore {
    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectDescriptor>, StoreError> {
        let url = self.bucket_url(bucket);
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).query(&[("list-type", "2")]);
            if let Some(token) = &continuation_token {
                request = request.query(&[("continuation-token", token.as_str())]);
            }

            let response = request.send().await?;
            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(StoreError::NoSuchBucket(bucket.to_string()));
            }
            if !status.is_success() {
                return Err(StoreError::Status { status, url });
            }

            let body = response.text().await?;
            let page = parse_list_page(&body)?;
            debug!(
                "Listed {} objects from {} (truncated: {})",
                page.objects.len(),
                url,
                page.is_truncated
            );
            objects.extend(page.objects);

            if !page.is_truncated {
                break;
            }
            match page.next_continuation_token {
                Some(token) => continuation_token = Some(token),
                None => {
                    return Err(StoreError::Xml(
                        "truncated listing without NextContinuationToken".to_string(),
                    ))
                }
            }
        }

        Ok(objects)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        let url = self.object_url(bucket, key);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NoSuchKey(key.to_string()));
        }
        if !status.is_success() {
            return Err(StoreError::Status { status, url });
        }

        let mut body = BytesMut::with_capacity(initial_capacity(response.content_length()));
        let mut byte_stream = response.bytes_stream();
        while let Some(piece) = byte_stream.next().await {
            body.extend_from_slice(&piece?);
        }

        Ok(body.freeze())
    }
}

/// The header is only a hint; the buffer grows past the cap as data arrives.
fn initial_capacity(content_length: Option<u64>) -> usize {
    content_length.unwrap_or(0).min(MAX_INITIAL_CAPACITY) as usize
}

/// One page of a ListObjectsV2 response.
#[derive(Debug, Default)]
struct ListPage {
    objects: Vec<ObjectDescriptor>,
    is_truncated: bool,
    next_continuation_token: Option<String>,
}

fn resolve_reference(reference: &BytesRef<'_>) -> Result<String, StoreError> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|e| StoreError::Xml(e.to_string()))?
    {
        return Ok(ch.to_string());
    }
    let raw: &[u8] = reference;
    let name = String::from_utf8_lossy(raw);
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| StoreError::Xml(format!("unknown entity &{};", name)))
}

/// Parses a `ListBucketResult` document.
fn parse_list_page(xml: &str) -> Result<ListPage, StoreError> {
    let mut reader = Reader::from_str(xml);
    let mut page = ListPage::default();

    let mut saw_root = false;
    let mut in_contents = false;
    let mut text = String::new();
    let mut key: Option<String> = None;
    let mut size: Option<u64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if !saw_root {
                    if name.as_ref() != b"ListBucketResult" {
                        return Err(StoreError::Xml(format!(
                            "expected ListBucketResult, found {}",
                            String::from_utf8_lossy(name.as_ref())
                        )));
                    }
                    saw_root = true;
                }
                if name.as_ref() == b"Contents" {
                    in_contents = true;
                    key = None;
                    size = None;
                }
                text.clear();
            }
            Ok(Event::Text(e)) => text.push_str(&String::from_utf8_lossy(e.as_ref())),
            Ok(Event::CData(e)) => text.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Ok(Event::GeneralRef(e)) => text.push_str(&resolve_reference(&e)?),
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"Key" if in_contents => key = Some(std::mem::take(&mut text)),
                    b"Size" if in_contents => size = text.trim().parse().ok(),
                    b"Contents" => {
                        in_contents = false;
                        if let Some(key) = key.take() {
                            page.objects.push(ObjectDescriptor::new(key, size.take()));
                        }
                    }
                    b"IsTruncated" => page.is_truncated = text.trim() == "true",
                    b"NextContinuationToken" => {
                        page.next_continuation_token = Some(std::mem::take(&mut text))
                    }
                    _ => {}
                }
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(StoreError::Xml(format!(
                    "error at position {}: {}",
                    reader.error_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if !saw_root {
        return Err(StoreError::Xml("empty listing document".to_string()));
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRUNCATED_PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>site</Name>
  <Prefix></Prefix>
  <KeyCount>3</KeyCount>
  <MaxKeys>3</MaxKeys>
  <IsTruncated>true</IsTruncated>
  <NextContinuationToken>1ueGcxLPRx1Tr/XYExHnhbYLgveDs2J/wm36Hy4vbOwM=</NextContinuationToken>
  <Contents>
    <Key>a/</Key>
    <LastModified>2024-01-01T00:00:00.000Z</LastModified>
    <Size>0</Size>
  </Contents>
  <Contents>
    <Key>a/b.txt</Key>
    <ETag>&quot;5d41402abc4b2a76b9719d911017c592&quot;</ETag>
    <Size>5</Size>
  </Contents>
  <Contents>
    <Key>tom &amp; jerry/&#233;t&#xE9;.txt</Key>
    <Size>12</Size>
  </Contents>
</ListBucketResult>"#;

    #[test]
    fn test_parse_truncated_page() {
        let page = parse_list_page(TRUNCATED_PAGE).unwrap();

        assert!(page.is_truncated);
        assert_eq!(
            page.next_continuation_token.as_deref(),
            Some("1ueGcxLPRx1Tr/XYExHnhbYLgveDs2J/wm36Hy4vbOwM=")
        );
        assert_eq!(
            page.objects,
            vec![
                ObjectDescriptor::new("a/", Some(0)),
                ObjectDescriptor::new("a/b.txt", Some(5)),
                ObjectDescriptor::new("tom & jerry/été.txt", Some(12)),
            ]
        );
    }

    #[test]
    fn test_parse_last_page() {
        let xml = "<ListBucketResult><IsTruncated>false</IsTruncated>\
                   <Contents><Key>c.txt</Key><Size>5</Size></Contents></ListBucketResult>";
        let page = parse_list_page(xml).unwrap();

        assert!(!page.is_truncated);
        assert!(page.next_continuation_token.is_none());
        assert_eq!(page.objects, vec![ObjectDescriptor::new("c.txt", Some(5))]);
    }

    #[test]
    fn test_parse_rejects_error_document() {
        let xml = "<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>";
        assert!(matches!(parse_list_page(xml), Err(StoreError::Xml(_))));
        assert!(matches!(parse_list_page(""), Err(StoreError::Xml(_))));
    }

    #[test]
    fn test_parse_cdata_key() {
        let xml = "<ListBucketResult><IsTruncated>false</IsTruncated>\
                   <Contents><Key><![CDATA[a&b <1>.txt]]></Key><Size>3</Size></Contents>\
                   </ListBucketResult>";
        let page = parse_list_page(xml).unwrap();

        assert_eq!(page.objects, vec![ObjectDescriptor::new("a&b <1>.txt", Some(3))]);
    }

    #[test]
    fn test_initial_capacity_is_capped() {
        assert_eq!(initial_capacity(None), 0);
        assert_eq!(initial_capacity(Some(5)), 5);
        assert_eq!(initial_capacity(Some(u64::MAX)), MAX_INITIAL_CAPACITY as usize);
    }

    #[tokio::test]
    async fn test_lying_content_length_is_an_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 4611686018427387904\r\n\r\nabc")
                .await;
            let _ = socket.shutdown().await;
        });

        let store = HttpStore::new(format!("http://{}", addr));
        assert!(store.get_object("b", "k").await.is_err());
    }

    #[test]
    fn test_object_url_encodes_segments() {
        let store = HttpStore::new("http://localhost:9000/");
        assert_eq!(
            store.object_url("site", "docs/read me+1.txt"),
            "http://localhost:9000/site/docs/read%20me%2B1.txt"
        );
        assert_eq!(store.bucket_url("site"), "http://localhost:9000/site");
    }
}
