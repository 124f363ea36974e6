use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures_util::StreamExt;
use reqwest::{Client, Method, StatusCode};

use super::{path as path_security, ByteStream, FileStat, SiteStore, StoreError};
use crate::registry::Project;

/// S3-compatible object store backend.
///
/// Talks the S3 REST API directly with AWS Signature V4 request signing and
/// path-style addressing, so it works against AWS as well as MinIO-style
/// endpoints. A project's namespace is the key prefix `<folder>/`; there are
/// no true directories, so namespace creation is a validated no-op.
pub struct S3Store {
    bucket: String,
    region: String,
    access_key: String,
    secret_key: String,
    endpoint: String,
    host: String,
    client: Client,
}

impl S3Store {
    pub fn new(
        endpoint: &str,
        region: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Self, anyhow::Error> {
        let client = Client::builder().build()?;

        let url = reqwest::Url::parse(endpoint)?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => anyhow::bail!("S3 endpoint has no host: {endpoint}"),
        };

        Ok(Self {
            bucket: bucket.to_string(),
            region: region.to_string(),
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            host,
            client,
        })
    }

    fn key_for(&self, project: &Project, path: &str) -> Result<String, StoreError> {
        path_security::object_key(&project.folder, path)
    }

    fn canonical_uri(&self, key: Option<&str>) -> String {
        match key {
            Some(key) => format!("/{}/{}", self.bucket, uri_encode(key, false)),
            None => format!("/{}", self.bucket),
        }
    }

    fn authorization(
        &self,
        method: &str,
        canonical_uri: &str,
        canonical_query: &str,
        payload_hash: &str,
        amz_date: &str,
    ) -> String {
        let date = &amz_date[..8];
        let canonical_headers = format!(
            "host:{}\nx-amz-content-sha256:{payload_hash}\nx-amz-date:{amz_date}\n",
            self.host
        );
        let signed_headers = "host;x-amz-content-sha256;x-amz-date";
        let canonical_request = format!(
            "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
        );

        let scope = format!("{date}/{}/s3/aws4_request", self.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
            hex(&sha256(canonical_request.as_bytes()))
        );

        let k_date = hmac_sha256(format!("AWS4{}", self.secret_key).as_bytes(), date.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, b"s3");
        let k_signing = hmac_sha256(&k_service, b"aws4_request");
        let signature = hex(&hmac_sha256(&k_signing, string_to_sign.as_bytes()));

        format!(
            "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.access_key
        )
    }

    /// Send one signed request. Query pairs are canonicalized (encoded and
    /// sorted) identically for the signature and the wire.
    async fn send(
        &self,
        method: Method,
        key: Option<&str>,
        query: &[(&str, &str)],
        body: Option<Bytes>,
    ) -> Result<reqwest::Response, StoreError> {
        let canonical_uri = self.canonical_uri(key);

        let mut pairs: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (uri_encode(k, true), uri_encode(v, true)))
            .collect();
        pairs.sort();
        let canonical_query = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let payload_hash = hex(&sha256(body.as_deref().unwrap_or(&[])));
        let amz_date = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let authorization = self.authorization(
            method.as_str(),
            &canonical_uri,
            &canonical_query,
            &payload_hash,
            &amz_date,
        );

        let mut url = format!("{}{canonical_uri}", self.endpoint);
        if !canonical_query.is_empty() {
            url.push('?');
            url.push_str(&canonical_query);
        }

        let mut request = self
            .client
            .request(method, &url)
            .header("x-amz-date", amz_date)
            .header("x-amz-content-sha256", payload_hash)
            .header("Authorization", authorization);
        if let Some(body) = body {
            request = request.body(body);
        }

        request
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    /// Distinguish a plain miss from a key that only exists as a prefix of
    /// other keys. The latter is the flat-key analog of a directory and is
    /// rejected the same way the filesystem backend rejects one.
    async fn classify_miss(&self, project: &Project, path: &str) -> StoreError {
        let Ok(key) = self.key_for(project, path) else {
            return StoreError::NotFound(path.to_string());
        };
        let prefix = format!("{key}/");
        match self.list_page(&prefix, None, Some("1")).await {
            Ok((keys, _)) if !keys.is_empty() => StoreError::NotAFile(path.to_string()),
            _ => StoreError::NotFound(path.to_string()),
        }
    }

    /// One ListObjectsV2 page: returns the keys and, when the listing is
    /// truncated, the continuation token for the next page.
    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<&str>,
        max_keys: Option<&str>,
    ) -> Result<(Vec<String>, Option<String>), StoreError> {
        let mut query: Vec<(&str, &str)> = vec![("list-type", "2"), ("prefix", prefix)];
        if let Some(token) = continuation {
            query.push(("continuation-token", token));
        }
        if let Some(max) = max_keys {
            query.push(("max-keys", max));
        }

        let resp = self.send(Method::GET, None, &query, None).await?;
        if !resp.status().is_success() {
            return Err(backend_error("S3 list", resp).await);
        }

        let xml = resp
            .text()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let keys = xml_values(&xml, "Key");
        let truncated = xml_value(&xml, "IsTruncated").as_deref() == Some("true");
        let token = if truncated {
            xml_value(&xml, "NextContinuationToken")
        } else {
            None
        };
        Ok((keys, token))
    }
}

#[async_trait]
impl SiteStore for S3Store {
    async fn read(&self, project: &Project, path: &str) -> Result<Bytes, StoreError> {
        let key = self.key_for(project, path)?;
        let resp = self.send(Method::GET, Some(&key), &[], None).await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(self.classify_miss(project, path).await);
        }
        if !resp.status().is_success() {
            return Err(backend_error("S3 download", resp).await);
        }

        resp.bytes()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn write_bytes(
        &self,
        project: &Project,
        path: &str,
        content: Bytes,
    ) -> Result<(), StoreError> {
        let key = self.key_for(project, path)?;
        let resp = self.send(Method::PUT, Some(&key), &[], Some(content)).await?;

        if !resp.status().is_success() {
            return Err(backend_error("S3 upload", resp).await);
        }
        Ok(())
    }

    async fn delete(&self, project: &Project, path: &str) -> Result<(), StoreError> {
        // Existence/type check first: bare S3 DELETE succeeds for missing keys.
        self.stat(project, path).await?;

        let key = self.key_for(project, path)?;
        let resp = self.send(Method::DELETE, Some(&key), &[], None).await?;

        // 404 here means a concurrent delete won -- the object is gone.
        if !resp.status().is_success() && resp.status() != StatusCode::NOT_FOUND {
            return Err(backend_error("S3 delete", resp).await);
        }
        Ok(())
    }

    async fn exists(&self, project: &Project, path: &str) -> bool {
        let Ok(key) = self.key_for(project, path) else {
            return false;
        };
        match self.send(Method::HEAD, Some(&key), &[], None).await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn stat(&self, project: &Project, path: &str) -> Result<FileStat, StoreError> {
        let key = self.key_for(project, path)?;
        let resp = self.send(Method::HEAD, Some(&key), &[], None).await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(self.classify_miss(project, path).await);
        }
        if !resp.status().is_success() {
            return Err(backend_error("S3 head", resp).await);
        }

        let size = resp
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let modified = resp
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| chrono::DateTime::parse_from_rfc2822(v).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(FileStat { size, modified })
    }

    async fn list(&self, project: &Project) -> Result<Vec<String>, StoreError> {
        let prefix = format!("{}/", project.folder);

        let mut files = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let (keys, token) = self
                .list_page(&prefix, continuation.as_deref(), None)
                .await?;
            for key in keys {
                // Synthetic namespace markers have no body to serve.
                if key.ends_with('/') {
                    continue;
                }
                if let Some(rel) = key.strip_prefix(&prefix) {
                    files.push(rel.to_string());
                }
            }
            match token {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }
        Ok(files)
    }

    async fn read_stream(&self, project: &Project, path: &str) -> Result<ByteStream, StoreError> {
        let key = self.key_for(project, path)?;
        let resp = self.send(Method::GET, Some(&key), &[], None).await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(self.classify_miss(project, path).await);
        }
        if !resp.status().is_success() {
            return Err(backend_error("S3 download", resp).await);
        }

        let stream = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| StoreError::Backend(e.to_string())));
        Ok(Box::pin(stream))
    }

    async fn ensure_namespace(&self, _project: &Project, path: &str) -> Result<(), StoreError> {
        // The namespace is virtual; only the containment check matters.
        path_security::normalize(path)?;
        Ok(())
    }
}

async fn backend_error(context: &str, resp: reqwest::Response) -> StoreError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    StoreError::Backend(format!("{context} failed ({status}): {body}"))
}

/// URI-encode per SigV4: unreserved characters pass through, everything else
/// becomes uppercase percent escapes. `/` survives in object paths but not in
/// query values.
fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            b'/' if !encode_slash => out.push('/'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

fn sha256(data: &[u8]) -> Vec<u8> {
    ring::digest::digest(&ring::digest::SHA256, data)
        .as_ref()
        .to_vec()
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key);
    ring::hmac::sign(&key, data).as_ref().to_vec()
}

/// Pull every `<tag>...</tag>` text value out of a ListObjectsV2 response.
/// The handful of entities S3 emits are unescaped; nested markup never occurs
/// in the fields read here.
fn xml_values(xml: &str, tag: &str) -> Vec<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut values = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        let Some(end) = after.find(&close) else { break };
        values.push(xml_unescape(&after[..end]));
        rest = &after[end + close.len()..];
    }
    values
}

fn xml_value(xml: &str, tag: &str) -> Option<String> {
    xml_values(xml, tag).into_iter().next()
}

fn xml_unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_encode_keeps_object_path_slashes() {
        assert_eq!(uri_encode("demo/css/site.css", false), "demo/css/site.css");
        assert_eq!(uri_encode("a b+c", false), "a%20b%2Bc");
        assert_eq!(uri_encode("a/b", true), "a%2Fb");
    }

    #[test]
    fn xml_scan_extracts_keys_and_token() {
        let xml = "<ListBucketResult>\
                   <IsTruncated>true</IsTruncated>\
                   <Contents><Key>demo/index.html</Key></Contents>\
                   <Contents><Key>demo/a&amp;b.txt</Key></Contents>\
                   <NextContinuationToken>token-1</NextContinuationToken>\
                   </ListBucketResult>";
        assert_eq!(
            xml_values(xml, "Key"),
            vec!["demo/index.html".to_string(), "demo/a&b.txt".to_string()]
        );
        assert_eq!(xml_value(xml, "IsTruncated").as_deref(), Some("true"));
        assert_eq!(
            xml_value(xml, "NextContinuationToken").as_deref(),
            Some("token-1")
        );
    }

    #[test]
    fn hex_lowercase() {
        assert_eq!(hex(&[0x00, 0xab, 0xff]), "00abff");
    }
}
