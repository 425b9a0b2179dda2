use crate::traits::{
    validate_key, SignedUpload, Storage, StorageError, StorageResult, StoredObject,
};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::time::Duration;
use subtle::ConstantTimeEq;
use tokio::fs;
use tokio::io::AsyncWriteExt;

type HmacSha256 = Hmac<Sha256>;

/// Local filesystem storage implementation
///
/// Objects live under `{base_path}/{bucket}/{key}`. Upload and read URLs point back at
/// this service (`/storage/upload/...` and `/storage/object/...`) and carry a token of the
/// form `{expires_unix}.{hex hmac}` bound to the method, bucket, key and, for uploads,
/// the content type.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
    bucket: String,
    base_url: String,
    secret: Vec<u8>,
    public: bool,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory shared by all buckets (e.g., "/var/lib/kongre/storage")
    /// * `bucket` - Bucket served by this instance
    /// * `base_url` - Public base URL of the service (e.g., "http://localhost:4000")
    /// * `secret` - Signing secret for upload and read tokens
    /// * `public` - Whether objects can be read without a token
    pub async fn new(
        base_path: impl Into<PathBuf>,
        bucket: impl Into<String>,
        base_url: impl Into<String>,
        secret: impl AsRef<[u8]>,
        public: bool,
    ) -> StorageResult<Self> {
        let bucket = bucket.into();
        validate_key(&bucket)?;
        if bucket.contains('/') {
            return Err(StorageError::ConfigError(format!(
                "Invalid bucket name: {}",
                bucket
            )));
        }
        let root = base_path.into().join(&bucket);

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            root,
            bucket,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.as_ref().to_vec(),
            public,
        })
    }

    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;
        Ok(self.root.join(storage_key))
    }

    fn mac(
        &self,
        method: &str,
        storage_key: &str,
        content_type: &str,
        expires: i64,
    ) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        mac.update(method.as_bytes());
        mac.update(b"\n");
        mac.update(self.bucket.as_bytes());
        mac.update(b"\n");
        mac.update(storage_key.as_bytes());
        mac.update(b"\n");
        mac.update(content_type.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    fn sign(
        &self,
        method: &str,
        storage_key: &str,
        content_type: &str,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<String> {
        let expires = expires_at.timestamp();
        let signature = self
            .mac(method, storage_key, content_type, expires)?
            .finalize()
            .into_bytes();
        Ok(format!("{}.{}", expires, hex::encode(signature)))
    }

    fn verify(
        &self,
        method: &str,
        storage_key: &str,
        content_type: &str,
        token: &str,
    ) -> StorageResult<()> {
        let (expires, signature) = token.split_once('.').ok_or(StorageError::InvalidToken)?;
        let expires: i64 = expires.parse().map_err(|_| StorageError::InvalidToken)?;
        let provided = hex::decode(signature).map_err(|_| StorageError::InvalidToken)?;

        if expires < Utc::now().timestamp() {
            return Err(StorageError::InvalidToken);
        }

        let expected = self
            .mac(method, storage_key, content_type, expires)?
            .finalize()
            .into_bytes();
        if bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
            Ok(())
        } else {
            Err(StorageError::InvalidToken)
        }
    }

    fn upload_url(&self, storage_key: &str, token: &str) -> String {
        format!(
            "{}/storage/upload/{}/{}?token={}",
            self.base_url, self.bucket, storage_key, token
        )
    }

    fn object_url(&self, storage_key: &str) -> String {
        format!(
            "{}/storage/object/{}/{}",
            self.base_url, self.bucket, storage_key
        )
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

fn content_type_for(storage_key: &str) -> &'static str {
    let ext = storage_key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }

    async fn presigned_put(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<SignedUpload> {
        self.key_to_path(storage_key)?;
        let expires_at = Utc::now() + chrono::Duration::seconds(expires_in.as_secs() as i64);
        let token = self.sign("PUT", storage_key, content_type, expires_at)?;

        Ok(SignedUpload {
            url: self.upload_url(storage_key, &token),
            token,
            expires_at,
        })
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.key_to_path(storage_key)?;
        let expires_at = Utc::now() + chrono::Duration::seconds(expires_in.as_secs() as i64);
        let token = self.sign("GET", storage_key, "", expires_at)?;
        Ok(format!("{}?token={}", self.object_url(storage_key), token))
    }

    fn public_url(&self, storage_key: &str) -> String {
        self.object_url(storage_key)
    }

    async fn object_size(&self, storage_key: &str) -> StorageResult<Option<u64>> {
        let path = self.key_to_path(storage_key)?;
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(Some(metadata.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn redeem_signed_upload(
        &self,
        storage_key: &str,
        token: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        self.verify("PUT", storage_key, content_type, token)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        // create_new makes the token single use: a second PUT to the same key fails.
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(storage_key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let written = async {
            file.write_all(&data).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&path).await;
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                "Local upload failed"
            );
            return Err(StorageError::UploadFailed(e.to_string()));
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local upload successful"
        );

        Ok(())
    }

    async fn read_signed(
        &self,
        storage_key: &str,
        token: Option<&str>,
    ) -> StorageResult<StoredObject> {
        let path = self.key_to_path(storage_key)?;
        match token {
            Some(token) => self.verify("GET", storage_key, "", token)?,
            None if self.public => {}
            None => return Err(StorageError::InvalidToken),
        }

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(storage_key.to_string()));
            }
            Err(e) => return Err(StorageError::DownloadFailed(e.to_string())),
        };

        Ok(StoredObject {
            data: Bytes::from(data),
            content_type: content_type_for(storage_key).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";
    const KEY: &str = "2025-01-01/0b6f2a3e-4f8c-4a57-9d1e-2b7c6a1f0e55_paper.pdf";

    async fn storage(dir: &Path, public: bool) -> LocalStorage {
        LocalStorage::new(dir, "submissions", "http://localhost:4000/", SECRET, public)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_signed_upload_then_signed_read() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path(), false).await;

        let signed = storage
            .presigned_put(KEY, "application/pdf", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(signed
            .url
            .starts_with("http://localhost:4000/storage/upload/submissions/2025-01-01/"));
        assert!(signed.url.ends_with(&format!("?token={}", signed.token)));

        assert!(!storage.exists(KEY).await.unwrap());
        storage
            .redeem_signed_upload(KEY, &signed.token, "application/pdf", Bytes::from_static(b"%PDF-1.7"))
            .await
            .unwrap();
        assert!(storage.exists(KEY).await.unwrap());
        assert_eq!(storage.object_size(KEY).await.unwrap(), Some(8));

        let url = storage
            .get_presigned_url(KEY, Duration::from_secs(60))
            .await
            .unwrap();
        let token = url.split("token=").nth(1).unwrap();
        let object = storage.read_signed(KEY, Some(token)).await.unwrap();
        assert_eq!(&object.data[..], b"%PDF-1.7");
        assert_eq!(object.content_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_upload_token_is_single_use() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path(), false).await;
        let signed = storage
            .presigned_put(KEY, "application/pdf", Duration::from_secs(60))
            .await
            .unwrap();

        storage
            .redeem_signed_upload(KEY, &signed.token, "application/pdf", Bytes::from_static(b"one"))
            .await
            .unwrap();
        let err = storage
            .redeem_signed_upload(KEY, &signed.token, "application/pdf", Bytes::from_static(b"two"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));

        // The first upload is untouched.
        assert_eq!(storage.object_size(KEY).await.unwrap(), Some(3));
        let url = storage
            .get_presigned_url(KEY, Duration::from_secs(60))
            .await
            .unwrap();
        let token = url.split("token=").nth(1).unwrap();
        let object = storage.read_signed(KEY, Some(token)).await.unwrap();
        assert_eq!(&object.data[..], b"one");
    }

    #[tokio::test]
    async fn test_token_bound_to_key_and_content_type() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path(), false).await;
        let signed = storage
            .presigned_put(KEY, "application/pdf", Duration::from_secs(60))
            .await
            .unwrap();

        let err = storage
            .redeem_signed_upload(KEY, &signed.token, "application/zip", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidToken));

        let err = storage
            .redeem_signed_upload("2025-01-01/other.pdf", &signed.token, "application/pdf", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidToken));

        let err = storage
            .redeem_signed_upload(KEY, "garbage", "application/pdf", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidToken));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path(), false).await;
        let expired = storage
            .sign("PUT", KEY, "application/pdf", Utc::now() - chrono::Duration::seconds(5))
            .unwrap();
        let err = storage
            .redeem_signed_upload(KEY, &expired, "application/pdf", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidToken));
    }

    #[tokio::test]
    async fn test_read_requires_token_unless_public() {
        let dir = tempdir().unwrap();
        let private = storage(dir.path(), false).await;
        let signed = private
            .presigned_put(KEY, "application/pdf", Duration::from_secs(60))
            .await
            .unwrap();
        private
            .redeem_signed_upload(KEY, &signed.token, "application/pdf", Bytes::from_static(b"x"))
            .await
            .unwrap();

        assert!(matches!(
            private.read_signed(KEY, None).await.unwrap_err(),
            StorageError::InvalidToken
        ));
        // An upload token is not a read token.
        assert!(matches!(
            private.read_signed(KEY, Some(&signed.token)).await.unwrap_err(),
            StorageError::InvalidToken
        ));

        let public = storage(dir.path(), true).await;
        assert_eq!(&public.read_signed(KEY, None).await.unwrap().data[..], b"x");
        assert_eq!(
            public.public_url(KEY),
            format!("http://localhost:4000/storage/object/submissions/{}", KEY)
        );
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path(), false).await;

        let result = storage
            .presigned_put("../outside.pdf", "application/pdf", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
        assert!(storage.exists("/etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path(), true).await;
        let err = storage.read_signed(KEY, None).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
