//! Upload and download drivers
//!
//! Both directions run one segment at a time, in order: read → encrypt →
//! stage → upload, or fetch → decrypt → append. Only the transport step of
//! a segment retries; everything else fails the transfer. Staged ciphertext
//! lives in a per-transfer scratch directory that is removed on every exit
//! path.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use sealdrop_core::types::FileInfo;
use sealdrop_core::{SdResult, SealdropError};
use sealdrop_crypto::{decrypt_segment, encrypt_segment, encrypted_len};

use crate::plan::plan_segments;
use crate::progress::{percent, ProgressFn, ProgressThrottle, REPORT_INTERVAL};
use crate::retry::RetryPolicy;

/// Upload-type tag declared when registering a file.
pub const UPLOAD_TYPE: &str = "CLIENT_API";

/// Declared parameters of an upload, fixed before the first segment moves.
#[derive(Debug, Clone)]
pub struct FileSpec {
    pub name: String,
    pub size: u64,
    pub parts: u64,
    pub upload_type: String,
}

/// The server-side operations one file transfer needs. Implemented over
/// the signed transport by the package layer; tests use an in-memory store.
///
/// Segment indexes are zero-based here; implementations own any wire
/// numbering.
#[async_trait]
pub trait SegmentStore: Send + Sync {
    /// Allocate a server-side file id for the declared upload.
    async fn register_file(&self, spec: &FileSpec) -> SdResult<String>;

    async fn upload_segment(&self, file_id: &str, index: u64, data: Vec<u8>) -> SdResult<()>;

    async fn download_segment(&self, file_id: &str, index: u64) -> SdResult<Vec<u8>>;
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub file_id: String,
    pub name: String,
    /// Plaintext bytes read from the source.
    pub size: u64,
    pub segments: u64,
    /// Ciphertext bytes actually sent.
    pub encrypted_bytes: u64,
}

#[derive(Debug)]
pub struct DownloadOutcome {
    pub file_id: String,
    pub local_path: PathBuf,
    /// Plaintext bytes written to the destination.
    pub bytes: u64,
    pub segments: u64,
}

/// Encrypt and upload one file, segment by segment.
pub async fn upload_file<S: SegmentStore + ?Sized>(
    store: &S,
    passphrase: &str,
    local_path: &Path,
    progress: Option<&ProgressFn>,
) -> SdResult<UploadOutcome> {
    let name = local_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            SealdropError::InvalidInput(format!("not a file path: {}", local_path.display()))
        })?
        .to_string();
    let metadata = tokio::fs::metadata(local_path).await?;
    if !metadata.is_file() {
        return Err(SealdropError::InvalidInput(format!(
            "not a regular file: {}",
            local_path.display()
        )));
    }
    let size = metadata.len();
    let sizes = plan_segments(size);
    let parts = sizes.len() as u64;

    let spec = FileSpec {
        name: name.clone(),
        size,
        parts,
        upload_type: UPLOAD_TYPE.to_string(),
    };
    let file_id = store.register_file(&spec).await?;
    debug!(file_id = %file_id, name = %name, size, parts, "file registered");

    // Percentages track ciphertext, which is what actually moves.
    let encrypted_total: u64 = sizes.iter().map(|s| encrypted_len(*s)).sum();
    let mut encrypted_done = 0u64;

    // Scratch space for staged ciphertext; removed on drop no matter how
    // this function exits.
    let staging = tempfile::tempdir()?;
    let retry = RetryPolicy::default();
    let mut throttle = ProgressThrottle::new(REPORT_INTERVAL);

    let mut source = tokio::fs::File::open(local_path).await?;
    for (index, planned) in sizes.iter().enumerate() {
        let index = index as u64;
        let mut plaintext = vec![0u8; *planned as usize];
        source.read_exact(&mut plaintext).await?;

        let ciphertext = encrypt_segment(passphrase, &plaintext).map_err(SealdropError::Other)?;
        drop(plaintext);
        let staged_len = ciphertext.len() as u64;
        let staged_path = staging.path().join(format!("segment-{index}"));
        tokio::fs::write(&staged_path, &ciphertext).await?;
        drop(ciphertext);

        let what = format!("upload of segment {index} ({name})");
        let staged_ref = &staged_path;
        let file_id_ref: &str = &file_id;
        retry
            .run(&what, || async move {
                // Each attempt re-reads the staged ciphertext from scratch.
                let data = tokio::fs::read(staged_ref).await?;
                store.upload_segment(file_id_ref, index, data).await
            })
            .await?;
        tokio::fs::remove_file(&staged_path).await.ok();

        encrypted_done += staged_len;
        if let Some(callback) = progress {
            let done = index + 1 == parts;
            if throttle.should_report(done) {
                callback(percent(encrypted_done, encrypted_total));
            }
        }
        debug!(file_id = %file_id, index, bytes = staged_len, "segment uploaded");
    }

    info!(file_id = %file_id, name = %name, segments = parts, bytes = size, "upload complete");
    Ok(UploadOutcome {
        file_id,
        name,
        size,
        segments: parts,
        encrypted_bytes: encrypted_done,
    })
}

/// Fetch and decrypt one file, segment by segment, writing plaintext to
/// `dest_path`. The destination appears only after every segment verified;
/// a failed transfer leaves nothing behind.
pub async fn download_file<S: SegmentStore + ?Sized>(
    store: &S,
    passphrase: &str,
    file: &FileInfo,
    dest_path: &Path,
    progress: Option<&ProgressFn>,
) -> SdResult<DownloadOutcome> {
    let tmp = dest_path.with_extension("sdl.partial");
    let result = match download_into(store, passphrase, file, &tmp, progress).await {
        Ok(bytes) => tokio::fs::rename(&tmp, dest_path)
            .await
            .map(|()| bytes)
            .map_err(SealdropError::from),
        Err(e) => Err(e),
    };
    match result {
        Ok(bytes) => {
            info!(file_id = %file.file_id, dest = %dest_path.display(), bytes, "download complete");
            Ok(DownloadOutcome {
                file_id: file.file_id.clone(),
                local_path: dest_path.to_path_buf(),
                bytes,
                segments: file.parts,
            })
        }
        Err(e) => {
            tokio::fs::remove_file(&tmp).await.ok();
            Err(e)
        }
    }
}

async fn download_into<S: SegmentStore + ?Sized>(
    store: &S,
    passphrase: &str,
    file: &FileInfo,
    tmp: &Path,
    progress: Option<&ProgressFn>,
) -> SdResult<u64> {
    let sizes = plan_segments(file.file_size);
    if sizes.len() as u64 != file.parts {
        warn!(
            file_id = %file.file_id,
            declared = file.parts,
            planned = sizes.len(),
            "segment count mismatch; trusting declared count"
        );
    }
    let encrypted_total: u64 = sizes.iter().map(|s| encrypted_len(*s)).sum();
    let mut encrypted_done = 0u64;

    if let Some(parent) = tmp.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut out = tokio::fs::File::create(tmp).await?;

    let retry = RetryPolicy::default();
    let mut throttle = ProgressThrottle::new(REPORT_INTERVAL);
    let mut total = 0u64;

    for index in 0..file.parts {
        let what = format!("download of segment {index} ({})", file.file_name);
        let file_id_ref: &str = &file.file_id;
        let ciphertext = retry
            .run(&what, || async move {
                store.download_segment(file_id_ref, index).await
            })
            .await?;
        encrypted_done += ciphertext.len() as u64;

        // Tag mismatch is fatal for the whole file; retrying cannot fix a
        // tampered or corrupted ciphertext.
        let plaintext = decrypt_segment(passphrase, &ciphertext)
            .map_err(|e| SealdropError::Verification(e.to_string()))?;
        out.write_all(&plaintext).await?;
        total += plaintext.len() as u64;

        if let Some(callback) = progress {
            let done = index + 1 == file.parts;
            if throttle.should_report(done) {
                callback(percent(encrypted_done, encrypted_total));
            }
        }
        debug!(file_id = %file.file_id, index, bytes = plaintext.len(), "segment decrypted");
    }

    out.flush().await?;
    Ok(total)
}
