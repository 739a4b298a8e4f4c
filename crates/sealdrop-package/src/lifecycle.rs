//! Package lifecycle: create, attach, finalize, delete, download
//!
//! A package moves Temp → Active (or the NeedsApproval side branch) when
//! finalized, then Expired → Archived on the server's clock. The client
//! drives the transitions up to finalize and observes the rest.

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, info};

use sealdrop_core::types::{FileInfo, Package, PackageState, Recipient};
use sealdrop_core::{ClientConfig, SdResult, SealdropError};
use sealdrop_crypto::{access_checksum, generate_keycode, validate_keycode};
use sealdrop_transfer::{DownloadOutcome, ProgressFn};
use sealdrop_transport::{ApiClient, ApiReply, Method, ResponseStatus};

use crate::keycodes;
use crate::link;
use crate::remote::{
    AddRecipientResponse, CreatePackageResponse, MessageResponse, PackageStore, API_BASE,
};
use crate::session::PackageContext;

#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Create a workspace (VDR) package with a directory tree.
    pub workspace: bool,
    /// Create the package on behalf of another user (requires permission).
    pub on_behalf_of: Option<String>,
}

#[derive(Default)]
pub struct FinalizeOptions {
    /// Finalize without a recipient list; the server enforces access.
    pub undisclosed: bool,
    /// Optional password; when set, the access checksum derives from it
    /// instead of the keycode.
    pub password: Option<SecretString>,
}

#[derive(Debug)]
pub struct FinalizeOutcome {
    /// The shareable secure link, keycode fragment included.
    pub link: String,
    /// The server accepted the finalize, but recipients cannot access the
    /// package until an approver acts. Approvers can use it immediately.
    pub needs_approval: bool,
}

/// Result of fetching a whole package through its secure link.
#[derive(Debug)]
pub struct PackageDownload {
    pub package: Package,
    pub files: Vec<DownloadOutcome>,
}

/// The SDK entry point: package lifecycle operations over one set of
/// credentials. Holds no package state; callers own their
/// [`PackageContext`]s.
pub struct SealdropClient {
    api: ApiClient,
}

impl SealdropClient {
    pub fn new(config: &ClientConfig) -> SdResult<Self> {
        Ok(Self {
            api: ApiClient::new(config)?,
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Allocate a package and generate its keycode locally. The returned
    /// context is the only place the keycode lives.
    pub async fn create_package(&self, options: CreateOptions) -> SdResult<PackageContext> {
        let body = json!({
            "vdr": options.workspace,
            "packageUserEmail": options.on_behalf_of,
        });
        let reply: ApiReply<CreatePackageResponse> = self
            .api
            .send(Method::PUT, &format!("{API_BASE}/package/"), Some(body))
            .await?;
        let created = reply.into_payload()?;

        let package = Package {
            package_id: created.package_id,
            package_code: created.package_code,
            server_secret: created.server_secret,
            state: PackageState::Temp,
            workspace: options.workspace,
            ..Package::default()
        };
        info!(package_id = %package.package_id, workspace = package.workspace, "package created");
        Ok(PackageContext::new(
            package,
            SecretString::from(generate_keycode()),
        ))
    }

    /// Fetch package metadata. The server resolves either the package id
    /// or the public package code.
    pub async fn get_package(&self, package_id: &str) -> SdResult<Package> {
        let path = format!("{API_BASE}/package/{package_id}/");
        let reply: ApiReply<Package> = self.api.send(Method::GET, &path, None).await?;
        reply.into_payload()
    }

    /// Attach a recipient by email. The server validates the address and
    /// reports whether this recipient needs approval.
    pub async fn add_recipient(
        &self,
        ctx: &mut PackageContext,
        email: &str,
    ) -> SdResult<Recipient> {
        let path = format!("{API_BASE}/package/{}/recipient/", ctx.package.package_id);
        let reply: ApiReply<AddRecipientResponse> = self
            .api
            .send(Method::PUT, &path, Some(json!({ "email": email })))
            .await?;
        if !reply.success() {
            return Err(reply_error(reply));
        }
        let added = reply.into_payload()?;

        let recipient = Recipient {
            recipient_id: added.recipient_id,
            email: added.email,
            needs_approval: added.needs_approval,
            approvers: added.approvers,
            ..Recipient::default()
        };
        debug!(
            package_id = %ctx.package.package_id,
            email = %recipient.email,
            needs_approval = recipient.needs_approval,
            "recipient added"
        );
        ctx.package.recipients.push(recipient.clone());
        Ok(recipient)
    }

    /// Encrypt and upload one file into the package.
    pub async fn upload_file(
        &self,
        ctx: &mut PackageContext,
        local_path: &Path,
        progress: Option<&ProgressFn>,
    ) -> SdResult<FileInfo> {
        validate_keycode(ctx.keycode()).map_err(|e| SealdropError::InvalidInput(e.to_string()))?;
        let store = PackageStore {
            client: &self.api,
            package_id: ctx.package.package_id.clone(),
            checksum: ctx.access_checksum()?,
        };
        let passphrase = ctx.passphrase();
        let outcome =
            sealdrop_transfer::upload_file(&store, passphrase.expose_secret(), local_path, progress)
                .await?;

        let info = FileInfo {
            file_id: outcome.file_id,
            file_name: outcome.name,
            file_size: outcome.size,
            parts: outcome.segments,
        };
        ctx.package.files.push(info.clone());
        Ok(info)
    }

    /// Encrypt and attach a text message to the package.
    pub async fn add_message(&self, ctx: &PackageContext, text: &str) -> SdResult<()> {
        validate_keycode(ctx.keycode()).map_err(|e| SealdropError::InvalidInput(e.to_string()))?;
        let passphrase = ctx.passphrase();
        let sealed = sealdrop_crypto::encrypt_message(passphrase.expose_secret(), text)
            .map_err(SealdropError::Other)?;
        let path = format!("{API_BASE}/package/{}/message/", ctx.package.package_id);
        let reply: ApiReply<serde_json::Value> = self
            .api
            .send(Method::PUT, &path, Some(json!({ "message": sealed })))
            .await?;
        if reply.success() {
            Ok(())
        } else {
            Err(reply_error(reply))
        }
    }

    /// Fetch and decrypt the package message behind a secure link.
    pub async fn get_message(&self, secure_link: &str) -> SdResult<String> {
        let (package_code, keycode) = link::decode(secure_link)?;
        validate_keycode(&keycode).map_err(|e| SealdropError::InvalidLink(e.to_string()))?;

        let package = self.get_package(&package_code).await?;
        let checksum =
            access_checksum(&keycode, &package.package_code).map_err(SealdropError::Other)?;
        let path = format!(
            "{API_BASE}/package/{}/message/{checksum}/",
            package.package_id
        );
        let reply: ApiReply<MessageResponse> = self.api.send(Method::GET, &path, None).await?;
        let sealed = reply.into_payload()?.message;

        let passphrase = format!("{}{}", package.server_secret, keycode);
        sealdrop_crypto::decrypt_message(&passphrase, &sealed)
            .map_err(|e| SealdropError::Verification(e.to_string()))
    }

    /// Finalize the package and produce its secure link.
    ///
    /// The keycode is validated before anything touches the network. When
    /// recipients registered public keys, the keycode is uploaded encrypted
    /// to each of them first; finalize does not proceed without that step.
    pub async fn finalize(
        &self,
        ctx: &mut PackageContext,
        options: FinalizeOptions,
    ) -> SdResult<FinalizeOutcome> {
        validate_keycode(ctx.keycode()).map_err(|e| SealdropError::InvalidInput(e.to_string()))?;

        if !ctx.package.public_keys.is_empty() {
            self.upload_encrypted_keycodes(ctx).await?;
        }

        let checksum = match &options.password {
            Some(password) => access_checksum(password.expose_secret(), &ctx.package.package_code)
                .map_err(SealdropError::Other)?,
            None => ctx.access_checksum()?,
        };

        let path = if options.undisclosed {
            format!(
                "{API_BASE}/package/{}/finalize/undisclosed/",
                ctx.package.package_id
            )
        } else {
            format!("{API_BASE}/package/{}/finalize/", ctx.package.package_id)
        };
        let reply: ApiReply<serde_json::Value> = self
            .api
            .send(Method::POST, &path, Some(json!({ "checksum": checksum })))
            .await?;

        let outcome = finalize_outcome(reply, ctx.keycode())?;
        ctx.package.state = if outcome.needs_approval {
            PackageState::NeedsApproval
        } else {
            PackageState::Active
        };
        info!(
            package_id = %ctx.package.package_id,
            needs_approval = outcome.needs_approval,
            "package finalized"
        );
        Ok(outcome)
    }

    /// Delete a finalized package. Irreversible; the server decides
    /// legality and answers ActionFailed on misuse.
    pub async fn delete_package(&self, package_id: &str) -> SdResult<()> {
        let path = format!("{API_BASE}/package/{package_id}/");
        let reply: ApiReply<serde_json::Value> =
            self.api.send(Method::DELETE, &path, None).await?;
        if reply.success() {
            Ok(())
        } else {
            Err(reply_error(reply))
        }
    }

    /// Delete a package that was never finalized.
    pub async fn delete_temp_package(&self, package_id: &str) -> SdResult<()> {
        let path = format!("{API_BASE}/package/{package_id}/temp/");
        let reply: ApiReply<serde_json::Value> =
            self.api.send(Method::DELETE, &path, None).await?;
        if reply.success() {
            Ok(())
        } else {
            Err(reply_error(reply))
        }
    }

    /// Fetch and decrypt every file in a received package into `dest_dir`.
    pub async fn download_package(
        &self,
        secure_link: &str,
        dest_dir: &Path,
        progress: Option<&ProgressFn>,
    ) -> SdResult<PackageDownload> {
        let (package_code, keycode) = link::decode(secure_link)?;
        validate_keycode(&keycode).map_err(|e| SealdropError::InvalidLink(e.to_string()))?;

        let package = self.get_package(&package_code).await?;
        let checksum =
            access_checksum(&keycode, &package.package_code).map_err(SealdropError::Other)?;
        let passphrase = SecretString::from(format!("{}{}", package.server_secret, keycode));

        let store = PackageStore {
            client: &self.api,
            package_id: package.package_id.clone(),
            checksum,
        };
        let mut files = Vec::with_capacity(package.files.len());
        for file in &package.files {
            // Server-supplied names must stay inside dest_dir.
            if file.file_name.contains('/') || file.file_name.contains('\\') {
                return Err(SealdropError::InvalidInput(format!(
                    "refusing file name with path separators: {}",
                    file.file_name
                )));
            }
            let dest = dest_dir.join(&file.file_name);
            let outcome = sealdrop_transfer::download_file(
                &store,
                passphrase.expose_secret(),
                file,
                &dest,
                progress,
            )
            .await?;
            files.push(outcome);
        }
        info!(package_id = %package.package_id, files = files.len(), "package downloaded");
        Ok(PackageDownload { package, files })
    }

    async fn upload_encrypted_keycodes(&self, ctx: &PackageContext) -> SdResult<()> {
        let mut uploads = Vec::with_capacity(ctx.package.public_keys.len());
        for public_key in &ctx.package.public_keys {
            let sealed = keycodes::encrypt_keycode(&public_key.key, ctx.keycode())
                .map_err(SealdropError::Other)?;
            uploads.push(json!({ "publicKeyId": public_key.id, "keycode": sealed }));
        }
        let path = format!("{API_BASE}/package/{}/link/", ctx.package.package_id);
        let reply: ApiReply<serde_json::Value> = self
            .api
            .send(Method::PUT, &path, Some(json!({ "keycodes": uploads })))
            .await?;
        if reply.success() {
            debug!(
                package_id = %ctx.package.package_id,
                keys = ctx.package.public_keys.len(),
                "encrypted keycodes uploaded"
            );
            Ok(())
        } else {
            Err(reply_error(reply))
        }
    }
}

/// Map a non-success reply into the error taxonomy.
fn reply_error<T>(reply: ApiReply<T>) -> SealdropError {
    match reply.status {
        ResponseStatus::InvalidEmail
        | ResponseStatus::InvalidRecipient
        | ResponseStatus::InvalidPhoneNumber => SealdropError::InvalidInput(reply.message),
        ResponseStatus::ApproverRequired => SealdropError::ApproverRequired,
        ResponseStatus::Denied => SealdropError::FinalizationDenied {
            reasons: if reply.errors.is_empty() {
                vec![reply.message]
            } else {
                reply.errors
            },
        },
        _ => SealdropError::ActionFailed {
            status: reply.status.as_str().to_string(),
            message: reply.message,
        },
    }
}

/// Interpret the finalize reply. The server's message field carries the
/// public link; the keycode fragment is appended client-side.
fn finalize_outcome(
    reply: ApiReply<serde_json::Value>,
    keycode: &str,
) -> SdResult<FinalizeOutcome> {
    match reply.status {
        ResponseStatus::Success => Ok(FinalizeOutcome {
            link: format!("{}#keycode={keycode}", reply.message),
            needs_approval: false,
        }),
        ResponseStatus::PackageNeedsApproval => Ok(FinalizeOutcome {
            link: format!("{}#keycode={keycode}", reply.message),
            needs_approval: true,
        }),
        _ => Err(reply_error(reply)),
    }
}
