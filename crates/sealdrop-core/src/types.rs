use serde::{Deserialize, Serialize};

/// Lifecycle state of a package.
///
/// A package starts as a temporary draft, becomes active when finalized
/// (or parked in needs-approval until an approver acts), then expires per
/// its configured lifetime and is eventually archived. Expiry is observed,
/// not driven, by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageState {
    #[default]
    Temp,
    Active,
    NeedsApproval,
    Expired,
    Archived,
}

/// Server-side package record. The client-only keycode is deliberately NOT
/// part of this type; it lives in the caller-owned package context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Package {
    pub package_id: String,
    /// Shareable public identifier, carried in secure links.
    pub package_code: String,
    /// Server-issued half of the encryption passphrase.
    pub server_secret: String,
    pub state: PackageState,
    /// Package lifetime in days (0 = account default).
    pub life: u32,
    pub recipients: Vec<Recipient>,
    pub files: Vec<FileInfo>,
    pub approvers: Vec<String>,
    pub contact_groups: Vec<ContactGroup>,
    pub label: Option<String>,
    /// Public keys registered by recipients; when present, the keycode is
    /// uploaded encrypted to each of them at finalize time.
    pub public_keys: Vec<PublicKey>,
    /// Workspace (VDR) packages carry a directory tree instead of a flat
    /// file list.
    pub workspace: bool,
}

/// A file attached to a package. Immutable once its upload is finalized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileInfo {
    pub file_id: String,
    pub file_name: String,
    /// Declared plaintext size in bytes.
    pub file_size: u64,
    /// Number of encrypted segments the file was divided into.
    pub parts: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recipient {
    pub recipient_id: String,
    pub email: String,
    /// Set when this recipient cannot access the package until one of the
    /// listed approvers acts.
    pub needs_approval: bool,
    pub approvers: Vec<String>,
    pub phone_numbers: Vec<PhoneNumber>,
    /// Download receipts recorded by the server.
    pub confirmations: Vec<Confirmation>,
    pub role: Option<String>,
}

/// Phone number attached to a recipient for SMS authentication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhoneNumber {
    pub country_code: String,
    pub number: String,
}

/// A download receipt: who fetched what, from where, and when.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Confirmation {
    pub ip_address: String,
    pub timestamp: String,
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactGroup {
    pub group_id: String,
    pub group_name: String,
}

/// A recipient-registered public key (age X25519 recipient string).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublicKey {
    pub id: String,
    pub key: String,
}
