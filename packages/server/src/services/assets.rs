use std::collections::HashMap;
use std::io::Cursor;

use chrono::Utc;
use common::storage::{ObjectStore, StorageError};
use image::{ImageFormat, ImageReader};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entity::image_asset;

/// File extensions accepted for uploaded images.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The upload is not an acceptable image. Nothing was stored.
    #[error("{0}")]
    Invalid(String),
    /// The object store rejected an upload. Objects uploaded earlier in the same
    /// batch have already been removed again.
    #[error("object storage failure: {0}")]
    Upload(#[from] StorageError),
    #[error("database failure: {0}")]
    Database(#[from] DbErr),
}

/// Entity that owns a set of images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetOwner {
    Supplier(i32),
    Publication(i32),
    Category(i32),
}

impl AssetOwner {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Supplier(_) => "supplier",
            Self::Publication(_) => "publication",
            Self::Category(_) => "category",
        }
    }

    /// Storage folder for this kind of owner.
    pub fn folder(&self) -> &'static str {
        match self {
            Self::Supplier(_) => "proveedores",
            Self::Publication(_) => "publicaciones",
            Self::Category(_) => "categorias",
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Self::Supplier(id) | Self::Publication(id) | Self::Category(id) => *id,
        }
    }
}

/// A file as received from a multipart request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// An upload that passed validation and may be sent to the object store.
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    extension: &'static str,
    content_type: String,
    data: Vec<u8>,
}

impl ValidatedImage {
    pub fn extension(&self) -> &str {
        self.extension
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// Check extension, size and decodability of an upload.
///
/// The extension must be one of [`ALLOWED_EXTENSIONS`] and agree with the format
/// detected from the file header, and the header must decode to valid dimensions.
pub fn validate_image(upload: ImageUpload, max_size: u64) -> Result<ValidatedImage, AssetError> {
    let extension = upload
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    let extension = ALLOWED_EXTENSIONS
        .iter()
        .copied()
        .find(|allowed| *allowed == extension)
        .ok_or_else(|| {
            AssetError::Invalid(format!(
                "'{}' is not an allowed image type ({})",
                upload.file_name,
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })?;

    if upload.data.is_empty() {
        return Err(AssetError::Invalid(format!("'{}' is empty", upload.file_name)));
    }
    if upload.data.len() as u64 > max_size {
        return Err(AssetError::Invalid(format!(
            "'{}' is {} bytes, the limit is {max_size}",
            upload.file_name,
            upload.data.len()
        )));
    }

    let reader = ImageReader::new(Cursor::new(upload.data.as_slice()))
        .with_guessed_format()
        .map_err(|e| AssetError::Invalid(format!("'{}' is unreadable: {e}", upload.file_name)))?;
    let format_matches = match reader.format() {
        Some(ImageFormat::Jpeg) => matches!(extension, "jpg" | "jpeg"),
        Some(ImageFormat::Png) => extension == "png",
        Some(ImageFormat::Gif) => extension == "gif",
        Some(ImageFormat::Bmp) => extension == "bmp",
        _ => false,
    };
    if !format_matches {
        return Err(AssetError::Invalid(format!(
            "'{}' is not a {extension} image",
            upload.file_name
        )));
    }
    reader.into_dimensions().map_err(|e| {
        AssetError::Invalid(format!("'{}' could not be decoded: {e}", upload.file_name))
    })?;

    let content_type = mime_guess::from_ext(extension)
        .first_or_octet_stream()
        .to_string();

    Ok(ValidatedImage {
        extension,
        content_type,
        data: upload.data,
    })
}

/// Validate a batch of uploads, failing on the first bad one.
pub fn validate_images(
    uploads: Vec<ImageUpload>,
    max_size: u64,
) -> Result<Vec<ValidatedImage>, AssetError> {
    uploads
        .into_iter()
        .map(|upload| validate_image(upload, max_size))
        .collect()
}

/// Asset swap whose database half is done but not yet committed.
///
/// Finish it with [`AssetService::complete`] after the surrounding transaction
/// commits, or with [`AssetService::abort`] when it does not.
#[must_use]
#[derive(Debug)]
pub struct PendingReplace {
    folder: &'static str,
    assets: Vec<image_asset::Model>,
    replaced: Vec<image_asset::Model>,
}

/// Final state of an asset replacement.
#[derive(Debug)]
pub struct ReplaceOutcome {
    /// The owner's images, in order.
    pub assets: Vec<image_asset::Model>,
    /// Storage keys of replaced objects that could not be deleted.
    pub orphaned: Vec<String>,
}

/// Sole writer of `image_asset` rows and their remote objects.
pub struct AssetService<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> AssetService<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// Upload `images` and make them the complete image set of `owner`.
    ///
    /// All uploads happen before any row is touched; if one fails, the objects
    /// uploaded so far are removed and the owner's current rows stay as they were.
    /// The row swap runs on `conn`, normally the caller's open transaction; if it
    /// fails, the new objects are removed too. Old objects are only deleted by
    /// [`AssetService::complete`], after commit.
    pub async fn replace<C: ConnectionTrait>(
        &self,
        conn: &C,
        owner: AssetOwner,
        images: Vec<ValidatedImage>,
    ) -> Result<PendingReplace, AssetError> {
        let folder = owner.folder();
        let uploaded = self.upload_all(folder, images).await?;

        match swap_rows(conn, owner, &uploaded).await {
            Ok((assets, replaced)) => Ok(PendingReplace {
                folder,
                assets,
                replaced,
            }),
            Err(e) => {
                let names = uploaded.into_iter().map(|(name, _)| name);
                self.discard(folder, names).await;
                Err(e.into())
            }
        }
    }

    /// Delete the objects that a committed replacement superseded.
    pub async fn complete(&self, pending: PendingReplace) -> ReplaceOutcome {
        let names = pending.replaced.into_iter().map(|asset| asset.name);
        let orphaned = self.discard(pending.folder, names).await;
        ReplaceOutcome {
            assets: pending.assets,
            orphaned,
        }
    }

    /// Undo the remote half of a replacement whose transaction did not commit.
    pub async fn abort(&self, pending: PendingReplace) {
        let names = pending.assets.into_iter().map(|asset| asset.name);
        self.discard(pending.folder, names).await;
    }

    /// Remove every row of `owner` on `conn` and return them.
    ///
    /// Pass the result to [`AssetService::discard_assets`] once the deletion is
    /// committed.
    pub async fn detach_all<C: ConnectionTrait>(
        &self,
        conn: &C,
        owner: AssetOwner,
    ) -> Result<Vec<image_asset::Model>, DbErr> {
        let existing = list(conn, owner).await?;
        image_asset::Entity::delete_many()
            .filter(image_asset::Column::OwnerKind.eq(owner.kind()))
            .filter(image_asset::Column::OwnerId.eq(owner.id()))
            .exec(conn)
            .await?;
        Ok(existing)
    }

    /// Delete the remote objects of already-detached rows; returns orphaned keys.
    pub async fn discard_assets(
        &self,
        owner: AssetOwner,
        assets: Vec<image_asset::Model>,
    ) -> Vec<String> {
        self.discard(owner.folder(), assets.into_iter().map(|a| a.name))
            .await
    }

    async fn upload_all(
        &self,
        folder: &'static str,
        images: Vec<ValidatedImage>,
    ) -> Result<Vec<(String, String)>, AssetError> {
        let mut uploaded: Vec<(String, String)> = Vec::with_capacity(images.len());

        for image in images {
            let name = format!("{}.{}", Uuid::new_v4(), image.extension);
            match self
                .store
                .put(folder, &name, image.data, &image.content_type)
                .await
            {
                Ok(url) => uploaded.push((name, url)),
                Err(e) => {
                    let names = uploaded.into_iter().map(|(name, _)| name);
                    self.discard(folder, names).await;
                    return Err(e.into());
                }
            }
        }

        Ok(uploaded)
    }

    /// Best-effort delete. Failures are logged and returned as `folder/name` keys.
    async fn discard(&self, folder: &str, names: impl IntoIterator<Item = String>) -> Vec<String> {
        let mut orphaned = Vec::new();
        for name in names {
            match self.store.delete(folder, &name).await {
                Ok(true) => debug!(folder, name, "Deleted stored image"),
                Ok(false) => debug!(folder, name, "Stored image was already gone"),
                Err(e) => {
                    warn!(folder, name, error = %e, "Failed to delete stored image, object is orphaned");
                    orphaned.push(format!("{folder}/{name}"));
                }
            }
        }
        orphaned
    }
}

async fn swap_rows<C: ConnectionTrait>(
    conn: &C,
    owner: AssetOwner,
    uploaded: &[(String, String)],
) -> Result<(Vec<image_asset::Model>, Vec<image_asset::Model>), DbErr> {
    let replaced = list(conn, owner).await?;
    image_asset::Entity::delete_many()
        .filter(image_asset::Column::OwnerKind.eq(owner.kind()))
        .filter(image_asset::Column::OwnerId.eq(owner.id()))
        .exec(conn)
        .await?;

    let now = Utc::now();
    let mut assets = Vec::with_capacity(uploaded.len());
    for (position, (name, path)) in uploaded.iter().enumerate() {
        let model = image_asset::ActiveModel {
            id: Set(Uuid::now_v7()),
            owner_kind: Set(owner.kind().to_string()),
            owner_id: Set(owner.id()),
            name: Set(name.clone()),
            path: Set(path.clone()),
            position: Set(position as i32),
            created_at: Set(now),
        };
        assets.push(model.insert(conn).await?);
    }

    Ok((assets, replaced))
}

/// Images of one owner ordered by position.
pub async fn list<C: ConnectionTrait>(
    conn: &C,
    owner: AssetOwner,
) -> Result<Vec<image_asset::Model>, DbErr> {
    image_asset::Entity::find()
        .filter(image_asset::Column::OwnerKind.eq(owner.kind()))
        .filter(image_asset::Column::OwnerId.eq(owner.id()))
        .order_by_asc(image_asset::Column::Position)
        .all(conn)
        .await
}

/// Image URLs of many owners of the same kind, keyed by owner id.
pub async fn paths_by_owner<C: ConnectionTrait>(
    conn: &C,
    kind: &str,
    owner_ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, Vec<String>>, DbErr> {
    let ids: Vec<i32> = owner_ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = image_asset::Entity::find()
        .filter(image_asset::Column::OwnerKind.eq(kind))
        .filter(image_asset::Column::OwnerId.is_in(ids))
        .order_by_asc(image_asset::Column::OwnerId)
        .order_by_asc(image_asset::Column::Position)
        .all(conn)
        .await?;

    let mut by_owner: HashMap<i32, Vec<String>> = HashMap::new();
    for row in rows {
        by_owner.entry(row.owner_id).or_default().push(row.path);
    }
    Ok(by_owner)
}
