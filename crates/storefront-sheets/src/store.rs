use async_trait::async_trait;
use sqlx::PgPool;
use storefront_db::{DbError, ProductPatch, ProductRow, ProductSheetRow};
use uuid::Uuid;

/// The product operations reconciliation needs from the datastore.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products in sheet order (creation time, then id).
    async fn list_sheet_products(&self) -> Result<Vec<ProductSheetRow>, DbError>;

    async fn get_sheet_product(&self, id: Uuid) -> Result<Option<ProductSheetRow>, DbError>;

    /// Applies `patch` and bumps `updated_at`. `None` when the product is missing.
    async fn update_product(
        &self,
        id: Uuid,
        patch: &ProductPatch,
    ) -> Result<Option<ProductRow>, DbError>;

    /// Returns `false` when the product is missing.
    async fn delete_product(&self, id: Uuid) -> Result<bool, DbError>;
}

#[async_trait]
impl ProductRepository for PgPool {
    async fn list_sheet_products(&self) -> Result<Vec<ProductSheetRow>, DbError> {
        storefront_db::list_products_for_sheet(self).await
    }

    async fn get_sheet_product(&self, id: Uuid) -> Result<Option<ProductSheetRow>, DbError> {
        storefront_db::get_product_for_sheet(self, id).await
    }

    async fn update_product(
        &self,
        id: Uuid,
        patch: &ProductPatch,
    ) -> Result<Option<ProductRow>, DbError> {
        storefront_db::update_product(self, id, patch).await
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, DbError> {
        storefront_db::delete_product(self, id).await
    }
}
