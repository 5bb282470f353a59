use bigdecimal::BigDecimal;
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::catalog::VariantSnapshot;
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogStore;
use crate::schema::{product_variants, products};

/// Read-only view of the menu tables maintained by the menu-management flows.
pub struct DieselCatalogStore {
    pool: DbPool,
}

impl DieselCatalogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CatalogStore for DieselCatalogStore {
    fn get_variant(&self, variant_id: i32) -> Result<Option<VariantSnapshot>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = product_variants::table
            .inner_join(products::table)
            .filter(product_variants::id.eq(variant_id))
            .select((
                product_variants::id,
                products::establishment_id,
                product_variants::price,
                product_variants::is_active,
                products::is_active,
            ))
            .first::<(i32, i32, BigDecimal, bool, bool)>(&mut conn)
            .optional()?;

        Ok(row.map(
            |(variant_id, establishment_id, price, variant_active, product_active)| {
                VariantSnapshot {
                    variant_id,
                    establishment_id,
                    price,
                    is_active: variant_active && product_active,
                }
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::DieselCatalogStore;
    use crate::domain::ports::CatalogStore;
    use crate::infrastructure::test_support::seeded_db;

    #[tokio::test]
    #[ignore = "requires a container runtime for Postgres"]
    async fn variant_carries_product_establishment_and_price() {
        let (_container, pool) = seeded_db().await;
        let catalog = DieselCatalogStore::new(pool);

        let variant = catalog.get_variant(5).unwrap().expect("variant 5 seeded");
        assert_eq!(variant.establishment_id, 1);
        assert_eq!(variant.price, BigDecimal::from_str("10.50").unwrap());
        assert!(variant.is_active);

        let foreign = catalog.get_variant(20).unwrap().expect("variant 20 seeded");
        assert_eq!(foreign.establishment_id, 2);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime for Postgres"]
    async fn inactive_product_makes_variant_inactive() {
        let (_container, pool) = seeded_db().await;
        let catalog = DieselCatalogStore::new(pool);

        assert!(!catalog.get_variant(11).unwrap().unwrap().is_active);
        assert!(!catalog.get_variant(12).unwrap().unwrap().is_active);
        assert!(catalog.get_variant(404).unwrap().is_none());
    }
}
