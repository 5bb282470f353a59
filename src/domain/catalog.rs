use bigdecimal::BigDecimal;

/// The catalog facts an order needs about a variant at creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSnapshot {
    pub variant_id: i32,
    pub establishment_id: i32,
    pub price: BigDecimal,
    /// False when either the variant or its product is deactivated.
    pub is_active: bool,
}
