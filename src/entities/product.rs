use sea_orm::entity::prelude::*;
use serde::Serialize;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub product_id: i32,
    pub product_name: String,
    #[sea_orm(column_type = "Text")]
    pub product_description: String,
    /// Decimal kept as text so no driver float conversion touches it.
    #[sea_orm(column_type = "Text")]
    pub product_price: String,
    pub product_img_url: String,
    pub product_status: ProductStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, EnumIter, DeriveActiveEnum, Serialize)]
#[sea_orm(
    enum_name = "product_status_enum",
    db_type = "String(StringLen::N(3))",
    rs_type = "String"
)]
pub enum ProductStatus {
    #[default]
    #[sea_orm(string_value = "ACT")]
    #[serde(rename = "ACT")]
    Active,
    #[sea_orm(string_value = "INA")]
    #[serde(rename = "INA")]
    Inactive,
}

impl ProductStatus {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Active => "ACT",
            Self::Inactive => "INA",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACT" => Ok(Self::Active),
            "INA" => Ok(Self::Inactive),
            _ => Err(format!("Invalid product status: {}", s)),
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
