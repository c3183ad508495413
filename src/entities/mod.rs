pub mod product;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Schema};

use crate::entities::product::Entity as Product;

pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut create_product_table = schema.create_table_from_entity(Product);
    create_product_table.if_not_exists();

    db.execute(backend.build(&create_product_table)).await?;
    Ok(())
}
