use askama::Template;

use crate::controllers::products::ProductViewModel;
use crate::dao::ProductRecord;

#[derive(Template)]
#[template(path = "maintenance/products/product.html")]
pub struct ProductFormTemplate<'a> {
    pub view: &'a ProductViewModel,
}

#[derive(Template)]
#[template(path = "maintenance/products/products.html")]
pub struct ProductListTemplate<'a> {
    pub products: &'a [ProductRecord],
    pub message: Option<&'a str>,
}
