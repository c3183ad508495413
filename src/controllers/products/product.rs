use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::controllers::products::{
    error::ControllerError,
    form::{Params, ProductForm, ProductPost, ProductQuery},
    mode::Mode,
    view_model::{anti_forgery_token, ProductSnapshot, ProductViewModel},
};
use crate::dao::ProductsDao;
use crate::session::{SessionId, TokenStore};

pub const LIST_URL: &str = "/products";
pub const CONTROLLER_NAME: &str = "Products_Product";

/// How a request ends: the form is rendered, or the user is sent back to the
/// list with a message.
#[derive(Debug)]
pub enum Outcome {
    Render(Box<ProductViewModel>),
    Redirect { url: &'static str, message: String },
}

impl Outcome {
    fn to_list(message: impl Into<String>) -> Self {
        Outcome::Redirect {
            url: LIST_URL,
            message: message.into(),
        }
    }
}

/// Maintenance screen for one product: DISPLAY, INSERT, UPDATE and DELETE
/// share this controller.
#[derive(Clone)]
pub struct ProductController {
    dao: Arc<dyn ProductsDao>,
    tokens: Arc<dyn TokenStore>,
}

impl ProductController {
    pub fn new(dao: Arc<dyn ProductsDao>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { dao, tokens }
    }

    pub fn token_key() -> String {
        format!("{}-xsstoken", CONTROLLER_NAME)
    }

    /// Handles one request. `body` is `Some` for a form post-back.
    pub async fn run(&self, session: SessionId, query: &Params, body: Option<&Params>) -> Outcome {
        match self.process(session, query, body).await {
            Ok(outcome) => outcome,
            Err(err) => Self::abort(err),
        }
    }

    /// Ends the request with a redirect to the list carrying the user message.
    pub fn abort(err: ControllerError) -> Outcome {
        error!(controller = CONTROLLER_NAME, error = %err, "Request aborted");
        Outcome::to_list(err.user_message())
    }

    async fn process(
        &self,
        session: SessionId,
        query: &Params,
        body: Option<&Params>,
    ) -> Result<Outcome, ControllerError> {
        let request = ProductQuery::parse(query)?;
        let mut view = ProductViewModel::new(request.mode);

        if let Some(product_id) = request.product_id {
            view.product_id = product_id;
            self.load_product(&mut view).await?;
        }

        if let Some(body) = body {
            let stored = self.tokens.token(session, &Self::token_key());
            let post = ProductPost::parse(&request, body, stored.as_deref())?;
            apply_post(&mut view, post);

            if validate(&mut view) {
                if let Some(redirect) = self.persist(&mut view).await {
                    return Ok(redirect);
                }
            }
        }

        self.prepare_view(session, &mut view)?;
        Ok(Outcome::Render(Box::new(view)))
    }

    async fn load_product(&self, view: &mut ProductViewModel) -> Result<(), ControllerError> {
        let product_id = view.product_id;
        match self.dao.get_product_by_id(product_id).await {
            Ok(Some(record)) => {
                view.load(record);
                Ok(())
            }
            Ok(None) => Err(ControllerError::ProductNotFound(product_id)),
            Err(source) => Err(ControllerError::Load { product_id, source }),
        }
    }

    /// Writes the row for INSERT, UPDATE and DELETE. Returns the redirect on
    /// success; a failed write becomes a `global` error on the form.
    async fn persist(&self, view: &mut ProductViewModel) -> Option<Outcome> {
        let (result, success, failure) = match view.mode {
            Mode::Insert => (
                self.dao
                    .insert_product(
                        &view.product_name,
                        &view.product_description,
                        view.product_price,
                        &view.product_img_url,
                        &view.product_status,
                    )
                    .await,
                "Producto creado exitosamente",
                "Algo salió mal al guardar el nuevo producto.",
            ),
            Mode::Update => (
                self.dao
                    .update_product(
                        view.product_id,
                        &view.product_name,
                        &view.product_description,
                        view.product_price,
                        &view.product_img_url,
                        &view.product_status,
                    )
                    .await,
                "Producto actualizado exitosamente",
                "Algo salió mal al actualizar el producto.",
            ),
            Mode::Delete => (
                self.dao.delete_product(view.product_id).await,
                "Producto eliminado exitosamente",
                "Algo salió mal al eliminar el producto.",
            ),
            Mode::Display => return None,
        };

        match result {
            Ok(affected) if affected > 0 => {
                info!(
                    mode = %view.mode,
                    product_id = view.product_id,
                    affected,
                    "Product saved"
                );
                Some(Outcome::to_list(success))
            }
            Ok(_) => {
                error!(mode = %view.mode, product_id = view.product_id, "No rows affected");
                view.add_error("global", failure);
                None
            }
            Err(err) => {
                error!(
                    mode = %view.mode,
                    product_id = view.product_id,
                    error = %err,
                    "Failed to save product"
                );
                view.add_error("global", failure);
                None
            }
        }
    }

    fn prepare_view(
        &self,
        session: SessionId,
        view: &mut ProductViewModel,
    ) -> Result<(), ControllerError> {
        view.form_title = view.mode.form_title(view.product_id, &view.product_name);
        view.show_commit_btn = view.mode.shows_commit_button();
        view.readonly = view.mode.is_read_only();

        let status_key = view.status_key();
        view.fields.insert(status_key.clone(), "selected".to_string());

        let joined: Vec<(String, String)> = view
            .errors
            .iter()
            .map(|(scope, messages)| (format!("{}_error", scope), messages.join(", ")))
            .collect();
        view.fields.extend(joined);

        view.timestamp = Some(Utc::now().timestamp());
        view.xss_token = anti_forgery_token(&*view)?;
        self.tokens
            .store_token(session, &Self::token_key(), view.xss_token.clone());

        let mut fields = view
            .fields
            .iter()
            .filter(|(key, _)| key.ends_with("_error"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<std::collections::BTreeMap<_, _>>();
        fields.insert(status_key, "selected".to_string());

        view.product = Some(ProductSnapshot {
            product_id: view.product_id,
            product_name: view.product_name.clone(),
            product_description: view.product_description.clone(),
            product_price: view.product_price,
            product_img_url: view.product_img_url.clone(),
            product_status: view.product_status.clone(),
            mode: view.mode,
            xss_token: view.xss_token.clone(),
            fields,
        });

        Ok(())
    }
}

fn apply_post(view: &mut ProductViewModel, post: ProductPost) {
    view.xss_token = post.token;
    if let Some(product_id) = post.product_id {
        view.product_id = product_id;
    }
    if let Some(fields) = post.fields {
        view.product_name = fields.name;
        view.product_description = fields.description;
        view.product_price = fields.price;
        view.product_img_url = fields.img_url;
        view.product_status = fields.status;
    }
}

/// Checks every field without stopping at the first failure.
fn validate(view: &mut ProductViewModel) -> bool {
    let form = ProductForm {
        name: view.product_name.clone(),
        description: view.product_description.clone(),
        price: view.product_price,
        img_url: view.product_img_url.clone(),
        status: view.product_status.clone(),
    };
    for (scope, message) in form.errors() {
        view.add_error(scope, message);
    }
    !view.has_errors()
}
