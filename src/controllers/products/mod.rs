pub mod error;
pub mod form;
pub mod mode;
pub mod product;
pub mod view_model;

pub use error::ControllerError;
pub use mode::Mode;
pub use product::{Outcome, ProductController, LIST_URL};
pub use view_model::{ProductSnapshot, ProductViewModel};
