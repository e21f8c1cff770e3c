pub mod errors;
pub mod model;
pub mod validation;

pub use errors::{ItemViolation, ValidationError};
pub use model::{Delivery, Item, Order, Payment};
pub use validation::validate;
