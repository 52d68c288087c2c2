//! Entity capability, the generic record, and the committed-state store.

mod record;
mod store;
mod traits;

pub use record::Record;
pub use store::EntityStore;
pub use traits::{AsAny, Entity, EntityRef};
