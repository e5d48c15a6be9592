pub mod record;
pub mod session;

pub use record::ApplicationRecord;
pub use session::Session;
