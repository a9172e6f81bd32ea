pub mod ceiling;
pub mod persistence;
pub mod settings;

pub use ceiling::{load_ceiling_record, save_ceiling_record, CeilingRecord, CeilingRelease};
pub use persistence::Persistable;
pub use settings::AppSettings;
