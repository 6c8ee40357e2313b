pub mod clock;
pub mod json_file;
pub mod memory;
pub mod reply_http;

pub use clock::SystemClock;
pub use json_file::JsonFilePersistence;
pub use memory::InMemoryPersistence;
pub use reply_http::HttpReplyAdapter;
