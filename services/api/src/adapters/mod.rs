pub mod db;
pub mod openai;

pub use db::DbAdapter;
pub use openai::OpenAiModelAdapter;
