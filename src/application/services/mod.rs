pub mod attachment_decryptor;
pub mod media_resolver;
pub mod response_formatter;

pub use attachment_decryptor::decrypt_attachment;
pub use media_resolver::{MediaResolver, ResolvedMedia};
pub use response_formatter::ResponseFormatter;
