mod messaging_port;
mod ocr_port;

pub use messaging_port::{MessagingPort, Reply};
pub use ocr_port::OcrPort;

#[cfg(test)]
pub mod mocks {
    pub use super::messaging_port::mock::{Call, CallLog, MockMessaging};
    pub use super::ocr_port::mock::MockOcr;
}
