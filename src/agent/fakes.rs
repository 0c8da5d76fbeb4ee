//! Scripted providers for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use futures_util::{stream, StreamExt};

use super::{FragmentStream, ImageService, TextFragment, TextStreamService};
use crate::errors::AppError;
use crate::models::Message;

#[derive(Default)]
pub struct FakeText {
    pub fragments: Vec<Result<&'static str, &'static str>>,
    pub open_error: Option<&'static str>,
    /// Never yields and never ends, so the submission stays in flight.
    pub hang: bool,
    pub history_lens: Mutex<Vec<usize>>,
}

impl FakeText {
    pub fn replying(fragments: &[&'static str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| Ok(*f)).collect(),
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self { hang: true, ..Self::default() }
    }
}

impl TextStreamService for FakeText {
    async fn send_text_stream(
        &self,
        history: &[Message],
        _message: &str,
    ) -> Result<FragmentStream, AppError> {
        self.history_lens.lock().unwrap().push(history.len());
        if let Some(e) = self.open_error {
            return Err(AppError::service(e));
        }
        if self.hang {
            return Ok(stream::pending::<Result<TextFragment, AppError>>().boxed());
        }
        let items: Vec<Result<TextFragment, AppError>> = self
            .fragments
            .iter()
            .map(|f| f.map(TextFragment::new).map_err(AppError::service))
            .collect();
        Ok(stream::iter(items).boxed())
    }
}

pub struct FakeImage {
    result: Result<&'static str, &'static str>,
    pub calls: AtomicUsize,
}

impl FakeImage {
    pub fn ok(url: &'static str) -> Self {
        Self { result: Ok(url), calls: AtomicUsize::new(0) }
    }

    pub fn failing(message: &'static str) -> Self {
        Self { result: Err(message), calls: AtomicUsize::new(0) }
    }
}

impl ImageService for FakeImage {
    async fn generate_image(&self, _prompt: &str) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.map(str::to_string).map_err(AppError::service)
    }
}
