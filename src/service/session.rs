use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

use crate::agent::{ImageService, TextStreamService};
use crate::errors::AppError;
use crate::models::{AppMode, Message, SessionSnapshot};
use crate::service::image_request::{validate_prompt, ImageRequest};
use crate::service::stream_merge::StreamMerge;
use crate::store::message_store::MessageStore;

const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// All mutable state of one session. Only [`ChatSession`] touches it.
#[derive(Debug, Default)]
pub struct SessionState {
    pub messages: MessageStore,
    pub busy: bool,
    pub error: Option<String>,
    pub mode: AppMode,
}

impl SessionState {
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            messages: self.messages.all().to_vec(),
            busy: self.busy,
            error: self.error.clone(),
            mode: self.mode,
            input_hint: self.mode.input_hint(),
        }
    }
}

/// Controller for one conversation: dispatches submissions by mode and
/// publishes a snapshot after every state change.
pub struct ChatSession<T, I> {
    state: Arc<Mutex<SessionState>>,
    text: Arc<T>,
    image: Arc<I>,
    snapshots: broadcast::Sender<SessionSnapshot>,
}

impl<T, I> Clone for ChatSession<T, I> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            text: Arc::clone(&self.text),
            image: Arc::clone(&self.image),
            snapshots: self.snapshots.clone(),
        }
    }
}

impl<T, I> ChatSession<T, I>
where
    T: TextStreamService,
    I: ImageService,
{
    pub fn new(text: Arc<T>, image: Arc<I>) -> Self {
        let (snapshots, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            text,
            image,
            snapshots,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Changes the handler of the next submission. Existing messages are untouched.
    pub async fn set_mode(&self, mode: AppMode) {
        let mut state = self.state.lock().await;
        if state.mode != mode {
            info!("Switching mode {} -> {mode}", state.mode);
            state.mode = mode;
        }
        self.publish(&state);
    }

    /// Begins and runs a submission to completion.
    #[cfg(test)]
    pub async fn submit(&self, input: &str) -> Result<(), AppError> {
        self.begin(input).await?.run().await
    }

    /// Claims the session for a new submission and appends the user message.
    ///
    /// Fails with [`AppError::Busy`] while another submission is in flight and
    /// with [`AppError::EmptyInput`] for blank chat input; neither changes the store.
    pub async fn begin(&self, input: &str) -> Result<Submission<T, I>, AppError> {
        let input = input.trim();
        let mut state = self.state.lock().await;

        if state.busy {
            warn!("Rejected submission while another one is in flight");
            return Err(AppError::Busy);
        }
        if state.mode == AppMode::Chat && input.is_empty() {
            return Err(AppError::EmptyInput { field_name: "message".to_string() });
        }

        let history = state.messages.all().to_vec();
        let user_message_id = state.messages.append(Message::user(input)).id.clone();
        state.busy = true;
        state.error = None;
        self.publish(&state);

        Ok(Submission {
            session: self.clone(),
            mode: state.mode,
            input: input.to_string(),
            user_message_id,
            history,
        })
    }

    fn publish(&self, state: &SessionState) {
        // No subscribers is fine: nobody is rendering right now.
        let _ = self.snapshots.send(state.snapshot());
    }
}

/// A claimed submission. Running it always releases the busy flag.
pub struct Submission<T, I> {
    session: ChatSession<T, I>,
    mode: AppMode,
    input: String,
    user_message_id: String,
    history: Vec<Message>,
}

impl<T, I> Submission<T, I>
where
    T: TextStreamService,
    I: ImageService,
{
    pub async fn run(self) -> Result<(), AppError> {
        let outcome = match self.mode {
            AppMode::Chat => self.run_chat().await,
            AppMode::Image => self.run_image().await,
        };

        let mut state = self.session.state.lock().await;
        state.busy = false;
        if let Err(e) = &outcome {
            state.error = Some(e.banner());
        }
        self.session.publish(&state);
        outcome
    }

    async fn run_chat(&self) -> Result<(), AppError> {
        let session = &self.session;
        let mut fragments = session
            .text
            .send_text_stream(&self.history, &self.input)
            .await
            .inspect_err(|e| error!("Chat failed: {e}"))?;

        let mut merge = StreamMerge::new();
        while let Some(fragment) = fragments.next().await {
            // A failure partway leaves the partial message in place.
            let fragment = fragment.inspect_err(|e| error!("Chat failed: {e}"))?;
            let mut state = session.state.lock().await;
            merge.apply(&mut state.messages, &fragment)?;
            session.publish(&state);
        }

        let chars = merge.text().chars().count();
        let message_id = merge.finish().inspect_err(|_| warn!("Received an empty response"))?;
        info!("Model response {message_id} complete ({chars} chars)");
        Ok(())
    }

    async fn run_image(&self) -> Result<(), AppError> {
        let session = &self.session;

        let request = {
            let mut state = session.state.lock().await;
            let prompt = match validate_prompt(&self.input) {
                Ok(prompt) => prompt,
                Err(e) => {
                    state.messages.rollback_last(&self.user_message_id)?;
                    return Err(e);
                }
            };
            let request = ImageRequest::start(&mut state.messages, prompt);
            info!("Image placeholder {} added", request.placeholder_id());
            session.publish(&state);
            request
        };

        match session.image.generate_image(&self.input).await {
            Ok(image_url) => {
                let mut state = session.state.lock().await;
                request.succeed(&mut state.messages, image_url)
            }
            Err(e) => {
                error!("Image generation failed: {e}");
                let message = e.to_string();
                let mut state = session.state.lock().await;
                request.fail(&mut state.messages, &message)?;
                Err(AppError::ImageGenerationFailed { message })
            }
        }
    }
}
