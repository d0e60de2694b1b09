//! Shared fakes for chorus-core integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chorus_core::{Chorus, ChorusConfig, CompletionBackend, ModerationBackend, ModerationVerdict};
use chorus_council::{CompletionRequest, CouncilError};
use chorus_firewall::ModerationError;

/// Replies from a queue; once it runs dry, echoes the last message.
///
/// Every call yields to the scheduler mid-flight so concurrent turns can
/// interleave, and the highest number of simultaneous calls is recorded.
#[derive(Default)]
pub struct ScriptedCompletions {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedCompletions {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_replies<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::default();
        backend
            .replies
            .lock()
            .unwrap()
            .extend(replies.into_iter().map(|r| Ok(r.into())));
        Arc::new(backend)
    }

    /// Queues a transport failure with the given detail.
    pub fn push_failure(&self, detail: &str) {
        self.replies.lock().unwrap().push_back(Err(detail.to_string()));
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Most calls that were ever in progress at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for ScriptedCompletions {
    async fn complete(&self, request: &CompletionRequest) -> chorus_council::Result<String> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;

        let next = self.replies.lock().unwrap().pop_front();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(detail)) => Err(CouncilError::Completion(detail)),
            None => Ok(format!(
                "echo: {}",
                request
                    .messages
                    .last()
                    .map(|m| m.content.as_str())
                    .unwrap_or_default()
            )),
        }
    }
}

/// Flags text containing a keyword under that keyword's category.
#[derive(Default)]
pub struct KeywordModeration {
    rules: Vec<(&'static str, &'static str)>,
    unavailable: bool,
    seen: Mutex<Vec<String>>,
}

impl KeywordModeration {
    pub fn allow_all() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn flagging(rules: Vec<(&'static str, &'static str)>) -> Arc<Self> {
        Arc::new(Self {
            rules,
            ..Default::default()
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            unavailable: true,
            ..Default::default()
        })
    }

    /// Every text submitted for moderation, in order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModerationBackend for KeywordModeration {
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict, ModerationError> {
        self.seen.lock().unwrap().push(text.to_string());
        if self.unavailable {
            return Err(ModerationError::Unavailable("503 Service Unavailable".into()));
        }

        let hits: Vec<(&str, bool)> = self
            .rules
            .iter()
            .map(|(keyword, category)| (*category, text.contains(keyword)))
            .collect();

        if hits.iter().any(|(_, hit)| *hit) {
            Ok(ModerationVerdict::flagged_with(hits))
        } else {
            Ok(ModerationVerdict {
                flagged: false,
                categories: hits.into_iter().map(|(c, h)| (c.to_string(), h)).collect(),
            })
        }
    }
}

/// Default configuration without pacing delays.
pub fn fast_config() -> ChorusConfig {
    let mut config = ChorusConfig::default();
    config.sampler.pacing_ms = 0;
    config
}

pub fn chorus_with(
    completions: Arc<ScriptedCompletions>,
    moderation: Arc<KeywordModeration>,
    config: &ChorusConfig,
) -> Chorus {
    Chorus::new(completions, moderation, config)
}
