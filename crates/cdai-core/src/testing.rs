//! In-memory backend for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::{BackendError, CreativeBackend, RenderRequest, SceneRequest};
use crate::session::ImageHandle;

pub(crate) fn image(tag: &str) -> ImageHandle {
    ImageHandle::from_base64("image/png", tag)
}

/// Answers calls from queued outcomes and records every request.
///
/// An empty queue answers with `BackendError::Other`.
#[derive(Debug, Default)]
pub(crate) struct ScriptedBackend {
    descriptions: Mutex<VecDeque<Result<String, BackendError>>>,
    renders: Mutex<VecDeque<Result<ImageHandle, BackendError>>>,
    scene_log: Mutex<Vec<SceneRequest>>,
    render_log: Mutex<Vec<RenderRequest>>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_description(&self, outcome: Result<String, BackendError>) {
        lock(&self.descriptions).push_back(outcome);
    }

    pub(crate) fn push_render(&self, outcome: Result<ImageHandle, BackendError>) {
        lock(&self.renders).push_back(outcome);
    }

    pub(crate) fn scene_requests(&self) -> Vec<SceneRequest> {
        lock(&self.scene_log).clone()
    }

    pub(crate) fn render_requests(&self) -> Vec<RenderRequest> {
        lock(&self.render_log).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl CreativeBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn describe_scene(&self, request: &SceneRequest) -> Result<String, BackendError> {
        lock(&self.scene_log).push(request.clone());
        lock(&self.descriptions)
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Other("no scripted description".to_owned())))
    }

    async fn render_image(&self, request: &RenderRequest) -> Result<ImageHandle, BackendError> {
        lock(&self.render_log).push(request.clone());
        lock(&self.renders)
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Other("no scripted render".to_owned())))
    }
}
