use std::sync::Arc;

use crate::admission_review::ReviewCodec;
use crate::webhook::Webhook;

pub(crate) struct ApiServerState {
    pub(crate) codec: Arc<dyn ReviewCodec>,
    pub(crate) webhook: Arc<dyn Webhook>,
    pub(crate) max_body_size: usize,
}
