use std::sync::Arc;

use gecko_types::NodeIdInfo;
use serde_json::json;

use crate::{JsonRpcRequester, RpcError, call, params};

const INFO_ENDPOINT: &str = "ext/info";

/// Node-info subsystem bindings.
#[derive(Clone)]
pub struct InfoApi {
    requester: Arc<dyn JsonRpcRequester>,
}

impl InfoApi {
    pub(crate) fn new(requester: Arc<dyn JsonRpcRequester>) -> Self {
        Self { requester }
    }

    /// Identity of the node serving this endpoint.
    pub fn get_node_id(&self) -> Result<String, RpcError> {
        let info: NodeIdInfo = call(self.requester.as_ref(), INFO_ENDPOINT, "info.getNodeID", params(json!({})))?;
        Ok(info.node_id)
    }
}
