use std::sync::Arc;

use gecko_types::{Credential, SuccessInfo, UserList};
use serde_json::json;

use crate::{JsonRpcRequester, RpcError, call, params};

const KEYSTORE_ENDPOINT: &str = "ext/keystore";

/// Keystore (identity management) bindings.
#[derive(Clone)]
pub struct KeystoreApi {
    requester: Arc<dyn JsonRpcRequester>,
}

impl KeystoreApi {
    pub(crate) fn new(requester: Arc<dyn JsonRpcRequester>) -> Self {
        Self { requester }
    }

    /// Create a keystore user. Fails if the user already exists.
    pub fn create_user(&self, credential: &Credential) -> Result<bool, RpcError> {
        let info: SuccessInfo = call(
            self.requester.as_ref(),
            KEYSTORE_ENDPOINT,
            "keystore.createUser",
            params(json!({
                "username": credential.username(),
                "password": credential.password(),
            })),
        )?;
        Ok(info.success)
    }

    pub fn list_users(&self) -> Result<Vec<String>, RpcError> {
        let list: UserList = call(self.requester.as_ref(), KEYSTORE_ENDPOINT, "keystore.listUsers", params(json!({})))?;
        Ok(list.users)
    }
}
