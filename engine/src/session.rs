use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use engine_core::{
    ChainConnection, CredentialDecoder, Identity, RequestLayer, Session, SessionError, Wallet,
};
use tracing::{info, warn};

#[derive(Clone)]
pub struct SessionManager {
    decoder: Arc<dyn CredentialDecoder>,
    chain: Arc<dyn ChainConnection>,
}

impl SessionManager {
    pub fn new(decoder: Arc<dyn CredentialDecoder>, chain: Arc<dyn ChainConnection>) -> Self {
        Self { decoder, chain }
    }

    pub fn derive_session(&self, credential: &str) -> Result<Session, SessionError> {
        let claims = self
            .decoder
            .decode(credential)
            .map_err(|err| SessionError::Decode(format!("{err:#}")))?;

        let signer = PrivateKeySigner::from_str(claims.private_key.trim())
            .map_err(|_| SessionError::InvalidKey)?;
        let address = Address::from_str(claims.address.trim())
            .map_err(|_| SessionError::InvalidAddress(claims.address.clone()))?;
        if address != signer.address() {
            warn!(
                target: "session",
                claimed = %address,
                signer = %signer.address(),
                "credential address differs from its key; using the claimed address"
            );
        }

        info!(target: "session", address = %address, name = %claims.name, "session derived");
        Ok(Session::Authenticated(Identity {
            display_name: claims.name,
            email: claims.email,
            bio: claims.bio,
            address,
            account: claims.address.trim().to_string(),
            credential: credential.to_string(),
            wallet: Wallet::new(signer, Arc::clone(&self.chain)),
        }))
    }
}

pub fn configure_outbound_auth(layer: &dyn RequestLayer, session: &Session) {
    layer.set_default_authorization(session.identity().map(|id| id.credential.as_str()));
}
