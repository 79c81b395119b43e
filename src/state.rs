use std::path::Path;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

use crate::config::Config;
use crate::crypto::envelope::Envelope;
use crate::crypto::field::FieldCipher;
use crate::db::Store;
use crate::domain::events::AuditEvent;
use crate::services::{
    AuditLogService, AuthService, SeaOrmAuthService, SeaOrmWorkflowService, TokenService,
    WorkflowService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub token_service: Arc<TokenService>,

    pub auth_service: Arc<dyn AuthService>,

    pub workflow_service: Arc<dyn WorkflowService>,

    pub field_cipher: FieldCipher,

    pub audit_service: Arc<AuditLogService>,

    pub event_bus: broadcast::Sender<AuditEvent>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size);
        Self::with_event_bus(config, event_bus).await
    }

    pub async fn with_event_bus(
        config: Config,
        event_bus: broadcast::Sender<AuditEvent>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let envelope = Envelope::from_pem_file(Path::new(&config.security.private_key_path))?;
        let token_service = Arc::new(TokenService::new(
            config.security.session_secret.clone(),
            envelope,
            config.security.token_ttl_hours,
        ));

        let field_cipher = FieldCipher::from_hex_key(&config.security.data_key_hex)
            .map_err(|e| anyhow::anyhow!("Invalid data key: {e}"))?;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.lockout.clone(),
            event_bus.clone(),
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        let workflow_service = Arc::new(SeaOrmWorkflowService::new(
            store.clone(),
            field_cipher.clone(),
            event_bus.clone(),
        )) as Arc<dyn WorkflowService + Send + Sync + 'static>;

        let audit_service = Arc::new(AuditLogService::new(store.clone(), event_bus.clone()));
        audit_service.clone().start_listener();

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            token_service,
            auth_service,
            workflow_service,
            field_cipher,
            audit_service,
            event_bus,
        })
    }
}
